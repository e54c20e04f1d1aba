/// Trait for scoring the tone of a transcript line
pub trait SentimentScorer: Send + Sync {
    /// Score in [-1, 1]: negative, neutral (0) or positive. Never fails.
    fn score(&self, text: &str) -> f64;

    /// Get the name of this scorer for logging
    fn name(&self) -> &'static str;
}
