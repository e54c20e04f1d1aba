use anyhow::Result;
use regex::Regex;
use tracing::debug;

use crate::sentiment::SentimentScorer;

const POSITIVE_WORDS: &[&str] = &[
    "good",
    "great",
    "excellent",
    "amazing",
    "happy",
    "like",
    "love",
    "best",
    "better",
    "yes",
    "agree",
    "thanks",
    "thank",
    "appreciate",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad",
    "terrible",
    "awful",
    "hate",
    "dislike",
    "worst",
    "worse",
    "no",
    "not",
    "disagree",
    "difficult",
    "problem",
    "issue",
    "sorry",
];

/// Word-list scorer: (positive - negative) / (positive + negative).
pub struct LexiconScorer {
    word_regex: Regex,
}

impl LexiconScorer {
    pub fn new() -> Result<Self> {
        // Letters and inner apostrophes, so "don't" stays one token and "great!" becomes "great"
        let word_regex = Regex::new(r"[a-z]+(?:'[a-z]+)*")?;

        Ok(Self { word_regex })
    }
}

impl SentimentScorer for LexiconScorer {
    fn score(&self, text: &str) -> f64 {
        let lowered = text.to_lowercase();

        let mut positive = 0usize;
        let mut negative = 0usize;
        for word in self.word_regex.find_iter(&lowered).map(|m| m.as_str()) {
            if POSITIVE_WORDS.contains(&word) {
                positive += 1;
            } else if NEGATIVE_WORDS.contains(&word) {
                negative += 1;
            }
        }

        let total = positive + negative;
        if total == 0 {
            return 0.0;
        }

        let score = (positive as f64 - negative as f64) / total as f64;
        debug!(
            "{} scored {:.2} ({} positive, {} negative)",
            self.name(),
            score,
            positive,
            negative
        );
        score
    }

    fn name(&self) -> &'static str {
        "LexiconScorer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_text_scores_zero() {
        let scorer = LexiconScorer::new().unwrap();
        assert_eq!(scorer.score("the quarterly numbers are in"), 0.0);
        assert_eq!(scorer.score(""), 0.0);
    }

    #[test]
    fn test_mixed_text() {
        let scorer = LexiconScorer::new().unwrap();
        // two positive, one negative
        let score = scorer.score("Great work, thanks! One problem left.");
        assert!((score - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_extremes_and_case() {
        let scorer = LexiconScorer::new().unwrap();
        assert_eq!(scorer.score("LOVE it. Best demo."), 1.0);
        assert_eq!(scorer.score("No, that is NOT good"), -1.0 / 3.0);
        assert_eq!(scorer.score("awful, terrible"), -1.0);
    }

    #[test]
    fn test_score_stays_in_range() {
        let scorer = LexiconScorer::new().unwrap();
        for text in ["yes yes yes no", "sorry sorry", "¿qué? 🙂 good"] {
            let score = scorer.score(text);
            assert!((-1.0..=1.0).contains(&score), "{} -> {}", text, score);
        }
    }
}
