mod lexicon;
mod sentiment_scorer;

pub use lexicon::LexiconScorer;
pub use sentiment_scorer::SentimentScorer;
