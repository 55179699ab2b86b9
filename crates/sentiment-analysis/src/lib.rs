//! Headline sentiment with a cloud → local → keyword fallback chain.

pub mod cancel;
pub mod config;
pub mod lexicon;
pub mod scorer;
pub mod tier;

pub use cancel::CancelToken;
pub use config::ScorerConfig;
pub use lexicon::{KeywordLexicon, LexiconHits};
pub use scorer::SentimentScorer;
pub use tier::{CloudTier, KeywordTier, LocalTier, SentimentTier, TierError};
