use analysis_core::{SentimentSource, SignalError};
use async_trait::async_trait;
use futures_util::future::join_all;
use ml_client::{GeminiClient, MLError, SentimentClient};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::lexicon::KeywordLexicon;

#[derive(Error, Debug)]
pub enum TierError {
    #[error("tier unavailable: {0}")]
    Unavailable(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("cancelled by caller")]
    Cancelled,

    #[error("invalid scores: {0}")]
    InvalidScores(String),

    #[error(transparent)]
    Model(#[from] MLError),
}

impl From<TierError> for SignalError {
    fn from(err: TierError) -> Self {
        SignalError::SentimentUnavailable(err.to_string())
    }
}

/// One method of turning headlines into scores in [-1, 1].
#[async_trait]
pub trait SentimentTier: Send + Sync {
    fn source(&self) -> SentimentSource;

    fn model_name(&self) -> String;

    /// Precondition for calling the tier at all. Not an error when false.
    async fn is_available(&self) -> bool;

    async fn score_one(&self, symbol: &str, headline: &str) -> Result<f64, TierError>;

    /// Scores in input order. Defaults to concurrent per-headline calls.
    async fn score_batch(&self, symbol: &str, headlines: &[String]) -> Result<Vec<f64>, TierError> {
        join_all(headlines.iter().map(|h| self.score_one(symbol, h)))
            .await
            .into_iter()
            .collect()
    }
}

/// Cloud LLM tier. Unavailable without an API key.
pub struct CloudTier {
    client: Option<GeminiClient>,
}

impl CloudTier {
    pub fn new(client: Option<GeminiClient>) -> Self {
        Self { client }
    }

    fn client(&self) -> Result<&GeminiClient, TierError> {
        self.client
            .as_ref()
            .ok_or_else(|| TierError::Unavailable("no cloud API key configured".to_string()))
    }
}

#[async_trait]
impl SentimentTier for CloudTier {
    fn source(&self) -> SentimentSource {
        SentimentSource::Cloud
    }

    fn model_name(&self) -> String {
        self.client
            .as_ref()
            .map(|c| c.model().to_string())
            .unwrap_or_else(|| "gemini".to_string())
    }

    async fn is_available(&self) -> bool {
        self.client.is_some()
    }

    async fn score_one(&self, symbol: &str, headline: &str) -> Result<f64, TierError> {
        let scores = self.client()?.score_headlines(symbol, &[headline.to_string()]).await?;
        scores
            .first()
            .copied()
            .ok_or_else(|| TierError::InvalidScores("empty reply".to_string()))
    }

    /// One prompt for the whole set.
    async fn score_batch(&self, symbol: &str, headlines: &[String]) -> Result<Vec<f64>, TierError> {
        Ok(self.client()?.score_headlines(symbol, headlines).await?)
    }
}

/// Locally hosted FinBERT tier. Health is checked once, on first use.
pub struct LocalTier {
    client: Option<SentimentClient>,
    available: OnceCell<bool>,
}

impl LocalTier {
    pub fn new(client: Option<SentimentClient>) -> Self {
        Self {
            client,
            available: OnceCell::new(),
        }
    }

    fn client(&self) -> Result<&SentimentClient, TierError> {
        self.client
            .as_ref()
            .ok_or_else(|| TierError::Unavailable("no local model service configured".to_string()))
    }
}

#[async_trait]
impl SentimentTier for LocalTier {
    fn source(&self) -> SentimentSource {
        SentimentSource::Local
    }

    fn model_name(&self) -> String {
        "finbert".to_string()
    }

    async fn is_available(&self) -> bool {
        let Some(client) = &self.client else {
            return false;
        };
        *self
            .available
            .get_or_init(|| async {
                match client.health().await {
                    Ok(healthy) => {
                        tracing::info!("Local sentiment model at {} healthy: {}", client.base_url(), healthy);
                        healthy
                    }
                    Err(e) => {
                        tracing::warn!("Local sentiment model at {} unreachable: {}", client.base_url(), e);
                        false
                    }
                }
            })
            .await
    }

    async fn score_one(&self, _symbol: &str, headline: &str) -> Result<f64, TierError> {
        let scores = self.client()?.score_texts(vec![headline.to_string()]).await?;
        scores
            .first()
            .copied()
            .ok_or_else(|| TierError::InvalidScores("empty prediction list".to_string()))
    }

    async fn score_batch(&self, _symbol: &str, headlines: &[String]) -> Result<Vec<f64>, TierError> {
        Ok(self.client()?.score_texts(headlines.to_vec()).await?)
    }
}

/// Lexicon tier. Always available, never fails.
#[derive(Default)]
pub struct KeywordTier {
    lexicon: KeywordLexicon,
}

impl KeywordTier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn score_all(&self, headlines: &[String]) -> Vec<f64> {
        headlines.iter().map(|h| self.lexicon.score(h)).collect()
    }

    /// High-impact topics summed over every headline.
    pub fn high_impact_count(&self, headlines: &[String]) -> usize {
        headlines.iter().map(|h| self.lexicon.high_impact_count(h)).sum()
    }
}

#[async_trait]
impl SentimentTier for KeywordTier {
    fn source(&self) -> SentimentSource {
        SentimentSource::Keyword
    }

    fn model_name(&self) -> String {
        "keyword-lexicon".to_string()
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn score_one(&self, _symbol: &str, headline: &str) -> Result<f64, TierError> {
        Ok(self.lexicon.score(headline))
    }
}
