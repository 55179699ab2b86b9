pub mod error;
pub mod llm;
pub mod sentiment;

pub use error::{MLError, MLResult};
pub use llm::{GeminiClient, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
pub use sentiment::SentimentClient;

use std::env;
use std::time::Duration;

/// Endpoints of the model services behind the sentiment tiers.
#[derive(Debug, Clone)]
pub struct MLConfig {
    /// Local FinBERT service; `None` disables the local tier
    pub sentiment_url: Option<String>,
    /// Cloud LLM key; `None` disables the cloud tier
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub timeout: Duration,
}

impl Default for MLConfig {
    fn default() -> Self {
        Self {
            sentiment_url: None,
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl MLConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            sentiment_url: non_empty_var("ML_SENTIMENT_URL"),
            gemini_api_key: non_empty_var("GEMINI_API_KEY"),
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_base_url: env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string()),
            timeout: Duration::from_secs(
                env::var("ML_HTTP_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()?,
            ),
        })
    }

    /// Cloud client, if a key is configured.
    pub fn gemini_client(&self) -> MLResult<Option<GeminiClient>> {
        match &self.gemini_api_key {
            Some(key) => GeminiClient::new(
                self.gemini_base_url.clone(),
                self.gemini_model.clone(),
                key.clone(),
                self.timeout,
            )
            .map(Some),
            None => Ok(None),
        }
    }

    /// Local FinBERT client, if a URL is configured.
    pub fn sentiment_client(&self) -> MLResult<Option<SentimentClient>> {
        match &self.sentiment_url {
            Some(url) => SentimentClient::new(url.clone(), self.timeout).map(Some),
            None => Ok(None),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
