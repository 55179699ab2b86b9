use anyhow::Result;
use ml_client::MLConfig;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ScorerConfig {
    pub ml: MLConfig,
    /// Upper bound for one cloud tier call, availability check included
    pub cloud_timeout: Duration,
    pub local_timeout: Duration,
    /// Scores within ±band are labelled Neutral
    pub neutral_band: f64,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            ml: MLConfig::default(),
            cloud_timeout: Duration::from_secs(15),
            local_timeout: Duration::from_secs(5),
            neutral_band: 0.2,
        }
    }
}

impl ScorerConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            ml: MLConfig::from_env()?,
            cloud_timeout: Duration::from_secs(
                env::var("SENTIMENT_CLOUD_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "15".to_string())
                    .parse()?,
            ),
            local_timeout: Duration::from_secs(
                env::var("SENTIMENT_LOCAL_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()?,
            ),
            neutral_band: env::var("SENTIMENT_NEUTRAL_BAND")
                .unwrap_or_else(|_| "0.2".to_string())
                .parse()?,
        })
    }
}
