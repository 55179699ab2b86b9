use analysis_core::Timeframe;
use anyhow::Result;
use std::env;
use std::time::Duration;

/// About a century; larger windows cannot be subtracted from the current time.
pub const MAX_HISTORY_WINDOW_DAYS: i64 = 36_500;

#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    /// Only outcomes recorded within this many days feed the adjustment
    pub history_window_days: i64,
    pub history_limit: usize,
    /// Bound on each store call (history read, pending write)
    pub store_timeout: Duration,
    /// Bar size requested from the bar provider
    pub interval: Timeframe,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            history_window_days: 30,
            history_limit: 20,
            store_timeout: Duration::from_millis(2000),
            interval: Timeframe::Hour1,
        }
    }
}

impl AssemblerConfig {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            history_window_days: env::var("HISTORY_WINDOW_DAYS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()?,
            history_limit: env::var("HISTORY_LIMIT")
                .unwrap_or_else(|_| "20".to_string())
                .parse()?,
            store_timeout: Duration::from_millis(
                env::var("STORE_TIMEOUT_MS")
                    .unwrap_or_else(|_| "2000".to_string())
                    .parse()?,
            ),
            interval: env::var("BAR_INTERVAL")
                .unwrap_or_else(|_| "1h".to_string())
                .parse()?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_HISTORY_WINDOW_DAYS).contains(&self.history_window_days) {
            anyhow::bail!(
                "HISTORY_WINDOW_DAYS must be between 1 and {}, got {}",
                MAX_HISTORY_WINDOW_DAYS,
                self.history_window_days
            );
        }
        if self.history_limit == 0 {
            anyhow::bail!("HISTORY_LIMIT must be positive");
        }
        Ok(())
    }
}
