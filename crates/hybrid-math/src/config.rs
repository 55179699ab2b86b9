use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

/// Constants of the Hybrid Math formula set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HybridMathConfig {
    /// Price units subtracted from |net change| when placing the tight stop
    pub stop_buffer: f64,
    /// CV within this fraction of either session extreme counts as "at the extreme"
    pub extreme_zone: f64,
    pub extreme_confidence: f64,   // 80
    pub middle_confidence: f64,    // 65
    pub strong_move_pct: f64,      // |change %| above this is a significant move
    pub strong_move_bonus: f64,    // +5
    pub moderate_move_pct: f64,
    pub moderate_move_bonus: f64,  // +2
}

impl Default for HybridMathConfig {
    fn default() -> Self {
        Self {
            stop_buffer: 2.0,
            extreme_zone: 0.3,
            extreme_confidence: 80.0,
            middle_confidence: 65.0,
            strong_move_pct: 1.0,
            strong_move_bonus: 5.0,
            moderate_move_pct: 0.5,
            moderate_move_bonus: 2.0,
        }
    }
}

impl HybridMathConfig {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            stop_buffer: env::var("HM_STOP_BUFFER")
                .unwrap_or_else(|_| "2.0".to_string())
                .parse()?,
            extreme_zone: env::var("HM_EXTREME_ZONE")
                .unwrap_or_else(|_| "0.3".to_string())
                .parse()?,
            extreme_confidence: env::var("HM_EXTREME_CONFIDENCE")
                .unwrap_or_else(|_| "80".to_string())
                .parse()?,
            middle_confidence: env::var("HM_MIDDLE_CONFIDENCE")
                .unwrap_or_else(|_| "65".to_string())
                .parse()?,
            strong_move_pct: env::var("HM_STRONG_MOVE_PCT")
                .unwrap_or_else(|_| "1.0".to_string())
                .parse()?,
            strong_move_bonus: env::var("HM_STRONG_MOVE_BONUS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()?,
            moderate_move_pct: env::var("HM_MODERATE_MOVE_PCT")
                .unwrap_or_else(|_| "0.5".to_string())
                .parse()?,
            moderate_move_bonus: env::var("HM_MODERATE_MOVE_BONUS")
                .unwrap_or_else(|_| "2".to_string())
                .parse()?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.stop_buffer > 0.0) {
            anyhow::bail!("HM_STOP_BUFFER must be positive, got {}", self.stop_buffer);
        }
        if !(0.0..0.5).contains(&self.extreme_zone) {
            anyhow::bail!("HM_EXTREME_ZONE must be in [0, 0.5), got {}", self.extreme_zone);
        }
        Ok(())
    }
}
