use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

/// Weights and thresholds of the probability adjustment and risk rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Points per unit of |sentiment score|, added when aligned, subtracted when conflicting
    pub sentiment_weight: f64,
    pub win_rate_high: f64,
    pub win_rate_low: f64,
    pub history_boost: f64,
    pub history_penalty: f64,
    /// Resolved outcomes required before history has any influence
    pub min_history_samples: usize,
    /// Below this win rate the history counts against the signal
    pub average_win_rate: f64,
    pub low_risk_probability: f64,   // 70
    pub weak_probability: f64,       // 50
    pub low_raw_confidence: f64,     // 50
    /// Most recent resolved outcomes inspected for alternation
    pub volatility_window: usize,
    pub volatility_threshold: f64,
    /// Negative factors that on their own make a signal Extreme
    pub extreme_factor_count: usize,
    /// Points added when any headline touches a high-impact topic
    pub high_impact_bonus: f64,
    /// Average profit/loss of resolved history below this counts against the signal
    pub negative_pnl_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sentiment_weight: 10.0,
            win_rate_high: 0.70,
            win_rate_low: 0.30,
            history_boost: 5.0,
            history_penalty: 5.0,
            min_history_samples: 5,
            average_win_rate: 0.5,
            low_risk_probability: 70.0,
            weak_probability: 50.0,
            low_raw_confidence: 50.0,
            volatility_window: 10,
            volatility_threshold: 0.5,
            extreme_factor_count: 3,
            high_impact_bonus: 5.0,
            negative_pnl_threshold: 0.0,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            sentiment_weight: env::var("PROB_SENTIMENT_WEIGHT")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,
            win_rate_high: env::var("PROB_WIN_RATE_HIGH")
                .unwrap_or_else(|_| "0.70".to_string())
                .parse()?,
            win_rate_low: env::var("PROB_WIN_RATE_LOW")
                .unwrap_or_else(|_| "0.30".to_string())
                .parse()?,
            history_boost: env::var("PROB_HISTORY_BOOST")
                .unwrap_or_else(|_| "5".to_string())
                .parse()?,
            history_penalty: env::var("PROB_HISTORY_PENALTY")
                .unwrap_or_else(|_| "5".to_string())
                .parse()?,
            min_history_samples: env::var("PROB_MIN_HISTORY_SAMPLES")
                .unwrap_or_else(|_| "5".to_string())
                .parse()?,
            average_win_rate: env::var("PROB_AVERAGE_WIN_RATE")
                .unwrap_or_else(|_| "0.5".to_string())
                .parse()?,
            low_risk_probability: env::var("PROB_LOW_RISK_PROBABILITY")
                .unwrap_or_else(|_| "70".to_string())
                .parse()?,
            weak_probability: env::var("PROB_WEAK_PROBABILITY")
                .unwrap_or_else(|_| "50".to_string())
                .parse()?,
            low_raw_confidence: env::var("PROB_LOW_RAW_CONFIDENCE")
                .unwrap_or_else(|_| "50".to_string())
                .parse()?,
            volatility_window: env::var("PROB_VOLATILITY_WINDOW")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,
            volatility_threshold: env::var("PROB_VOLATILITY_THRESHOLD")
                .unwrap_or_else(|_| "0.5".to_string())
                .parse()?,
            extreme_factor_count: env::var("PROB_EXTREME_FACTORS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()?,
            high_impact_bonus: env::var("PROB_HIGH_IMPACT_BONUS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()?,
            negative_pnl_threshold: env::var("PROB_NEGATIVE_PNL_THRESHOLD")
                .unwrap_or_else(|_| "0".to_string())
                .parse()?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.win_rate_low) || !(0.0..=1.0).contains(&self.win_rate_high) {
            anyhow::bail!("Win-rate thresholds must be within [0, 1]");
        }
        if self.win_rate_low >= self.win_rate_high {
            anyhow::bail!(
                "PROB_WIN_RATE_LOW ({}) must be below PROB_WIN_RATE_HIGH ({})",
                self.win_rate_low,
                self.win_rate_high
            );
        }
        if self.sentiment_weight < 0.0
            || self.history_boost < 0.0
            || self.history_penalty < 0.0
            || self.high_impact_bonus < 0.0
        {
            anyhow::bail!("Adjustment weights must be non-negative");
        }
        if !self.negative_pnl_threshold.is_finite() {
            anyhow::bail!("PROB_NEGATIVE_PNL_THRESHOLD must be a finite number");
        }
        if self.min_history_samples == 0 {
            anyhow::bail!("PROB_MIN_HISTORY_SAMPLES must be at least 1");
        }
        if self.extreme_factor_count == 0 {
            anyhow::bail!("PROB_EXTREME_FACTORS must be at least 1");
        }
        Ok(())
    }
}
