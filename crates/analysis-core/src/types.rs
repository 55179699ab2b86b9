use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::SignalError;

/// OHLC bar data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl Bar {
    pub fn new(timestamp: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume: 0.0,
        }
    }
}

/// Directional stance of a trade plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Bias {
    Long,
    Short,
}

impl Bias {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bias::Long => "LONG",
            Bias::Short => "SHORT",
        }
    }

    /// +1.0 for long, -1.0 for short. Used to move price levels with or against the bias.
    pub fn sign(&self) -> f64 {
        match self {
            Bias::Long => 1.0,
            Bias::Short => -1.0,
        }
    }
}

impl fmt::Display for Bias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Bias {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LONG" | "BUY" => Ok(Bias::Long),
            "SHORT" | "SELL" => Ok(Bias::Short),
            other => Err(SignalError::InvalidData(format!("unknown bias '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SentimentLabel {
    Negative,
    Neutral,
    Positive,
}

impl SentimentLabel {
    /// Scores strictly outside `[-neutral_band, neutral_band]` get a direction.
    pub fn from_score(score: f64, neutral_band: f64) -> Self {
        if score > neutral_band {
            SentimentLabel::Positive
        } else if score < -neutral_band {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    /// The bias this label argues for, if any.
    pub fn direction(&self) -> Option<Bias> {
        match self {
            SentimentLabel::Positive => Some(Bias::Long),
            SentimentLabel::Negative => Some(Bias::Short),
            SentimentLabel::Neutral => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Negative => "NEGATIVE",
            SentimentLabel::Neutral => "NEUTRAL",
            SentimentLabel::Positive => "POSITIVE",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which tier of the sentiment fallback chain produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SentimentSource {
    Cloud,
    Local,
    Keyword,
}

impl SentimentSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentSource::Cloud => "CLOUD",
            SentimentSource::Local => "LOCAL",
            SentimentSource::Keyword => "KEYWORD",
        }
    }
}

impl fmt::Display for SentimentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentSource {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CLOUD" => Ok(SentimentSource::Cloud),
            "LOCAL" => Ok(SentimentSource::Local),
            "KEYWORD" => Ok(SentimentSource::Keyword),
            other => Err(SignalError::InvalidData(format!(
                "unknown sentiment source '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    /// -1.0 (very bearish) to 1.0 (very bullish)
    pub score: f64,
    pub label: SentimentLabel,
    pub source: SentimentSource,
    pub model_name: String,
    #[serde(default)]
    pub headline_count: usize,
    /// Market-moving terms (central bank, macro data, index names) across the headlines
    #[serde(default)]
    pub high_impact_count: usize,
}

impl SentimentResult {
    /// Result for an empty headline set.
    pub fn neutral(model_name: impl Into<String>) -> Self {
        Self {
            score: 0.0,
            label: SentimentLabel::Neutral,
            source: SentimentSource::Keyword,
            model_name: model_name.into(),
            headline_count: 0,
            high_impact_count: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Win,
    Loss,
    Breakeven,
    Pending,
}

impl Outcome {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Outcome::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Win => "WIN",
            Outcome::Loss => "LOSS",
            Outcome::Breakeven => "BREAKEVEN",
            Outcome::Pending => "PENDING",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "WIN" | "PROFIT" => Ok(Outcome::Win),
            "LOSS" => Ok(Outcome::Loss),
            "BREAKEVEN" | "BE" => Ok(Outcome::Breakeven),
            "PENDING" => Ok(Outcome::Pending),
            other => Err(SignalError::InvalidOutcome(other.to_string())),
        }
    }
}

/// Ordinal reliability classification; `Low` is the most reliable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Extreme,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Extreme => "EXTREME",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(RiskLevel::Low),
            "MEDIUM" => Ok(RiskLevel::Medium),
            "HIGH" => Ok(RiskLevel::High),
            "EXTREME" => Ok(RiskLevel::Extreme),
            other => Err(SignalError::InvalidData(format!(
                "unknown risk level '{}'",
                other
            ))),
        }
    }
}

/// Deterministic output of the Hybrid Math calculator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSignal {
    pub symbol: String,
    pub display_name: String,
    pub bias: Bias,
    /// Current Value (CV): latest close, the primary decision zone
    pub current_value: f64,
    pub previous_close: f64,
    pub net_change: f64,
    pub change_pct: f64,
    pub day_high: f64,
    pub day_low: f64,
    pub entry1: f64,
    pub entry2: f64,
    pub take_profit: f64,
    pub stop_loss_tight: f64,
    pub stop_loss_wide: f64,
    /// 0 = CV at the session low, 1 = CV at the session high
    pub cv_position: f64,
    /// 0 to 100
    pub raw_confidence: f64,
}

/// Persisted historical fact about one assembled signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub signal_id: String,
    pub symbol: String,
    pub signal_type: Bias,
    pub predicted_probability: f64,
    pub risk_level: RiskLevel,
    pub actual_outcome: Outcome,
    pub profit_loss: Option<f64>,
    pub timestamp: DateTime<Utc>,
    pub sentiment_source: Option<SentimentSource>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Finished signal crossing the core's output boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedSignal {
    pub signal: TradeSignal,
    pub sentiment: SentimentResult,
    pub raw_confidence: f64,
    pub probability_percentage: u8,
    pub probability_label: String,
    pub risk_level: RiskLevel,
    /// False when the outcome store could not be read and the historical step was skipped
    pub history_used: bool,
    pub history_samples: usize,
    pub win_rate: Option<f64>,
    /// Set once the pending record has been written
    pub signal_id: Option<String>,
    pub headline_digest: String,
    pub trading_date: NaiveDate,
    pub is_weekend_signal: bool,
    pub generated_at: DateTime<Utc>,
}

impl EnrichedSignal {
    /// Degraded signals were produced without cloud/local sentiment or without history.
    pub fn is_degraded(&self) -> bool {
        !self.history_used || self.sentiment.source == SentimentSource::Keyword
    }
}

/// Timeframe for bar requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timeframe {
    Minute15,
    Hour1,
    Hour4,
    Day1,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Minute15 => "15m",
            Timeframe::Hour1 => "1h",
            Timeframe::Hour4 => "4h",
            Timeframe::Day1 => "1d",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "15m" | "15min" => Ok(Timeframe::Minute15),
            "1h" | "60m" | "1hour" => Ok(Timeframe::Hour1),
            "4h" | "4hour" => Ok(Timeframe::Hour4),
            "1d" | "daily" => Ok(Timeframe::Day1),
            other => Err(SignalError::InvalidData(format!(
                "unknown bar interval '{}'",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentiment_label_band() {
        assert_eq!(SentimentLabel::from_score(0.5, 0.2), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_score(0.2, 0.2), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_score(-0.2, 0.2), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_score(-0.21, 0.2), SentimentLabel::Negative);
    }

    #[test]
    fn test_label_direction() {
        assert_eq!(SentimentLabel::Positive.direction(), Some(Bias::Long));
        assert_eq!(SentimentLabel::Negative.direction(), Some(Bias::Short));
        assert_eq!(SentimentLabel::Neutral.direction(), None);
    }

    #[test]
    fn test_outcome_parsing() {
        assert_eq!("win".parse::<Outcome>().unwrap(), Outcome::Win);
        assert_eq!("BREAKEVEN".parse::<Outcome>().unwrap(), Outcome::Breakeven);
        assert!(!Outcome::Pending.is_resolved());
        assert!(Outcome::Loss.is_resolved());
        assert!(matches!(
            "maybe".parse::<Outcome>(),
            Err(SignalError::InvalidOutcome(_))
        ));
    }

    #[test]
    fn test_bias_accepts_trade_actions() {
        assert_eq!("BUY".parse::<Bias>().unwrap(), Bias::Long);
        assert_eq!("short".parse::<Bias>().unwrap(), Bias::Short);
    }

    #[test]
    fn test_timeframe_parsing() {
        assert_eq!("1h".parse::<Timeframe>().unwrap(), Timeframe::Hour1);
        assert_eq!(" 4H ".parse::<Timeframe>().unwrap(), Timeframe::Hour4);
        assert_eq!("daily".parse::<Timeframe>().unwrap(), Timeframe::Day1);
        assert_eq!(Timeframe::Minute15.to_string(), "15m");
        assert!("2w".parse::<Timeframe>().is_err());
    }

    #[test]
    fn test_risk_level_ordering() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::High < RiskLevel::Extreme);
    }

    #[test]
    fn test_serde_uppercase() {
        let json = serde_json::to_string(&RiskLevel::Extreme).unwrap();
        assert_eq!(json, "\"EXTREME\"");
        let bias: Bias = serde_json::from_str("\"LONG\"").unwrap();
        assert_eq!(bias, Bias::Long);
    }
}
