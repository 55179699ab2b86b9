use analysis_core::{Bias, OutcomeRecord, RiskLevel, SentimentLabel, SentimentResult};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::history::HistoryStats;
use crate::risk::{self, Alignment, RiskFactor, RiskInputs};

/// Result of adjusting a raw confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    pub probability_percentage: u8,
    pub risk_level: RiskLevel,
    /// False when the history lookup failed
    pub history_used: bool,
    /// Present only with enough resolved samples
    pub win_rate: Option<f64>,
    pub resolved_samples: usize,
    pub alignment: Alignment,
    pub factors: Vec<RiskFactor>,
    /// A headline touched a high-impact topic and the bonus was applied
    pub high_impact_news: bool,
}

/// Stateless adjustment of raw confidence by sentiment and outcome history.
#[derive(Debug, Clone, Default)]
pub struct ProbabilityEngine {
    config: EngineConfig,
}

impl ProbabilityEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// `history` is `None` when the store could not be read; the adjustment then
    /// uses sentiment only and the risk level is Medium.
    pub fn adjust(
        &self,
        raw_confidence: f64,
        bias: Bias,
        sentiment: &SentimentResult,
        history: Option<&[OutcomeRecord]>,
    ) -> Adjustment {
        let c = &self.config;
        let raw = if raw_confidence.is_finite() {
            raw_confidence.clamp(0.0, 100.0)
        } else {
            0.0
        };

        let alignment = alignment(bias, sentiment.label);
        let magnitude = if sentiment.score.is_finite() {
            sentiment.score.abs().min(1.0)
        } else {
            0.0
        };
        let sentiment_term = match alignment {
            Alignment::Aligned => c.sentiment_weight * magnitude,
            Alignment::Conflicting => -c.sentiment_weight * magnitude,
            Alignment::Neutral => 0.0,
        };

        let high_impact_news = sentiment.high_impact_count > 0;
        let news_term = if high_impact_news { c.high_impact_bonus } else { 0.0 };

        let mut probability = raw + sentiment_term + news_term;

        let Some(records) = history else {
            let probability_percentage = to_percentage(probability);
            tracing::debug!(
                "History unavailable: {} {:.0} -> {}% (sentiment {:+.1}, news {:+.1})",
                bias,
                raw,
                probability_percentage,
                sentiment_term,
                news_term
            );
            return Adjustment {
                probability_percentage,
                risk_level: RiskLevel::Medium,
                history_used: false,
                win_rate: None,
                resolved_samples: 0,
                alignment,
                factors: Vec::new(),
                high_impact_news,
            };
        };

        let stats = HistoryStats::from_records(records, c);
        if let Some(win_rate) = stats.win_rate {
            if win_rate > c.win_rate_high {
                probability += c.history_boost;
            } else if win_rate < c.win_rate_low {
                probability -= c.history_penalty;
            }
        }

        let probability_percentage = to_percentage(probability);
        let inputs = RiskInputs {
            probability: f64::from(probability_percentage),
            raw_confidence: raw,
            alignment,
            win_rate: stats.win_rate,
            volatile: stats.is_volatile(c),
            avg_profit_loss: stats.avg_profit_loss,
        };
        let risk_level = risk::classify(&inputs, c);
        let factors = inputs.negative_factors(c);

        tracing::debug!(
            "{} {:.0} -> {}% risk={} (sentiment {:+.1}, news {:+.1}, win rate {:?} over {} resolved)",
            bias,
            raw,
            probability_percentage,
            risk_level,
            sentiment_term,
            news_term,
            stats.win_rate,
            stats.resolved
        );

        Adjustment {
            probability_percentage,
            risk_level,
            history_used: true,
            win_rate: stats.win_rate,
            resolved_samples: stats.resolved,
            alignment,
            factors,
            high_impact_news,
        }
    }
}

fn alignment(bias: Bias, label: SentimentLabel) -> Alignment {
    match label.direction() {
        None => Alignment::Neutral,
        Some(direction) if direction == bias => Alignment::Aligned,
        Some(_) => Alignment::Conflicting,
    }
}

fn to_percentage(probability: f64) -> u8 {
    probability.clamp(0.0, 100.0).round() as u8
}

/// Human-readable probability bucket.
pub fn probability_label(probability_percentage: u8) -> &'static str {
    match probability_percentage {
        75..=u8::MAX => "High",
        60..=74 => "Medium-High",
        45..=59 => "Medium",
        _ => "Low-Medium",
    }
}
