//! Ordered risk rule table. The first rule that fires decides the level.

use analysis_core::RiskLevel;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;

/// How the sentiment label relates to the signal's bias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    Aligned,
    Conflicting,
    Neutral,
}

/// Conditions that count against a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskFactor {
    ConflictingSentiment,
    PoorWinRate,
    LowRawConfidence,
    WeakProbability,
    VolatileOutcomes,
    NegativePnl,
}

/// Everything the rules look at.
#[derive(Debug, Clone)]
pub struct RiskInputs {
    pub probability: f64,
    pub raw_confidence: f64,
    pub alignment: Alignment,
    /// `None` when history is missing or insufficient
    pub win_rate: Option<f64>,
    pub volatile: bool,
    /// Mean profit/loss of resolved history, `None` when unknown
    pub avg_profit_loss: Option<f64>,
}

impl RiskInputs {
    fn poor_history(&self, config: &EngineConfig) -> bool {
        self.win_rate.is_some_and(|w| w < config.win_rate_low)
    }

    fn below_average_history(&self, config: &EngineConfig) -> bool {
        self.win_rate.is_some_and(|w| w < config.average_win_rate)
    }

    fn negative_pnl(&self, config: &EngineConfig) -> bool {
        self.avg_profit_loss
            .is_some_and(|p| p < config.negative_pnl_threshold)
    }

    pub fn negative_factors(&self, config: &EngineConfig) -> Vec<RiskFactor> {
        let mut factors = Vec::new();
        if self.alignment == Alignment::Conflicting {
            factors.push(RiskFactor::ConflictingSentiment);
        }
        if self.poor_history(config) {
            factors.push(RiskFactor::PoorWinRate);
        }
        if self.raw_confidence < config.low_raw_confidence {
            factors.push(RiskFactor::LowRawConfidence);
        }
        if self.probability < config.weak_probability {
            factors.push(RiskFactor::WeakProbability);
        }
        if self.volatile {
            factors.push(RiskFactor::VolatileOutcomes);
        }
        if self.negative_pnl(config) {
            factors.push(RiskFactor::NegativePnl);
        }
        factors
    }
}

type RiskRule = fn(&RiskInputs, &EngineConfig) -> bool;

const RISK_RULES: &[(RiskLevel, RiskRule)] = &[
    (RiskLevel::Extreme, is_extreme),
    (RiskLevel::High, is_high),
    (RiskLevel::Low, is_low),
];

fn is_extreme(inputs: &RiskInputs, config: &EngineConfig) -> bool {
    (inputs.poor_history(config) && inputs.alignment == Alignment::Conflicting)
        || inputs.negative_factors(config).len() >= config.extreme_factor_count
}

fn is_high(inputs: &RiskInputs, config: &EngineConfig) -> bool {
    inputs.alignment == Alignment::Conflicting
        || inputs.below_average_history(config)
        || inputs.probability < config.weak_probability
        || inputs.volatile
}

fn is_low(inputs: &RiskInputs, config: &EngineConfig) -> bool {
    inputs.probability >= config.low_risk_probability
        && inputs.alignment == Alignment::Aligned
        && !inputs.volatile
        && !inputs.poor_history(config)
        && !inputs.negative_pnl(config)
}

/// Evaluate the rule table; Medium when nothing fires.
pub fn classify(inputs: &RiskInputs, config: &EngineConfig) -> RiskLevel {
    RISK_RULES
        .iter()
        .find(|(_, rule)| rule(inputs, config))
        .map(|(level, _)| *level)
        .unwrap_or(RiskLevel::Medium)
}
