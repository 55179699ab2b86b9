//! Summary statistics over a symbol's outcome history.

use analysis_core::{adaptive, Outcome, OutcomeRecord};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryStats {
    /// Win, loss or breakeven records. Pending ones never count.
    pub resolved: usize,
    pub wins: usize,
    /// `None` below the minimum sample count
    pub win_rate: Option<f64>,
    /// Alternation rate of the most recent resolved outcomes, `None` below the minimum
    pub alternation: Option<f64>,
    /// Mean profit/loss of resolved records that carry one, `None` below the minimum
    pub avg_profit_loss: Option<f64>,
}

impl HistoryStats {
    /// `records` are expected most recent first, as the store returns them.
    pub fn from_records(records: &[OutcomeRecord], config: &EngineConfig) -> Self {
        let outcomes: Vec<bool> = records
            .iter()
            .filter(|r| r.actual_outcome.is_resolved())
            .map(|r| r.actual_outcome == Outcome::Win)
            .collect();

        let resolved = outcomes.len();
        let wins = outcomes.iter().filter(|&&w| w).count();
        let sufficient = resolved >= config.min_history_samples;

        let recent = &outcomes[..resolved.min(config.volatility_window)];
        let alternation = (sufficient && recent.len() >= 2).then(|| adaptive::alternation_rate(recent));

        let pnl: Vec<f64> = records
            .iter()
            .filter(|r| r.actual_outcome.is_resolved())
            .filter_map(|r| r.profit_loss)
            .filter(|p| p.is_finite())
            .collect();
        let avg_profit_loss = (sufficient && !pnl.is_empty()).then(|| adaptive::mean(&pnl));

        Self {
            resolved,
            wins,
            win_rate: if sufficient { adaptive::hit_rate(&outcomes) } else { None },
            alternation,
            avg_profit_loss,
        }
    }

    pub fn is_sufficient(&self) -> bool {
        self.win_rate.is_some()
    }

    pub fn is_volatile(&self, config: &EngineConfig) -> bool {
        self.alternation
            .map(|a| a >= config.volatility_threshold)
            .unwrap_or(false)
    }
}
