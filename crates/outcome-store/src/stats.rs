use analysis_core::{Outcome, OutcomeRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Totals over everything the store has recorded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningStats {
    pub total_signals: usize,
    pub pending: usize,
    pub wins: usize,
    pub losses: usize,
    pub breakevens: usize,
    /// Wins over resolved signals, `None` before the first resolution
    pub win_rate: Option<f64>,
    pub avg_profit_loss: Option<f64>,
    /// Signals per sentiment tier
    pub by_source: BTreeMap<String, usize>,
}

impl LearningStats {
    pub fn from_records(records: &[OutcomeRecord]) -> Self {
        let mut stats = LearningStats {
            total_signals: records.len(),
            ..Default::default()
        };
        let (mut pnl_sum, mut pnl_count) = (0.0, 0);

        for record in records {
            match record.actual_outcome {
                Outcome::Pending => stats.pending += 1,
                Outcome::Win => stats.wins += 1,
                Outcome::Loss => stats.losses += 1,
                Outcome::Breakeven => stats.breakevens += 1,
            }
            if let Some(p) = record.profit_loss {
                pnl_sum += p;
                pnl_count += 1;
            }
            let source = record
                .sentiment_source
                .map(|s| s.as_str().to_string())
                .unwrap_or_else(|| "UNKNOWN".to_string());
            *stats.by_source.entry(source).or_insert(0) += 1;
        }

        stats.finish(pnl_sum, pnl_count);
        stats
    }

    pub fn resolved(&self) -> usize {
        self.wins + self.losses + self.breakevens
    }

    /// Derive the rates once the counters are filled in.
    pub(crate) fn finish(&mut self, pnl_sum: f64, pnl_count: usize) {
        let resolved = self.resolved();
        self.win_rate = (resolved > 0).then(|| self.wins as f64 / resolved as f64);
        self.avg_profit_loss = (pnl_count > 0).then(|| pnl_sum / pnl_count as f64);
    }
}
