use async_trait::async_trait;
use crate::{Bar, Bias, EnrichedSignal, Outcome, OutcomeRecord, SignalError, Timeframe};

/// Supplies the last two closed bars for a symbol.
///
/// Implementations return `SignalError::DataUnavailable` when the market is closed or the
/// symbol is unknown. Callers skip the symbol for that cycle rather than fabricating bars.
#[async_trait]
pub trait BarProvider: Send + Sync {
    async fn last_two_bars(&self, symbol: &str, interval: Timeframe) -> Result<(Bar, Bar), SignalError>;
}

/// Supplies recent news headlines for a symbol. May return an empty list.
#[async_trait]
pub trait HeadlineSource: Send + Sync {
    async fn headlines(&self, symbol: &str) -> Result<Vec<String>, SignalError>;
}

/// Persistence for assembled signals and their eventual outcomes.
#[async_trait]
pub trait OutcomeStore: Send + Sync {
    /// Write a pending record for a freshly assembled signal and return its id.
    async fn record_pending_signal(&self, signal: &EnrichedSignal) -> Result<String, SignalError>;

    /// Most recent records first, at most `limit`.
    async fn get_history(
        &self,
        symbol: &str,
        signal_type: Bias,
        limit: usize,
    ) -> Result<Vec<OutcomeRecord>, SignalError>;

    /// Resolve a pending record. Each record accepts exactly one outcome.
    async fn report_outcome(
        &self,
        signal_id: &str,
        outcome: Outcome,
        profit_loss: f64,
    ) -> Result<(), SignalError>;
}
