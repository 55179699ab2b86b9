use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SignalError {
    /// Missing or invalid bars. Fatal for the current cycle.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// The bar provider has nothing for this symbol (market closed, unknown symbol).
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    /// Absorbed by the sentiment fallback chain; never returned by the scorer.
    #[error("Sentiment unavailable: {0}")]
    SentimentUnavailable(String),

    #[error("History unavailable: {0}")]
    HistoryUnavailable(String),

    /// The signal calculator failed, so no trade plan may be recorded or delivered.
    #[error("Assembly aborted: {0}")]
    AssemblyAborted(Box<SignalError>),

    /// A per-symbol task panicked or was cancelled before returning.
    #[error("Task failed: {0}")]
    TaskFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Unknown signal: {0}")]
    UnknownSignal(String),

    #[error("Outcome already reported for signal {0}")]
    OutcomeAlreadyReported(String),

    #[error("Invalid outcome: {0}")]
    InvalidOutcome(String),
}

impl SignalError {
    /// Fatal errors abort a single symbol's cycle; everything else is recovered locally.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SignalError::InsufficientData(_)
                | SignalError::DataUnavailable(_)
                | SignalError::AssemblyAborted(_)
                | SignalError::TaskFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_failure_is_fatal_and_distinct_from_missing_data() {
        let crashed = SignalError::TaskFailed("task 7 panicked".to_string());
        assert!(crashed.is_fatal());
        assert_eq!(crashed.to_string(), "Task failed: task 7 panicked");
        assert_ne!(crashed, SignalError::DataUnavailable("task 7 panicked".to_string()));
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(!SignalError::HistoryUnavailable("timeout".to_string()).is_fatal());
        assert!(!SignalError::SentimentUnavailable("down".to_string()).is_fatal());
        assert!(SignalError::DataUnavailable("market closed".to_string()).is_fatal());
    }
}
