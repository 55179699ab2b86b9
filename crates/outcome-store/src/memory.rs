use analysis_core::{
    Bias, EnrichedSignal, Outcome, OutcomeRecord, OutcomeStore, SignalError,
};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;

use crate::stats::LearningStats;

/// Process-local outcome store, for tests and dry runs.
#[derive(Clone, Default)]
pub struct InMemoryOutcomeStore {
    records: Arc<DashMap<String, OutcomeRecord>>,
}

impl InMemoryOutcomeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record directly, bypassing the pending write.
    pub fn insert(&self, record: OutcomeRecord) {
        self.records.insert(record.signal_id.clone(), record);
    }

    pub fn get(&self, signal_id: &str) -> Option<OutcomeRecord> {
        self.records.get(signal_id).map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn learning_stats(&self) -> LearningStats {
        let records: Vec<OutcomeRecord> = self.records.iter().map(|r| r.value().clone()).collect();
        LearningStats::from_records(&records)
    }
}

#[async_trait]
impl OutcomeStore for InMemoryOutcomeStore {
    async fn record_pending_signal(&self, signal: &EnrichedSignal) -> Result<String, SignalError> {
        let signal_id = uuid::Uuid::new_v4().to_string();
        let record = OutcomeRecord {
            signal_id: signal_id.clone(),
            symbol: signal.signal.symbol.clone(),
            signal_type: signal.signal.bias,
            predicted_probability: f64::from(signal.probability_percentage),
            risk_level: signal.risk_level,
            actual_outcome: Outcome::Pending,
            profit_loss: None,
            timestamp: signal.generated_at,
            sentiment_source: Some(signal.sentiment.source),
            resolved_at: None,
        };
        self.records.insert(signal_id.clone(), record);
        Ok(signal_id)
    }

    async fn get_history(
        &self,
        symbol: &str,
        signal_type: Bias,
        limit: usize,
    ) -> Result<Vec<OutcomeRecord>, SignalError> {
        let mut matching: Vec<OutcomeRecord> = self
            .records
            .iter()
            .filter(|r| r.symbol == symbol && r.signal_type == signal_type)
            .map(|r| r.value().clone())
            .collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        matching.truncate(limit);
        Ok(matching)
    }

    async fn report_outcome(
        &self,
        signal_id: &str,
        outcome: Outcome,
        profit_loss: f64,
    ) -> Result<(), SignalError> {
        if !outcome.is_resolved() {
            return Err(SignalError::InvalidOutcome(format!(
                "{} is not a reportable outcome",
                outcome
            )));
        }

        // The entry lock makes check-and-set atomic per record.
        let mut entry = self
            .records
            .get_mut(signal_id)
            .ok_or_else(|| SignalError::UnknownSignal(signal_id.to_string()))?;
        if entry.actual_outcome.is_resolved() {
            return Err(SignalError::OutcomeAlreadyReported(signal_id.to_string()));
        }
        entry.actual_outcome = outcome;
        entry.profit_loss = Some(profit_loss);
        entry.resolved_at = Some(Utc::now());
        Ok(())
    }
}
