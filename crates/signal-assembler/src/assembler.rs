use analysis_core::{
    Bar, BarProvider, EnrichedSignal, HeadlineSource, OutcomeRecord, OutcomeStore, SignalError,
    TradeSignal,
};
use chrono::{Duration, Utc};
use hybrid_math::{is_weekend, trading_date, HybridMathCalculator};
use probability_engine::{probability_label, ProbabilityEngine};
use sentiment_analysis::{CancelToken, SentimentScorer};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::config::AssemblerConfig;
use crate::digest::headline_digest;

/// Outcome of a multi-symbol run.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub signals: Vec<EnrichedSignal>,
    pub failures: Vec<(String, SignalError)>,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs one symbol through calculator, sentiment, history and persistence.
pub struct SignalAssembler {
    calculator: HybridMathCalculator,
    scorer: Arc<SentimentScorer>,
    engine: ProbabilityEngine,
    store: Arc<dyn OutcomeStore>,
    config: AssemblerConfig,
}

impl SignalAssembler {
    pub fn new(
        calculator: HybridMathCalculator,
        scorer: Arc<SentimentScorer>,
        engine: ProbabilityEngine,
        store: Arc<dyn OutcomeStore>,
    ) -> Self {
        Self {
            calculator,
            scorer,
            engine,
            store,
            config: AssemblerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AssemblerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    pub fn scorer(&self) -> &SentimentScorer {
        &self.scorer
    }

    /// Build one enriched signal.
    ///
    /// Only a calculator failure is fatal. Sentiment always resolves through the
    /// fallback chain, and store problems degrade the result instead of failing it.
    pub async fn assemble(
        &self,
        symbol: &str,
        prior: &Bar,
        current: &Bar,
        headlines: &[String],
        cancel: &CancelToken,
    ) -> Result<EnrichedSignal, SignalError> {
        let signal = self
            .calculator
            .compute(symbol, prior, current)
            .map_err(|e| SignalError::AssemblyAborted(Box::new(e)))?;

        let sentiment = self.scorer.score_for(symbol, headlines, cancel).await;

        let history = match self.load_history(&signal).await {
            Ok(records) => Some(records),
            Err(e) => {
                tracing::warn!("{} for {}; adjusting without outcome history", e, symbol);
                None
            }
        };

        let adjustment = self.engine.adjust(
            signal.raw_confidence,
            signal.bias,
            &sentiment,
            history.as_deref(),
        );

        let now = Utc::now();
        let mut enriched = EnrichedSignal {
            raw_confidence: signal.raw_confidence,
            probability_percentage: adjustment.probability_percentage,
            probability_label: probability_label(adjustment.probability_percentage).to_string(),
            risk_level: adjustment.risk_level,
            history_used: adjustment.history_used,
            history_samples: adjustment.resolved_samples,
            win_rate: adjustment.win_rate,
            signal_id: None,
            headline_digest: headline_digest(headlines),
            trading_date: trading_date(now),
            is_weekend_signal: is_weekend(now),
            generated_at: now,
            signal,
            sentiment,
        };

        match tokio::time::timeout(
            self.config.store_timeout,
            self.store.record_pending_signal(&enriched),
        )
        .await
        {
            Ok(Ok(id)) => enriched.signal_id = Some(id),
            Ok(Err(e)) => tracing::warn!("Could not record pending signal for {}: {}", symbol, e),
            Err(_) => tracing::warn!(
                "Recording pending signal for {} timed out after {:?}",
                symbol,
                self.config.store_timeout
            ),
        }

        tracing::info!(
            "{} {} CV {:.2} TP {:.2}: {}% ({}, risk {}, sentiment {} {:+.2})",
            enriched.signal.display_name,
            enriched.signal.bias,
            enriched.signal.current_value,
            enriched.signal.take_profit,
            enriched.probability_percentage,
            enriched.probability_label,
            enriched.risk_level,
            enriched.sentiment.source,
            enriched.sentiment.score
        );

        Ok(enriched)
    }

    /// Same-direction history for the signal, restricted to the configured window.
    async fn load_history(&self, signal: &TradeSignal) -> Result<Vec<OutcomeRecord>, SignalError> {
        let records = tokio::time::timeout(
            self.config.store_timeout,
            self.store
                .get_history(&signal.symbol, signal.bias, self.config.history_limit),
        )
        .await
        .map_err(|_| {
            SignalError::HistoryUnavailable(format!(
                "history lookup timed out after {:?}",
                self.config.store_timeout
            ))
        })?
        .map_err(|e| SignalError::HistoryUnavailable(e.to_string()))?;

        let cutoff = Duration::try_days(self.config.history_window_days)
            .and_then(|window| Utc::now().checked_sub_signed(window))
            .ok_or_else(|| {
                SignalError::HistoryUnavailable(format!(
                    "history window of {} days is out of range",
                    self.config.history_window_days
                ))
            })?;
        Ok(records.into_iter().filter(|r| r.timestamp >= cutoff).collect())
    }

    /// Fetch inputs for `symbol` and assemble.
    pub async fn run_cycle(
        &self,
        symbol: &str,
        bars: &dyn BarProvider,
        headlines: &dyn HeadlineSource,
        cancel: &CancelToken,
    ) -> Result<EnrichedSignal, SignalError> {
        let (prior, current) = bars.last_two_bars(symbol, self.config.interval).await?;

        let news = match headlines.headlines(symbol).await {
            Ok(news) => news,
            Err(e) => {
                tracing::warn!("No headlines for {}: {}", symbol, e);
                Vec::new()
            }
        };

        self.assemble(symbol, &prior, &current, &news, cancel).await
    }

    /// Run every symbol as its own task. One symbol failing never stops the others.
    pub async fn run_batch(
        self: &Arc<Self>,
        symbols: Vec<String>,
        bars: Arc<dyn BarProvider>,
        headlines: Arc<dyn HeadlineSource>,
        cancel: CancelToken,
    ) -> BatchReport {
        tracing::info!("Running signal cycle for {} symbols", symbols.len());

        let mut tasks = JoinSet::new();
        let mut task_symbols = HashMap::new();

        for symbol in symbols {
            let assembler = Arc::clone(self);
            let bars = Arc::clone(&bars);
            let headlines = Arc::clone(&headlines);
            let cancel = cancel.clone();
            let task_symbol = symbol.clone();

            let handle = tasks.spawn(async move {
                let result = assembler
                    .run_cycle(&task_symbol, bars.as_ref(), headlines.as_ref(), &cancel)
                    .await;
                (task_symbol, result)
            });
            task_symbols.insert(handle.id(), symbol);
        }

        let mut report = BatchReport::default();
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((_id, (_symbol, Ok(signal)))) => report.signals.push(signal),
                Ok((_id, (symbol, Err(e)))) => {
                    tracing::warn!("Signal cycle failed for {}: {}", symbol, e);
                    report.failures.push((symbol, e));
                }
                Err(e) => {
                    let symbol = task_symbols
                        .remove(&e.id())
                        .unwrap_or_else(|| "unknown".to_string());
                    tracing::error!("Signal task for {} failed: {}", symbol, e);
                    report.failures.push((symbol, SignalError::TaskFailed(e.to_string())));
                }
            }
        }

        report.signals.sort_by(|a, b| a.signal.symbol.cmp(&b.signal.symbol));
        tracing::info!(
            "Signal cycle finished: {} signals, {} failures",
            report.signals.len(),
            report.failures.len()
        );
        report
    }
}
