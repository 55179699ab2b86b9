use analysis_core::{
    Bias, EnrichedSignal, Outcome, OutcomeRecord, OutcomeStore, SentimentSource, SignalError,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::str::FromStr;

use crate::stats::LearningStats;

/// Outcome store backed by SQLite.
#[derive(Clone)]
pub struct SqliteOutcomeStore {
    pool: SqlitePool,
}

/// Internal DB row type with String dates and enums
#[derive(Debug, FromRow)]
struct OutcomeRow {
    signal_id: String,
    symbol: String,
    signal_type: String,
    predicted_probability: f64,
    risk_level: String,
    actual_outcome: String,
    profit_loss: Option<f64>,
    created_at: String,
    sentiment_source: Option<String>,
    resolved_at: Option<String>,
}

impl OutcomeRow {
    fn into_record(self) -> Result<OutcomeRecord, SignalError> {
        Ok(OutcomeRecord {
            signal_type: self.signal_type.parse()?,
            risk_level: self.risk_level.parse()?,
            actual_outcome: self.actual_outcome.parse()?,
            predicted_probability: self.predicted_probability,
            profit_loss: self.profit_loss,
            timestamp: parse_timestamp(&self.created_at)?,
            sentiment_source: self.sentiment_source.as_deref().map(str::parse::<SentimentSource>).transpose()?,
            resolved_at: self.resolved_at.as_deref().map(parse_timestamp).transpose()?,
            signal_id: self.signal_id,
            symbol: self.symbol,
        })
    }
}

const SELECT_COLUMNS: &str = "signal_id, symbol, signal_type, predicted_probability, risk_level, \
     actual_outcome, profit_loss, created_at, sentiment_source, resolved_at";

fn db_err(e: sqlx::Error) -> SignalError {
    SignalError::DatabaseError(e.to_string())
}

/// Fixed-width UTC so text ordering matches time ordering.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, SignalError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SignalError::InvalidData(format!("bad timestamp '{}': {}", s, e)))
}

impl SqliteOutcomeStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database at `database_url` and ensure the schema.
    pub async fn connect(database_url: &str) -> Result<Self, SignalError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(db_err)?
            .create_if_missing(true);
        // Every connection to an in-memory database is a separate database.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(db_err)?;

        let store = Self::new(pool);
        store.init_tables().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn init_tables(&self) -> Result<(), SignalError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS signal_outcomes (
                signal_id TEXT PRIMARY KEY,
                symbol TEXT NOT NULL,
                display_name TEXT NOT NULL,
                signal_type TEXT NOT NULL,
                predicted_probability REAL NOT NULL,
                raw_confidence REAL NOT NULL,
                risk_level TEXT NOT NULL,
                current_value REAL NOT NULL,
                take_profit REAL NOT NULL,
                stop_loss_tight REAL NOT NULL,
                stop_loss_wide REAL NOT NULL,
                sentiment_score REAL NOT NULL,
                sentiment_source TEXT,
                headline_digest TEXT NOT NULL,
                trading_date TEXT NOT NULL,
                actual_outcome TEXT NOT NULL DEFAULT 'PENDING',
                profit_loss REAL,
                created_at TEXT NOT NULL,
                resolved_at TEXT
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_signal_outcomes_history
             ON signal_outcomes (symbol, signal_type, created_at)",
        )
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    /// Signals created in the last `days` days, newest first.
    pub async fn recent(&self, days: i64) -> Result<Vec<OutcomeRecord>, SignalError> {
        let cutoff = format_timestamp(&(Utc::now() - Duration::days(days)));
        let rows: Vec<OutcomeRow> = sqlx::query_as(&format!(
            "SELECT {} FROM signal_outcomes WHERE created_at >= ? ORDER BY created_at DESC",
            SELECT_COLUMNS
        ))
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(OutcomeRow::into_record).collect()
    }

    /// Every record, oldest first.
    pub async fn export_all(&self) -> Result<Vec<OutcomeRecord>, SignalError> {
        let rows: Vec<OutcomeRow> = sqlx::query_as(&format!(
            "SELECT {} FROM signal_outcomes ORDER BY created_at ASC",
            SELECT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(OutcomeRow::into_record).collect()
    }

    pub async fn get(&self, signal_id: &str) -> Result<Option<OutcomeRecord>, SignalError> {
        let row: Option<OutcomeRow> = sqlx::query_as(&format!(
            "SELECT {} FROM signal_outcomes WHERE signal_id = ?",
            SELECT_COLUMNS
        ))
        .bind(signal_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(OutcomeRow::into_record).transpose()
    }

    pub async fn learning_stats(&self) -> Result<LearningStats, SignalError> {
        let by_outcome: Vec<(String, i64, Option<f64>, i64)> = sqlx::query_as(
            "SELECT actual_outcome, COUNT(*), SUM(profit_loss), COUNT(profit_loss)
             FROM signal_outcomes
             GROUP BY actual_outcome",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let by_source: Vec<(String, i64)> = sqlx::query_as(
            "SELECT COALESCE(sentiment_source, 'UNKNOWN'), COUNT(*)
             FROM signal_outcomes
             GROUP BY 1",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut stats = LearningStats::default();
        let (mut pnl_sum, mut pnl_count) = (0.0, 0usize);

        for (outcome, count, sum, with_pnl) in by_outcome {
            let count = count as usize;
            stats.total_signals += count;
            match outcome.parse::<Outcome>()? {
                Outcome::Pending => stats.pending += count,
                Outcome::Win => stats.wins += count,
                Outcome::Loss => stats.losses += count,
                Outcome::Breakeven => stats.breakevens += count,
            }
            pnl_sum += sum.unwrap_or(0.0);
            pnl_count += with_pnl as usize;
        }
        for (source, count) in by_source {
            stats.by_source.insert(source, count as usize);
        }

        stats.finish(pnl_sum, pnl_count);
        Ok(stats)
    }
}

#[async_trait]
impl OutcomeStore for SqliteOutcomeStore {
    async fn record_pending_signal(&self, signal: &EnrichedSignal) -> Result<String, SignalError> {
        let signal_id = uuid::Uuid::new_v4().to_string();
        let s = &signal.signal;

        sqlx::query(
            r#"
            INSERT INTO signal_outcomes (
                signal_id, symbol, display_name, signal_type, predicted_probability,
                raw_confidence, risk_level, current_value, take_profit, stop_loss_tight,
                stop_loss_wide, sentiment_score, sentiment_source, headline_digest,
                trading_date, actual_outcome, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'PENDING', ?)
            "#,
        )
        .bind(&signal_id)
        .bind(&s.symbol)
        .bind(&s.display_name)
        .bind(s.bias.as_str())
        .bind(f64::from(signal.probability_percentage))
        .bind(signal.raw_confidence)
        .bind(signal.risk_level.as_str())
        .bind(s.current_value)
        .bind(s.take_profit)
        .bind(s.stop_loss_tight)
        .bind(s.stop_loss_wide)
        .bind(signal.sentiment.score)
        .bind(signal.sentiment.source.as_str())
        .bind(&signal.headline_digest)
        .bind(signal.trading_date.to_string())
        .bind(format_timestamp(&signal.generated_at))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        tracing::debug!("Recorded pending {} signal {} for {}", s.bias, signal_id, s.symbol);
        Ok(signal_id)
    }

    async fn get_history(
        &self,
        symbol: &str,
        signal_type: Bias,
        limit: usize,
    ) -> Result<Vec<OutcomeRecord>, SignalError> {
        let rows: Vec<OutcomeRow> = sqlx::query_as(&format!(
            "SELECT {} FROM signal_outcomes
             WHERE symbol = ? AND signal_type = ?
             ORDER BY created_at DESC
             LIMIT ?",
            SELECT_COLUMNS
        ))
        .bind(symbol)
        .bind(signal_type.as_str())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(OutcomeRow::into_record).collect()
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

        // Only a pending record can be resolved; the guard makes this single-shot.
        let result = sqlx::query(
            r#"
            UPDATE signal_outcomes
            SET actual_outcome = ?, profit_loss = ?, resolved_at = ?
            WHERE signal_id = ? AND actual_outcome = 'PENDING'
            "#,
        )
        .bind(outcome.as_str())
        .bind(profit_loss)
        .bind(format_timestamp(&Utc::now()))
        .bind(signal_id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 1 {
            tracing::info!("Signal {} resolved as {} ({:+.2})", signal_id, outcome, profit_loss);
            return Ok(());
        }

        match self.get(signal_id).await? {
            None => Err(SignalError::UnknownSignal(signal_id.to_string())),
            Some(existing) => {
                tracing::debug!("Signal {} already resolved as {}", signal_id, existing.actual_outcome);
                Err(SignalError::OutcomeAlreadyReported(signal_id.to_string()))
            }
        }
    }
}
