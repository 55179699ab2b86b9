use std::path::PathBuf;
use std::sync::Arc;

use analysis_core::{Bar, Outcome, OutcomeStore};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hybrid_math::HybridMathCalculator;
use outcome_store::{InMemoryOutcomeStore, SqliteOutcomeStore};
use probability_engine::ProbabilityEngine;
use sentiment_analysis::{CancelToken, SentimentScorer};
use signal_assembler::SignalAssembler;

mod config;
mod input;

use config::AppConfig;

#[derive(Parser)]
#[command(name = "signal-cli")]
#[command(about = "Hybrid Math trading signals with sentiment and outcome learning")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble one signal from two bars and print it as JSON
    Signal {
        symbol: String,
        /// Prior bar as OPEN,HIGH,LOW,CLOSE
        #[arg(long, value_parser = input::parse_bar)]
        prior: Bar,
        /// Current bar as OPEN,HIGH,LOW,CLOSE
        #[arg(long, value_parser = input::parse_bar)]
        current: Bar,
        /// News headline (repeatable)
        #[arg(long = "headline")]
        headlines: Vec<String>,
        /// Keep the pending record in memory only
        #[arg(long)]
        dry_run: bool,
    },
    /// Run headlines through the sentiment chain
    Score {
        headlines: Vec<String>,
        #[arg(long, default_value = "")]
        symbol: String,
    },
    /// Report the result of a pending signal
    Outcome {
        signal_id: String,
        /// WIN, LOSS or BREAKEVEN
        outcome: String,
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        pnl: f64,
    },
    /// Learning statistics over every recorded signal
    Stats,
    /// Signals from the last N days
    Recent {
        #[arg(short, long, default_value = "7")]
        days: i64,
    },
    /// Dump every record as JSON
    Export {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    // stdout carries the command output
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Cancel in-flight sentiment calls on Ctrl-C.
fn cancel_on_ctrl_c() -> CancelToken {
    let cancel = CancelToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted; falling back to keyword sentiment");
            token.cancel();
        }
    });
    cancel
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    match cli.command {
        Commands::Signal {
            symbol,
            prior,
            current,
            headlines,
            dry_run,
        } => {
            let store: Arc<dyn OutcomeStore> = if dry_run {
                Arc::new(InMemoryOutcomeStore::new())
            } else {
                Arc::new(
                    SqliteOutcomeStore::connect(&config.database_url)
                        .await
                        .with_context(|| format!("opening {}", config.database_url))?,
                )
            };
            let scorer = SentimentScorer::from_config(&config.scorer)?;
            tracing::info!("Sentiment chain: {:?}", scorer.chain());

            let assembler = SignalAssembler::new(
                HybridMathCalculator::new(config.hybrid_math.clone()),
                Arc::new(scorer),
                ProbabilityEngine::new(config.engine.clone()),
                store,
            )
            .with_config(config.assembler.clone());

            let cancel = cancel_on_ctrl_c();
            let signal = assembler
                .assemble(&symbol, &prior, &current, &headlines, &cancel)
                .await?;
            print_json(&signal)?;
        }
        Commands::Score { headlines, symbol } => {
            let scorer = SentimentScorer::from_config(&config.scorer)?;
            let cancel = cancel_on_ctrl_c();
            let result = scorer.score_for(&symbol, &headlines, &cancel).await;
            print_json(&result)?;
        }
        Commands::Outcome {
            signal_id,
            outcome,
            pnl,
        } => {
            let outcome: Outcome = outcome.parse()?;
            let store = SqliteOutcomeStore::connect(&config.database_url).await?;
            store.report_outcome(&signal_id, outcome, pnl).await?;
            println!("{} -> {} ({:+.2})", signal_id, outcome, pnl);
        }
        Commands::Stats => {
            let store = SqliteOutcomeStore::connect(&config.database_url).await?;
            print_json(&store.learning_stats().await?)?;
        }
        Commands::Recent { days } => {
            let store = SqliteOutcomeStore::connect(&config.database_url).await?;
            print_json(&store.recent(days).await?)?;
        }
        Commands::Export { output } => {
            let store = SqliteOutcomeStore::connect(&config.database_url).await?;
            let records = store.export_all().await?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, serde_json::to_string_pretty(&records)?)
                        .await
                        .with_context(|| format!("writing {}", path.display()))?;
                    tracing::info!("Exported {} records to {}", records.len(), path.display());
                }
                None => print_json(&records)?,
            }
        }
    }

    Ok(())
}
