use anyhow::{Context, Result};
use hybrid_math::HybridMathConfig;
use probability_engine::EngineConfig;
use sentiment_analysis::ScorerConfig;
use signal_assembler::AssemblerConfig;
use std::env;

/// Everything the binary reads from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub hybrid_math: HybridMathConfig,
    pub scorer: ScorerConfig,
    pub engine: EngineConfig,
    pub assembler: AssemblerConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:signals.db".to_string()),
            hybrid_math: HybridMathConfig::from_env().context("invalid HM_* settings")?,
            scorer: ScorerConfig::from_env().context("invalid sentiment settings")?,
            engine: EngineConfig::from_env().context("invalid PROB_* settings")?,
            assembler: AssemblerConfig::from_env().context("invalid history settings")?,
        })
    }
}
