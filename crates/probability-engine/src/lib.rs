//! Adaptive probability: raw confidence adjusted by sentiment alignment and
//! the symbol's own outcome history, plus an ordinal risk level.

pub mod config;
pub mod engine;
pub mod history;
pub mod risk;

pub use config::EngineConfig;
pub use engine::{probability_label, Adjustment, ProbabilityEngine};
pub use history::HistoryStats;
pub use risk::{Alignment, RiskFactor, RiskInputs};
