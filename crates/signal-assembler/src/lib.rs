//! Assembles enriched signals and runs them across a symbol list.

pub mod assembler;
pub mod config;
pub mod digest;


pub use assembler::{BatchReport, SignalAssembler};
pub use config::AssemblerConfig;
pub use digest::headline_digest;
