pub mod calculator;
pub mod config;
pub mod session;

#[cfg(test)]
mod calculator_tests;

pub use calculator::{cv_position, HybridMathCalculator};
pub use config::HybridMathConfig;
pub use session::{display_name, is_weekend, trading_date};
