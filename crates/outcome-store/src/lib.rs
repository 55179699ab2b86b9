//! Persistence for pending signals and their reported outcomes.

pub mod memory;
pub mod sqlite;
pub mod stats;


pub use memory::InMemoryOutcomeStore;
pub use sqlite::SqliteOutcomeStore;
pub use stats::LearningStats;
