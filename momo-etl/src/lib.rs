//! momo-etl: dead-letter handling, stats aggregation, the run pipeline, and persistence

pub mod dead_letter;
pub mod export;
pub mod pipeline;
pub mod stats;
pub mod store;

pub use dead_letter::{DeadLetterSink, DirDeadLetterSink, MemoryDeadLetterSink};
pub use export::{DashboardJson, TransactionsCsv};
pub use pipeline::{Pipeline, RunOutcome, RunReport};
pub use stats::aggregate;
pub use store::{PersistenceWriter, SqliteStore, TransactionFilter};
