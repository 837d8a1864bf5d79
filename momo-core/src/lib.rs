//! momo-core: data model and keyword categorization for mobile-money SMS transactions

pub mod category;
pub mod dead_letter;
pub mod error;
pub mod message;
pub mod stats;
pub mod time;
pub mod transaction;

pub use category::{Categorizer, Category, CategoryRule};
pub use dead_letter::DeadLetterRecord;
pub use error::{ExtractionError, ExtractionFailure};
pub use message::RawMessage;
pub use stats::{StatValue, StatsSnapshot};
pub use transaction::{Transaction, TransactionType};
