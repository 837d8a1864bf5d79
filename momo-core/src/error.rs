use thiserror::Error;

use crate::message::RawMessage;

/// Why a single message could not be turned into a transaction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// A field the extractor cannot work without is absent.
    #[error("message has no {0} field")]
    MissingField(&'static str),
}

/// Tagged extraction failure, carrying the message that caused it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionFailure {
    pub message: RawMessage,
    pub error: ExtractionError,
}
