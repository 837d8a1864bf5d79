//! Dead-letter records: messages that failed extraction, kept for inspection.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::ExtractionFailure;
use crate::message::RawMessage;

/// Second-granularity stamp used both in the record and its file name
pub const STAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Write-once record of one failed message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadLetterRecord {
    pub message: RawMessage,
    pub error: String,
    #[serde(rename = "timestamp", with = "compact_stamp")]
    pub captured_at: NaiveDateTime,
}

impl DeadLetterRecord {
    pub fn new(message: RawMessage, error: impl ToString, captured_at: NaiveDateTime) -> Self {
        Self {
            message,
            error: error.to_string(),
            captured_at,
        }
    }

    pub fn from_failure(failure: ExtractionFailure, captured_at: NaiveDateTime) -> Self {
        Self::new(failure.message, failure.error, captured_at)
    }

    /// `YYYYmmddHHMMSS`; two records captured in the same second share it.
    pub fn stamp(&self) -> String {
        self.captured_at.format(STAMP_FORMAT).to_string()
    }
}

mod compact_stamp {
    use super::STAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&dt.format(STAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, STAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}
