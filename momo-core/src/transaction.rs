//! Transaction record types produced by the extraction pipeline

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::category::Category;

/// Storage and export format for all transaction timestamps
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Direction of money movement, decided by keywords in the SMS body
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TransactionType {
    #[serde(rename = "CASH_IN")]
    CashIn,
    #[serde(rename = "CASH_OUT")]
    CashOut,
    #[serde(rename = "OTHER")]
    Other,
}

impl TransactionType {
    pub const ALL: [TransactionType; 3] = [
        TransactionType::CashIn,
        TransactionType::CashOut,
        TransactionType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::CashIn => "CASH_IN",
            TransactionType::CashOut => "CASH_OUT",
            TransactionType::Other => "OTHER",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase().replace('-', "_");
        TransactionType::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| anyhow::anyhow!("unknown transaction type: {s}"))
    }
}

/// One structured record extracted from one SMS body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    /// When the SMS was received (local time), or extraction time if unknown
    #[serde(with = "local_datetime")]
    pub date: NaiveDateTime,
    /// Verbatim message body
    pub description: String,
    /// Non-negative; 0.0 when no amount pattern matched
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub category: Category,
    pub phone: Option<String>,
    pub reference: Option<String>,
    #[serde(rename = "processed_date", with = "local_datetime")]
    pub processed_at: NaiveDateTime,
}

/// Serde adapter for `NaiveDateTime` in [`DATE_FORMAT`].
pub mod local_datetime {
    use super::DATE_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&dt.format(DATE_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, DATE_FORMAT).map_err(serde::de::Error::custom)
    }
}
