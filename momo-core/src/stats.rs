//! Aggregate statistics keyed by stat name

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::category::Category;
use crate::transaction::TransactionType;

pub const TOTAL_TRANSACTIONS: &str = "total_transactions";
pub const TOTAL_AMOUNT: &str = "total_amount";
pub const AVG_TRANSACTION_AMOUNT: &str = "avg_transaction_amount";
pub const COUNT_CATEGORY_PREFIX: &str = "count_category_";
pub const AMOUNT_CATEGORY_PREFIX: &str = "amount_category_";

/// `count_cash_in`, `count_cash_out`, `count_other`
pub fn type_count_key(kind: TransactionType) -> String {
    format!("count_{}", kind.as_str().to_lowercase())
}

pub fn category_count_key(category: Category) -> String {
    format!("{COUNT_CATEGORY_PREFIX}{category}")
}

pub fn category_amount_key(category: Category) -> String {
    format!("{AMOUNT_CATEGORY_PREFIX}{category}")
}

/// A stat is either a count or a money amount
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Count(u64),
    Amount(f64),
}

impl StatValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            StatValue::Count(n) => *n as f64,
            StatValue::Amount(a) => *a,
        }
    }
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatValue::Count(n) => fmt::Display::fmt(n, f),
            StatValue::Amount(a) => fmt::Display::fmt(a, f),
        }
    }
}

/// Stats for one run, recomputed from scratch each time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatsSnapshot(BTreeMap<String, StatValue>);

impl StatsSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: StatValue) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<StatValue> {
        self.0.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, StatValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn total_transactions(&self) -> u64 {
        match self.get(TOTAL_TRANSACTIONS) {
            Some(StatValue::Count(n)) => n,
            _ => 0,
        }
    }

    pub fn total_amount(&self) -> f64 {
        self.get(TOTAL_AMOUNT).map(|v| v.as_f64()).unwrap_or(0.0)
    }

    /// Sum of all `amount_category_*` entries
    pub fn category_amount_sum(&self) -> f64 {
        self.iter()
            .filter(|(k, _)| k.starts_with(AMOUNT_CATEGORY_PREFIX))
            .map(|(_, v)| v.as_f64())
            .sum()
    }

    /// Sum of all `count_category_*` entries
    pub fn category_count_sum(&self) -> u64 {
        self.iter()
            .filter(|(k, _)| k.starts_with(COUNT_CATEGORY_PREFIX))
            .map(|(_, v)| match v {
                StatValue::Count(n) => n,
                StatValue::Amount(a) => a as u64,
            })
            .sum()
    }
}

impl FromIterator<(String, StatValue)> for StatsSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, StatValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
