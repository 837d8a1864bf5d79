//! Statistics aggregator: one pass over a run's transactions.

use std::collections::BTreeMap;

use momo_core::stats::{
    AVG_TRANSACTION_AMOUNT, TOTAL_AMOUNT, TOTAL_TRANSACTIONS, category_amount_key,
    category_count_key, type_count_key,
};
use momo_core::{Category, StatValue, StatsSnapshot, Transaction, TransactionType};

/// Compute the snapshot for a batch. An empty batch yields an empty snapshot.
///
/// Per-type and per-category keys only appear for values present in the batch.
pub fn aggregate(transactions: &[Transaction]) -> StatsSnapshot {
    let mut stats = StatsSnapshot::new();
    if transactions.is_empty() {
        return stats;
    }

    let mut total = 0.0;
    let mut by_type: BTreeMap<TransactionType, u64> = BTreeMap::new();
    let mut by_category: BTreeMap<Category, (u64, f64)> = BTreeMap::new();

    for txn in transactions {
        total += txn.amount;
        *by_type.entry(txn.kind).or_insert(0) += 1;
        let entry = by_category.entry(txn.category).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += txn.amount;
    }

    let count = transactions.len() as u64;
    stats.insert(TOTAL_TRANSACTIONS, StatValue::Count(count));
    stats.insert(TOTAL_AMOUNT, StatValue::Amount(total));
    stats.insert(AVG_TRANSACTION_AMOUNT, StatValue::Amount(total / count as f64));

    for (kind, n) in by_type {
        stats.insert(type_count_key(kind), StatValue::Count(n));
    }
    for (category, (n, amount)) in by_category {
        stats.insert(category_count_key(category), StatValue::Count(n));
        stats.insert(category_amount_key(category), StatValue::Amount(amount));
    }

    stats
}
