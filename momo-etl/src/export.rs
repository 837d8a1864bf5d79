//! File exports of a finished run: dashboard JSON and a flat CSV of transactions.

use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use momo_core::time::now_local;
use momo_core::transaction::DATE_FORMAT;
use momo_core::{StatsSnapshot, Transaction};

use crate::store::PersistenceWriter;

#[derive(Serialize)]
struct Dashboard<'a> {
    transactions: &'a [Transaction],
    stats: &'a StatsSnapshot,
    generated_at: String,
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    Ok(())
}

/// `{ transactions, stats, generated_at }` document for the dashboard
#[derive(Debug, Clone)]
pub struct DashboardJson {
    path: PathBuf,
    tz: Tz,
}

impl DashboardJson {
    pub fn new(path: impl Into<PathBuf>, tz: Tz) -> Self {
        Self {
            path: path.into(),
            tz,
        }
    }
}

impl PersistenceWriter for DashboardJson {
    fn write_run(&mut self, transactions: &[Transaction], stats: &StatsSnapshot) -> Result<()> {
        if transactions.is_empty() {
            warn!("no transactions to export");
            return Ok(());
        }
        ensure_parent(&self.path)?;
        let doc = Dashboard {
            transactions,
            stats,
            generated_at: now_local(self.tz).format(DATE_FORMAT).to_string(),
        };
        let json = serde_json::to_string_pretty(&doc)?;
        fs::write(&self.path, json).with_context(|| format!("write {}", self.path.display()))?;
        info!(path = %self.path.display(), "exported dashboard data");
        Ok(())
    }
}

/// Header row, in `Transaction` field order
const CSV_COLUMNS: [&str; 8] = [
    "date", "description", "amount", "type", "category", "phone", "reference", "processed_date",
];

/// One CSV row per transaction, same field names as the JSON export
#[derive(Debug, Clone)]
pub struct TransactionsCsv {
    path: PathBuf,
}

impl TransactionsCsv {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PersistenceWriter for TransactionsCsv {
    fn write_run(&mut self, transactions: &[Transaction], _stats: &StatsSnapshot) -> Result<()> {
        ensure_parent(&self.path)?;
        let mut wtr = csv::Writer::from_path(&self.path)
            .with_context(|| format!("opening {}", self.path.display()))?;
        // serialize() only emits headers alongside the first record
        if transactions.is_empty() {
            wtr.write_record(CSV_COLUMNS)?;
        }
        for t in transactions {
            wtr.serialize(t)?;
        }
        wtr.flush()?;
        info!(path = %self.path.display(), rows = transactions.len(), "exported transactions CSV");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::aggregate;
    use chrono::NaiveDate;
    use momo_core::time::{DEFAULT_TIMEZONE, parse_timezone};
    use momo_core::{Category, TransactionType};

    fn batch() -> Vec<Transaction> {
        let at = NaiveDate::from_ymd_opt(2023, 4, 1)
            .unwrap()
            .and_hms_opt(7, 30, 0)
            .unwrap();
        vec![Transaction {
            date: at,
            description: "Payment of RWF 1,200 to WATER BILL".to_string(),
            amount: 1200.0,
            kind: TransactionType::CashOut,
            category: Category::Bills,
            phone: None,
            reference: Some("TX1".to_string()),
            processed_at: at,
        }]
    }

    #[test]
    fn test_dashboard_json_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed").join("dashboard.json");
        let txns = batch();
        let mut out = DashboardJson::new(&path, parse_timezone(DEFAULT_TIMEZONE).unwrap());
        out.write_run(&txns, &aggregate(&txns)).unwrap();

        let doc: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["transactions"][0]["type"], "CASH_OUT");
        assert_eq!(doc["stats"]["total_transactions"], 1);
        assert_eq!(doc["stats"]["amount_category_bills"], 1200.0);
        assert!(doc["generated_at"].is_string());
    }

    #[test]
    fn test_dashboard_skipped_when_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.json");
        let mut out = DashboardJson::new(&path, parse_timezone(DEFAULT_TIMEZONE).unwrap());
        out.write_run(&[], &StatsSnapshot::new()).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_csv_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transactions.csv");
        TransactionsCsv::new(&path)
            .write_run(&batch(), &StatsSnapshot::new())
            .unwrap();

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        let headers = rdr.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec![
                "date", "description", "amount", "type", "category", "phone", "reference",
                "processed_date"
            ]
        );
        let rows: Vec<Transaction> = rdr.deserialize().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows, batch());
    }

    #[test]
    fn test_empty_csv_has_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transactions.csv");
        TransactionsCsv::new(&path)
            .write_run(&[], &StatsSnapshot::new())
            .unwrap();

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        assert_eq!(rdr.headers().unwrap().iter().collect::<Vec<_>>(), CSV_COLUMNS);
        assert_eq!(rdr.records().count(), 0);
    }
}
