//! SQLite persistence for transactions and run stats.
//!
//! Schema matches what the query layer reads:
//!   transactions(id, date, description, amount, type, category, phone, reference, processed_date)
//!   stats(id, stat_name, stat_value, updated_at)

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use chrono_tz::Tz;
use rusqlite::{Connection, params};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use momo_core::time::now_local;
use momo_core::transaction::DATE_FORMAT;
use momo_core::{Category, StatsSnapshot, Transaction, TransactionType};

/// Receives the finished records of one run
pub trait PersistenceWriter {
    fn write_run(&mut self, transactions: &[Transaction], stats: &StatsSnapshot) -> Result<()>;
}

/// A persisted stat row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredStat {
    pub name: String,
    pub value: String,
    pub updated_at: String,
}

/// A persisted transaction with its row id
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredTransaction {
    pub id: i64,
    #[serde(flatten)]
    pub transaction: Transaction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotal {
    /// `YYYY-MM`
    pub month: String,
    pub count: u64,
    pub amount: f64,
}

/// Optional filters for [`SqliteStore::list_transactions`]
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub kind: Option<TransactionType>,
    pub category: Option<Category>,
    pub limit: Option<usize>,
}

#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    tz: Tz,
}

impl SqliteStore {
    /// Open (or create) the database file, creating parent directories and tables.
    pub fn open(path: impl AsRef<Path>, tz: Tz) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        let conn =
            Connection::open(path).with_context(|| format!("opening {}", path.display()))?;
        let store = Self { conn, tz };
        store.setup()?;
        info!(path = %path.display(), "database connection established");
        Ok(store)
    }

    pub fn open_in_memory(tz: Tz) -> Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
            tz,
        };
        store.setup()?;
        Ok(store)
    }

    fn setup(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                description TEXT NOT NULL,
                amount REAL NOT NULL,
                type TEXT NOT NULL,
                category TEXT NOT NULL,
                phone TEXT,
                reference TEXT,
                processed_date TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS stats (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                stat_name TEXT NOT NULL,
                stat_value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);
            CREATE INDEX IF NOT EXISTS idx_stats_name ON stats(stat_name);",
        )?;
        Ok(())
    }

    pub fn count_transactions(&self) -> Result<u64> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
        Ok(n.max(0) as u64)
    }

    pub fn load_stats(&self) -> Result<Vec<StoredStat>> {
        let mut stmt = self.conn.prepare(
            "SELECT stat_name, stat_value, updated_at FROM stats ORDER BY stat_name",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(StoredStat {
                name: row.get(0)?,
                value: row.get(1)?,
                updated_at: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Newest first.
    pub fn list_transactions(&self, filter: &TransactionFilter) -> Result<Vec<StoredTransaction>> {
        let limit = filter
            .limit
            .and_then(|n| i64::try_from(n).ok())
            .unwrap_or(-1);
        let mut stmt = self.conn.prepare(
            "SELECT id, date, description, amount, type, category, phone, reference, processed_date
             FROM transactions
             WHERE (?1 IS NULL OR type = ?1) AND (?2 IS NULL OR category = ?2)
             ORDER BY date DESC, id DESC
             LIMIT ?3",
        )?;
        let rows = stmt.query_map(
            params![
                filter.kind.map(|k| k.as_str()),
                filter.category.map(|c| c.as_str()),
                limit
            ],
            |row| {
                Ok(TransactionRow {
                    id: row.get(0)?,
                    date: row.get(1)?,
                    description: row.get(2)?,
                    amount: row.get(3)?,
                    kind: row.get(4)?,
                    category: row.get(5)?,
                    phone: row.get(6)?,
                    reference: row.get(7)?,
                    processed_date: row.get(8)?,
                })
            },
        )?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?.into_stored()?);
        }
        Ok(out)
    }

    pub fn monthly_totals(&self) -> Result<Vec<MonthlyTotal>> {
        let mut stmt = self.conn.prepare(
            "SELECT substr(date, 1, 7) AS month, COUNT(*), COALESCE(SUM(amount), 0.0)
             FROM transactions
             GROUP BY month
             ORDER BY month",
        )?;
        let rows = stmt.query_map([], |row| {
            let count: i64 = row.get(1)?;
            Ok(MonthlyTotal {
                month: row.get(0)?,
                count: count.max(0) as u64,
                amount: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

impl PersistenceWriter for SqliteStore {
    /// Append transactions and upsert stats in one SQLite transaction.
    fn write_run(&mut self, transactions: &[Transaction], stats: &StatsSnapshot) -> Result<()> {
        if transactions.is_empty() {
            warn!("no transactions to save");
            return Ok(());
        }

        let updated_at = now_local(self.tz).format(DATE_FORMAT).to_string();
        let tx = self.conn.transaction()?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO transactions
                 (date, description, amount, type, category, phone, reference, processed_date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for t in transactions {
                insert.execute(params![
                    t.date.format(DATE_FORMAT).to_string(),
                    t.description,
                    t.amount,
                    t.kind.as_str(),
                    t.category.as_str(),
                    t.phone,
                    t.reference,
                    t.processed_at.format(DATE_FORMAT).to_string(),
                ])?;
            }

            let mut update = tx.prepare(
                "UPDATE stats SET stat_value = ?1, updated_at = ?2 WHERE stat_name = ?3",
            )?;
            let mut insert_stat = tx.prepare(
                "INSERT INTO stats (stat_name, stat_value, updated_at) VALUES (?1, ?2, ?3)",
            )?;
            for (name, value) in stats.iter() {
                let value = value.to_string();
                if update.execute(params![value, updated_at, name])? == 0 {
                    insert_stat.execute(params![name, value, updated_at])?;
                }
            }
        }
        tx.commit().context("committing run")?;

        info!(count = transactions.len(), stats = stats.len(), "saved transactions to database");
        Ok(())
    }
}

struct TransactionRow {
    id: i64,
    date: String,
    description: String,
    amount: f64,
    kind: String,
    category: String,
    phone: Option<String>,
    reference: Option<String>,
    processed_date: String,
}

impl TransactionRow {
    fn into_stored(self) -> Result<StoredTransaction> {
        let parse_dt = |s: &str| {
            NaiveDateTime::parse_from_str(s, DATE_FORMAT)
                .with_context(|| format!("row {}: bad timestamp {s:?}", self.id))
        };
        Ok(StoredTransaction {
            id: self.id,
            transaction: Transaction {
                date: parse_dt(&self.date)?,
                processed_at: parse_dt(&self.processed_date)?,
                description: self.description,
                amount: self.amount,
                kind: self.kind.parse()?,
                category: self.category.parse()?,
                phone: self.phone,
                reference: self.reference,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use momo_core::StatValue;
    use momo_core::time::{DEFAULT_TIMEZONE, parse_timezone};

    fn tz() -> Tz {
        parse_timezone(DEFAULT_TIMEZONE).unwrap()
    }

    fn txn(month: u32, amount: f64, kind: TransactionType, category: Category) -> Transaction {
        let at = NaiveDate::from_ymd_opt(2023, month, 10)
            .unwrap()
            .and_hms_opt(8, 15, 0)
            .unwrap();
        Transaction {
            date: at,
            description: format!("RWF {amount}"),
            amount,
            kind,
            category,
            phone: Some("0244123456".to_string()),
            reference: None,
            processed_at: at,
        }
    }

    fn snapshot(total: u64) -> StatsSnapshot {
        let mut s = StatsSnapshot::new();
        s.insert("total_transactions", StatValue::Count(total));
        s
    }

    #[test]
    fn test_write_and_list() {
        let mut store = SqliteStore::open_in_memory(tz()).unwrap();
        let batch = vec![
            txn(1, 100.0, TransactionType::CashIn, Category::Salary),
            txn(2, 40.0, TransactionType::CashOut, Category::Bills),
            txn(2, 60.0, TransactionType::CashOut, Category::Food),
        ];
        store.write_run(&batch, &snapshot(3)).unwrap();

        assert_eq!(store.count_transactions().unwrap(), 3);
        let all = store.list_transactions(&TransactionFilter::default()).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].transaction.date.format("%m").to_string(), "02");
        assert_eq!(all[2].transaction, batch[0]);

        let bills = store
            .list_transactions(&TransactionFilter {
                category: Some(Category::Bills),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(bills.len(), 1);
        assert_eq!(bills[0].transaction.amount, 40.0);

        let cash_out = store
            .list_transactions(&TransactionFilter {
                kind: Some(TransactionType::CashOut),
                limit: Some(1),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(cash_out.len(), 1);
    }

    #[test]
    fn test_stats_upsert_overwrites_by_name() {
        let mut store = SqliteStore::open_in_memory(tz()).unwrap();
        let one = vec![txn(1, 10.0, TransactionType::CashIn, Category::Deposit)];
        store.write_run(&one, &snapshot(1)).unwrap();
        store.write_run(&one, &snapshot(2)).unwrap();

        let stats = store.load_stats().unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].name, "total_transactions");
        assert_eq!(stats[0].value, "2");
        // Transactions append across runs
        assert_eq!(store.count_transactions().unwrap(), 2);
    }

    #[test]
    fn test_empty_run_writes_nothing() {
        let mut store = SqliteStore::open_in_memory(tz()).unwrap();
        store.write_run(&[], &StatsSnapshot::new()).unwrap();
        assert_eq!(store.count_transactions().unwrap(), 0);
        assert!(store.load_stats().unwrap().is_empty());
    }

    #[test]
    fn test_failed_stats_write_rolls_back_transactions() {
        let mut store = SqliteStore::open_in_memory(tz()).unwrap();
        store
            .conn
            .execute_batch(
                "CREATE TRIGGER block_stats BEFORE INSERT ON stats
                 BEGIN SELECT RAISE(ABORT, 'stats table locked'); END;",
            )
            .unwrap();

        let batch = vec![
            txn(1, 100.0, TransactionType::CashIn, Category::Salary),
            txn(2, 40.0, TransactionType::CashOut, Category::Bills),
        ];
        assert!(store.write_run(&batch, &snapshot(2)).is_err());
        assert_eq!(store.count_transactions().unwrap(), 0);
        assert!(store.load_stats().unwrap().is_empty());
    }

    #[test]
    fn test_open_under_unusable_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("processed");
        fs::write(&blocker, "not a directory").unwrap();

        let err = SqliteStore::open(blocker.join("transactions.db"), tz()).unwrap_err();
        assert!(err.to_string().contains("processed"));
        assert_eq!(fs::read_to_string(&blocker).unwrap(), "not a directory");
    }

    #[test]
    fn test_monthly_totals() {
        let mut store = SqliteStore::open_in_memory(tz()).unwrap();
        let batch = vec![
            txn(1, 100.0, TransactionType::CashIn, Category::Salary),
            txn(2, 40.0, TransactionType::CashOut, Category::Bills),
            txn(2, 60.0, TransactionType::CashOut, Category::Food),
        ];
        store.write_run(&batch, &snapshot(3)).unwrap();

        let months = store.monthly_totals().unwrap();
        assert_eq!(
            months,
            vec![
                MonthlyTotal { month: "2023-01".into(), count: 1, amount: 100.0 },
                MonthlyTotal { month: "2023-02".into(), count: 2, amount: 100.0 },
            ]
        );
    }

    #[test]
    fn test_open_creates_file_and_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed").join("transactions.db");
        {
            let mut store = SqliteStore::open(&path, tz()).unwrap();
            store
                .write_run(
                    &[txn(3, 5.0, TransactionType::Other, Category::Other)],
                    &snapshot(1),
                )
                .unwrap();
        }
        let reopened = SqliteStore::open(&path, tz()).unwrap();
        assert_eq!(reopened.count_transactions().unwrap(), 1);
    }
}
