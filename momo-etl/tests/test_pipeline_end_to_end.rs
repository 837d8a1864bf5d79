use std::fs;

use momo_core::time::{DEFAULT_TIMEZONE, parse_timezone};
use momo_core::{Categorizer, Category, TransactionType};
use momo_etl::{
    DashboardJson, DirDeadLetterSink, PersistenceWriter, Pipeline, SqliteStore, TransactionFilter,
};
use momo_ingest::sample::{SampleConfig, write_sample_xml};
use momo_ingest::{SmsExtractor, read_messages};

const BACKUP: &str = r#"<?xml version='1.0' encoding='UTF-8' standalone='yes' ?>
<smses count="4">
  <sms address="M-Money" date="1683014100000" body="You have received RWF 500000 from JOHN DOE (0244123456) on 01/05/23 at 08:15 AM. Reference: TX123456789. Fee charged: RWF 0. Available Balance: RWF 1250000" />
  <sms address="M-Money" date="1683100500000" body="Payment of RWF 12,500 to ELECTRICITY BILL (0788123456) successful. Ref: TX55" />
  <sms address="Friend" date="garbage" body="Hello, how are you?" />
  <sms address="M-Money" date="1683200000000" />
</smses>
"#;

fn extractor() -> SmsExtractor {
    SmsExtractor::new(
        Categorizer::default(),
        parse_timezone(DEFAULT_TIMEZONE).unwrap(),
    )
    .unwrap()
}

/// Real-file run: XML in, SQLite + dashboard + dead-letter files out.
#[test]
fn test_full_run_from_xml_backup() {
    let dir = tempfile::tempdir().unwrap();
    let tz = parse_timezone(DEFAULT_TIMEZONE).unwrap();
    let input = dir.path().join("raw").join("momo.xml");
    fs::create_dir_all(input.parent().unwrap()).unwrap();
    fs::write(&input, BACKUP).unwrap();

    let mut store = SqliteStore::open(dir.path().join("transactions.db"), tz).unwrap();
    let messages = read_messages(&input).unwrap();
    let sink = DirDeadLetterSink::new(dir.path().join("logs").join("dead_letter")).unwrap();
    let mut pipeline = Pipeline::new(extractor(), sink);
    let outcome = pipeline.run(messages);

    let report = outcome.report();
    assert_eq!(report.messages_read, 4);
    assert_eq!(report.transactions_extracted, 3);
    assert_eq!(report.dead_lettered, 1);

    store.write_run(&outcome.transactions, &outcome.stats).unwrap();
    let dashboard = dir.path().join("processed").join("dashboard.json");
    DashboardJson::new(&dashboard, tz)
        .write_run(&outcome.transactions, &outcome.stats)
        .unwrap();

    // The body-less message only exists as a dead letter
    let dead: Vec<_> = fs::read_dir(pipeline.sink().dir()).unwrap().collect();
    assert_eq!(dead.len(), 1);
    let stored = store.list_transactions(&TransactionFilter::default()).unwrap();
    assert_eq!(stored.len(), 3);
    assert!(stored.iter().all(|s| !s.transaction.description.is_empty()));

    let received = stored
        .iter()
        .find(|s| s.transaction.kind == TransactionType::CashIn)
        .unwrap();
    assert_eq!(received.transaction.amount, 500000.0);
    assert_eq!(received.transaction.reference.as_deref(), Some("TX123456789"));

    let bill = stored
        .iter()
        .find(|s| s.transaction.category == Category::Bills)
        .unwrap();
    assert_eq!(bill.transaction.amount, 12500.0);
    assert_eq!(bill.transaction.kind, TransactionType::CashOut);
    assert_eq!(bill.transaction.reference.as_deref(), Some("TX55"));

    let stats = store.load_stats().unwrap();
    let total = stats.iter().find(|s| s.name == "total_transactions").unwrap();
    assert_eq!(total.value, "3");
    assert!(dashboard.exists());
}

/// Generated sample data exercises every template and still reconciles.
#[test]
fn test_generated_sample_reconciles() {
    let dir = tempfile::tempdir().unwrap();
    let tz = parse_timezone(DEFAULT_TIMEZONE).unwrap();
    let path = dir.path().join("generated_sms_data.xml");
    let mut cfg = SampleConfig::new(200, tz);
    cfg.seed = Some(42);
    write_sample_xml(&path, &cfg).unwrap();

    let messages = read_messages(&path).unwrap();
    let mut pipeline = Pipeline::new(extractor(), momo_etl::MemoryDeadLetterSink::default());
    let outcome = pipeline.run(messages);

    assert_eq!(outcome.transactions.len(), 200);
    assert!(outcome.dead_letters.is_empty());
    assert!(outcome.transactions.iter().all(|t| t.amount >= 10.0));
    assert!(outcome.transactions.iter().all(|t| t.reference.is_some()));

    let stats = &outcome.stats;
    assert!((stats.category_amount_sum() - stats.total_amount()).abs() < 1e-6);
    assert_eq!(stats.category_count_sum(), stats.total_transactions());
}

#[test]
fn test_unreadable_input_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let bad = dir.path().join("broken.xml");
    fs::write(&bad, "<smses><sms body='x'></smses>").unwrap();
    assert!(read_messages(&bad).is_err());
}
