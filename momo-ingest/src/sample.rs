//! Sample MoMo SMS backup generator.
//!
//! Produces `<smses>` XML in the same layout [`crate::reader::parse_sms_xml`]
//! consumes, with templated CASH_IN / CASH_OUT / PAYMENT / TRANSFER notices.

use anyhow::{Context, Result, bail};
use chrono::{Duration, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use quick_xml::escape::escape;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::Path;

use momo_core::RawMessage;

pub const SENDER: &str = "M-Money";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Template {
    CashIn,
    CashOut,
    Payment,
    Transfer,
}

const TEMPLATES: [Template; 4] = [
    Template::CashIn,
    Template::CashOut,
    Template::Payment,
    Template::Transfer,
];

impl Template {
    fn names(self) -> &'static [&'static str] {
        match self {
            Template::CashIn => &[
                "JOHN DOE", "MARY SMITH", "SALARY PAYMENT", "BUSINESS INCOME",
                "GIFT PAYMENT", "LOAN DISBURSEMENT", "REFUND", "INVESTMENT RETURN",
            ],
            Template::CashOut => &[
                "AGENT KOFI", "AGENT SARAH", "AGENT PETER", "ATM WITHDRAWAL",
                "BANK TRANSFER", "CASH POINT", "AGENT EXPRESS", "QUICK CASH",
            ],
            Template::Payment => &[
                "ECG PREPAID", "WATER BILL", "DSTV SUBSCRIPTION", "SCHOOL FEES",
                "INTERNET BUNDLE", "ELECTRICITY BILL", "INSURANCE PREMIUM", "TAX PAYMENT",
                "HOSPITAL BILL", "RENT PAYMENT",
            ],
            Template::Transfer => &[
                "JANE SMITH", "MARY JOHNSON", "CHARITY DONATION", "FAMILY SUPPORT",
                "BUSINESS PARTNER", "SAVINGS ACCOUNT", "INVESTMENT FUND", "AIRTIME PURCHASE",
            ],
        }
    }

    fn render(self, short_form: bool, f: &Fields<'_>) -> String {
        let Fields { amount, name, phone, date, time, reference, fee, balance } = f;
        match (self, short_form) {
            (Template::CashIn, false) => format!(
                "You have received RWF {amount} from {name} ({phone}) on {date} at {time}. Reference: {reference}. Fee charged: RWF {fee}. Available Balance: RWF {balance}"
            ),
            (Template::CashIn, true) => format!(
                "MoMo deposit received. RWF {amount} from {name} ({phone}). Date: {date} {time}. Ref: {reference}. Fee: RWF {fee}. New balance: RWF {balance}"
            ),
            (Template::CashOut, false) => format!(
                "You have withdrawn RWF {amount} from {name} ({phone}) on {date} at {time}. Reference: {reference}. Fee charged: RWF {fee}. Available Balance: RWF {balance}"
            ),
            (Template::CashOut, true) => format!(
                "MoMo withdrawal completed. RWF {amount} to {name} ({phone}). Date: {date} {time}. Ref: {reference}. Fee: RWF {fee}. New balance: RWF {balance}"
            ),
            (Template::Payment, false) => format!(
                "You have paid RWF {amount} to {name} ({phone}) on {date} at {time}. Reference: {reference}. Fee charged: RWF {fee}. Available Balance: RWF {balance}"
            ),
            (Template::Payment, true) => format!(
                "Payment of RWF {amount} to {name} ({phone}) successful. Date: {date} {time}. Ref: {reference}. Fee: RWF {fee}. New balance: RWF {balance}"
            ),
            (Template::Transfer, false) => format!(
                "You have sent RWF {amount} to {name} ({phone}) on {date} at {time}. Reference: {reference}. Fee charged: RWF {fee}. Available Balance: RWF {balance}"
            ),
            (Template::Transfer, true) => format!(
                "Transfer of RWF {amount} to {name} ({phone}) completed. Date: {date} {time}. Ref: {reference}. Fee: RWF {fee}. New balance: RWF {balance}"
            ),
        }
    }
}

struct Fields<'a> {
    amount: i64,
    name: &'a str,
    phone: String,
    date: String,
    time: String,
    reference: String,
    fee: i64,
    balance: String,
}

/// Generator settings
#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub count: usize,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Fixed seed for reproducible output
    pub seed: Option<u64>,
    pub tz: Tz,
}

impl SampleConfig {
    pub fn new(count: usize, tz: Tz) -> Self {
        Self {
            count,
            start: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2023, 5, 31).unwrap_or_default(),
            seed: None,
            tz,
        }
    }
}

/// "1250000" -> "1,250,000"
pub fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn random_digits(rng: &mut impl Rng, k: usize) -> String {
    (0..k)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

fn random_phone(rng: &mut impl Rng) -> String {
    const PREFIXES: [&str; 8] = ["024", "054", "055", "027", "057", "026", "056", "030"];
    let prefix = PREFIXES.choose(rng).copied().unwrap_or("024");
    format!("{prefix}{}", random_digits(rng, 7))
}

fn random_datetime(rng: &mut impl Rng, start: NaiveDate, end: NaiveDate) -> NaiveDateTime {
    let span = (end - start).num_seconds().max(1);
    start.and_time(chrono::NaiveTime::MIN) + Duration::seconds(rng.random_range(0..span))
}

/// Generate `cfg.count` messages sorted by date, with epoch-millis `date` fields.
pub fn generate_messages(cfg: &SampleConfig) -> Result<Vec<RawMessage>> {
    if cfg.end <= cfg.start {
        bail!("sample end date {} must be after start {}", cfg.end, cfg.start);
    }

    let mut rng = match cfg.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let mut stamped: Vec<(NaiveDateTime, String)> = Vec::with_capacity(cfg.count);
    for i in 0..cfg.count {
        let when = random_datetime(&mut rng, cfg.start, cfg.end);
        let template = *TEMPLATES.choose(&mut rng).unwrap_or(&Template::CashIn);
        let name = template.names().choose(&mut rng).copied().unwrap_or("JOHN DOE");

        let amount: i64 = rng.random_range(10..=2000);
        let fee = if template == Template::CashIn { 0 } else { amount / 100 };
        let mut balance: i64 = if i == 0 { 1000 } else { rng.random_range(500..=5000) };
        if template == Template::CashIn {
            balance += amount;
        } else {
            balance -= amount + fee;
        }

        let fields = Fields {
            amount,
            name,
            phone: random_phone(&mut rng),
            date: when.format("%d/%m/%y").to_string(),
            time: when.format("%I:%M %p").to_string(),
            reference: format!("TX{}", random_digits(&mut rng, 9)),
            fee,
            balance: group_thousands(balance),
        };
        let short_form = rng.random_bool(0.5);
        stamped.push((when, template.render(short_form, &fields)));
    }
    stamped.sort_by_key(|(when, _)| *when);

    Ok(stamped
        .into_iter()
        .map(|(when, body)| {
            let millis = cfg
                .tz
                .from_local_datetime(&when)
                .earliest()
                .map(|dt| dt.timestamp_millis())
                .unwrap_or_else(|| when.and_utc().timestamp_millis());
            RawMessage::new(body)
                .with_date(millis.to_string())
                .with_address(SENDER)
        })
        .collect())
}

/// Render messages as an `<smses>` backup document.
pub fn to_sms_xml(messages: &[RawMessage]) -> String {
    let mut out = String::from("<?xml version='1.0' encoding='UTF-8' standalone='yes' ?>\n");
    out.push_str(&format!("<smses count=\"{}\">\n", messages.len()));
    for m in messages {
        out.push_str(&format!(
            "  <sms protocol=\"0\" address=\"{}\" type=\"1\"",
            escape(m.address.as_str())
        ));
        if let Some(date) = &m.date {
            out.push_str(&format!(" date=\"{}\"", escape(date.as_str())));
        }
        if let Some(body) = &m.body {
            out.push_str(&format!(" body=\"{}\"", escape(body.as_str())));
        }
        out.push_str(" />\n");
    }
    out.push_str("</smses>\n");
    out
}

/// Generate and write a sample backup, creating parent directories.
pub fn write_sample_xml(path: impl AsRef<Path>, cfg: &SampleConfig) -> Result<usize> {
    let path = path.as_ref();
    let messages = generate_messages(cfg)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(path, to_sms_xml(&messages)).with_context(|| format!("write {}", path.display()))?;
    Ok(messages.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{parse_sms_xml, read_messages};
    use momo_core::time::{DEFAULT_TIMEZONE, parse_timezone};

    fn cfg(count: usize) -> SampleConfig {
        let mut c = SampleConfig::new(count, parse_timezone(DEFAULT_TIMEZONE).unwrap());
        c.seed = Some(7);
        c
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1_250_000), "1,250,000");
        assert_eq!(group_thousands(-4500), "-4,500");
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let a = generate_messages(&cfg(20)).unwrap();
        let b = generate_messages(&cfg(20)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 20);
        assert!(a.iter().all(|m| m.body.as_deref().is_some_and(|b| b.contains("RWF"))));
    }

    #[test]
    fn test_sorted_by_date() {
        let msgs = generate_messages(&cfg(30)).unwrap();
        let stamps: Vec<i64> = msgs
            .iter()
            .map(|m| m.date.as_deref().unwrap().parse().unwrap())
            .collect();
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_xml_round_trip() {
        let msgs = generate_messages(&cfg(10)).unwrap();
        let parsed = parse_sms_xml(&to_sms_xml(&msgs)).unwrap();
        assert_eq!(parsed, msgs);
    }

    #[test]
    fn test_write_sample_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw").join("generated_sms_data.xml");
        assert_eq!(write_sample_xml(&path, &cfg(5)).unwrap(), 5);
        assert_eq!(read_messages(&path).unwrap().len(), 5);
    }

    #[test]
    fn test_rejects_inverted_range() {
        let mut c = cfg(1);
        std::mem::swap(&mut c.start, &mut c.end);
        assert!(generate_messages(&c).is_err());
    }
}
