//! MoMo SMS notification parser
//!
//! Turns one free-form notification body into a [`Transaction`]. Typical input:
//!   You have received RWF 500000 from JOHN DOE (0244123456) on 01/05/23 at
//!   08:15 AM. Reference: TX123456789. Fee charged: RWF 0. Available Balance: ...
//!
//! Every field is best-effort: an unmatched amount becomes 0.0, an unmatched
//! phone or reference stays `None`. Only a message without a body fails.

use anyhow::Result;
use chrono_tz::Tz;
use regex::Regex;
use tracing::debug;

use momo_core::time::{now_local, resolve_timestamp};
use momo_core::{
    Categorizer, ExtractionError, ExtractionFailure, RawMessage, Transaction, TransactionType,
};

/// Checked before CASH_OUT, so "paid" resolves to CASH_IN.
pub const CASH_IN_KEYWORDS: &[&str] = &["received", "cash in", "payment received", "paid"];
pub const CASH_OUT_KEYWORDS: &[&str] = &["withdrew", "cash out", "paid", "payment"];

const AMOUNT_PATTERNS: &[&str] = &[
    r"(?i)RWF\s*([\d,.]+)",
    r"(?i)([\d,.]+)\s*RWF",
    r"(?i)amount[:\s]*RWF\s*([\d,.]+)",
    r"(?i)amount[:\s]*([\d,.]+)",
    r"(?i)([\d,.]+)\s*francs",
];

// Word boundaries keep `ref` out of "Reference" and `id` out of "paid".
const REFERENCE_PATTERNS: &[&str] = &[
    r"(?i)\bref\b[:\s]*(\w+)",
    r"(?i)\breference\b[:\s]*(\w+)",
    r"(?i)\bid\b[:\s]*(\w+)",
];

const PHONE_PATTERN: &str = r"(?:\+|0)[\d\s]{9,}";

/// Ordered (pattern, converter) pairs; the first pattern whose capture
/// converts successfully wins. A failed conversion moves on to the next pattern.
#[derive(Debug, Clone)]
pub struct FallbackChain<T> {
    rules: Vec<(Regex, fn(&str) -> Option<T>)>,
}

impl<T> FallbackChain<T> {
    pub fn new(patterns: &[&str], convert: fn(&str) -> Option<T>) -> Result<Self> {
        let rules = patterns
            .iter()
            .map(|p| Ok((Regex::new(p)?, convert)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn first_match(&self, text: &str) -> Option<T> {
        self.rules.iter().find_map(|(re, convert)| {
            let caps = re.captures(text)?;
            convert(caps.get(1)?.as_str())
        })
    }
}

/// Strip grouping commas and parse. "1,250.50" -> 1250.5, "." -> None.
pub fn parse_amount(raw: &str) -> Option<f64> {
    raw.replace(',', "").parse::<f64>().ok()
}

fn owned_token(raw: &str) -> Option<String> {
    Some(raw.to_string())
}

/// Keyword-driven direction. Order matters: CASH_IN wins on shared keywords.
pub fn classify_type(lower_body: &str) -> TransactionType {
    let hits = |keywords: &[&str]| keywords.iter().any(|k| lower_body.contains(k));
    if hits(CASH_IN_KEYWORDS) {
        TransactionType::CashIn
    } else if hits(CASH_OUT_KEYWORDS) {
        TransactionType::CashOut
    } else {
        TransactionType::Other
    }
}

/// Extracts transactions from MoMo notification bodies.
#[derive(Debug, Clone)]
pub struct SmsExtractor {
    amounts: FallbackChain<f64>,
    references: FallbackChain<String>,
    phone: Regex,
    categorizer: Categorizer,
    tz: Tz,
}

impl SmsExtractor {
    pub fn new(categorizer: Categorizer, tz: Tz) -> Result<Self> {
        Ok(Self {
            amounts: FallbackChain::new(AMOUNT_PATTERNS, parse_amount)?,
            references: FallbackChain::new(REFERENCE_PATTERNS, owned_token)?,
            phone: Regex::new(PHONE_PATTERN)?,
            categorizer,
            tz,
        })
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// First amount pattern that yields a number, else 0.0
    pub fn extract_amount(&self, body: &str) -> f64 {
        self.amounts.first_match(body).unwrap_or(0.0)
    }

    pub fn extract_phone(&self, body: &str) -> Option<String> {
        self.phone
            .find(body)
            .map(|m| m.as_str().trim().to_string())
            .filter(|p| !p.is_empty())
    }

    pub fn extract_reference(&self, body: &str) -> Option<String> {
        self.references.first_match(body)
    }

    /// Parse one message. Fails only when the message has no body.
    pub fn extract(&self, message: &RawMessage) -> Result<Transaction, ExtractionFailure> {
        let Some(body) = message.body.as_deref() else {
            return Err(ExtractionFailure {
                message: message.clone(),
                error: ExtractionError::MissingField("body"),
            });
        };

        let date = resolve_timestamp(message.date.as_deref(), self.tz);
        let amount = self.extract_amount(body);
        let lower = body.to_lowercase();
        let kind = classify_type(&lower);
        let phone = self.extract_phone(body);
        let reference = self.extract_reference(body);
        let category = self.categorizer.categorize(&lower);

        debug!(
            amount,
            kind = %kind,
            category = %category,
            has_phone = phone.is_some(),
            has_reference = reference.is_some(),
            "extracted transaction"
        );

        Ok(Transaction {
            date,
            description: body.to_string(),
            amount,
            kind,
            category,
            phone,
            reference,
            processed_at: now_local(self.tz),
        })
    }
}
