//! Raw SMS records as they come out of a message source

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

/// One SMS as read from the backup, before any interpretation.
///
/// `body` is optional because source records can lack it; such messages are
/// dead-lettered by the extractor rather than dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    #[serde(default)]
    pub body: Option<String>,
    /// Milliseconds since the Unix epoch, kept as found in the source
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub address: String,
}

impl RawMessage {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            ..Self::default()
        }
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Stamp {
    Text(String),
    Int(i64),
    Float(f64),
    Other(IgnoredAny),
}

/// JSON exports carry `date` as a string or a number. Any other value is
/// treated as absent so the extractor falls back to the current time.
fn lenient_timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Stamp>::deserialize(d)?.and_then(|s| match s {
        Stamp::Text(t) => Some(t),
        Stamp::Int(i) => Some(i.to_string()),
        Stamp::Float(f) => Some(f.to_string()),
        Stamp::Other(_) => None,
    }))
}

/// Converter output writes `null` for a missing sender.
fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_accepts_string_or_number() {
        let a: RawMessage =
            serde_json::from_str(r#"{"body":"hi","date":"1683014100000","address":"M-Money"}"#)
                .unwrap();
        let b: RawMessage = serde_json::from_str(r#"{"body":"hi","date":1683014100000}"#).unwrap();
        assert_eq!(a.date.as_deref(), Some("1683014100000"));
        assert_eq!(b.date, a.date);
        assert_eq!(b.address, "");
    }

    #[test]
    fn test_missing_body_and_null_date() {
        let m: RawMessage = serde_json::from_str(r#"{"date":null,"address":"x"}"#).unwrap();
        assert!(m.body.is_none());
        assert!(m.date.is_none());
    }

    #[test]
    fn test_null_address_and_odd_date() {
        let m: RawMessage =
            serde_json::from_str(r#"{"body":"RWF 5","date":true,"address":null}"#).unwrap();
        assert_eq!(m.address, "");
        assert!(m.date.is_none());
        assert_eq!(m.body.as_deref(), Some("RWF 5"));

        let m: RawMessage =
            serde_json::from_str(r#"{"body":"RWF 5","date":{"ms":1},"address":"M"}"#).unwrap();
        assert!(m.date.is_none());
    }
}
