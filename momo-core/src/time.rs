//! Time utilities: epoch conversion and wall-clock readings in a configured timezone.

use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;

/// Timezone used when nothing else is configured (MoMo RWF statements).
pub const DEFAULT_TIMEZONE: &str = "Africa/Kigali";

/// Parse an IANA timezone name like "Africa/Kigali".
pub fn parse_timezone(tz: &str) -> Result<Tz> {
    tz.parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))
}

/// Convert milliseconds since the Unix epoch into local calendar time.
///
/// Returns `None` when the value is outside chrono's representable range.
pub fn from_epoch_millis(millis: i64, tz: Tz) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(millis).map(|dt| dt.with_timezone(&tz).naive_local())
}

/// Current wall-clock time in `tz`, without the offset.
pub fn now_local(tz: Tz) -> NaiveDateTime {
    Utc::now().with_timezone(&tz).naive_local()
}

/// Resolve a raw SMS `date` attribute into a calendar timestamp.
///
/// Integer millis convert directly; anything absent or unparsable falls back
/// to the current time. Never fails.
pub fn resolve_timestamp(raw: Option<&str>, tz: Tz) -> NaiveDateTime {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .and_then(|millis| from_epoch_millis(millis, tz))
        .unwrap_or_else(|| now_local(tz))
}
