//! Wall-clock helpers.

use std::time::{SystemTime, UNIX_EPOCH};

use time::OffsetDateTime;

/// Current time in epoch milliseconds, 0 if the clock is before the epoch.
#[must_use]
pub fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

/// `YYYY-MM-DD` (UTC) for an epoch-milliseconds instant.
///
/// Out-of-range instants clamp to the epoch date.
#[must_use]
pub fn date_stamp(ms: i64) -> String {
    let nanos = i128::from(ms) * 1_000_000;
    let date = OffsetDateTime::from_unix_timestamp_nanos(nanos).unwrap_or(OffsetDateTime::UNIX_EPOCH).date();
    format!("{:04}-{:02}-{:02}", date.year(), u8::from(date.month()), date.day())
}

#[cfg(test)]
#[path = "clock_test.rs"]
mod tests;
