//! The human-readable UTC timestamp attached to every message,
//! e.g. `Monday, 05-Feb-24 13:04:05 UTC`.

use chrono::{DateTime, NaiveDateTime, Utc};

pub const TIMESTAMP_FORMAT: &str = "%A, %d-%b-%y %H:%M:%S UTC";

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a message timestamp. RFC 3339 strings are accepted too, since
/// older clients stored those.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT)
        .map(|ndt| ndt.and_utc())
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw.trim())
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
        })
}
