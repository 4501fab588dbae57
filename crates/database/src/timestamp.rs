//! Timestamp formatting for stored rows.
//!
//! Timestamps are stored as fixed-width UTC strings with microsecond
//! precision so that lexical order in SQLite equals chronological order.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Storage format, e.g. `2024-05-01T09:30:00.000000Z`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// The current time in storage format.
pub fn now() -> String {
    format(Utc::now())
}

/// Format a UTC time in storage format.
pub fn format(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp.
pub fn parse(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}
