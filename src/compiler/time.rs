//! Time-range bound parsing
//!
//! Accepted formats, tried in order:
//! 1. RFC 3339 with offset (`2024-01-01T10:00:00+02:00`)
//! 2. Offset-less timestamp, read as UTC (`2024-01-01T10:00:00`, `2024-01-01 10:00:00.5`)
//! 3. Bare date, read as midnight UTC (`2024-01-01`)
//!
//! Bounds are bound as millisecond text, so a bound with finer precision is
//! rejected rather than truncated.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
const DATE_FORMAT: &str = "%Y-%m-%d";

const NANOS_PER_MILLI: u32 = 1_000_000;

/// Parses a time bound, or `None` if no accepted format matches or the value
/// is more precise than a millisecond.
pub fn parse_time_bound(raw: &str) -> Option<DateTime<Utc>> {
    parse_any(raw.trim()).filter(|ts| ts.timestamp_subsec_nanos() % NANOS_PER_MILLI == 0)
}

fn parse_any(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
