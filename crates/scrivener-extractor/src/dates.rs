//! Calendar date validation
//!
//! Generated dates arrive in whatever form the provider felt like writing.
//! Dates canonicalize to `YYYY-MM-DD`, datetimes to RFC 3339 in UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Canonical `YYYY-MM-DD` form of a date, if it parses
pub fn normalize_date(raw: &str) -> Option<String> {
    parse(raw).map(|dt| dt.format("%Y-%m-%d").to_string())
}

/// Canonical RFC 3339 (UTC, second precision) form of a datetime, if it parses
///
/// A bare date is taken as midnight UTC.
pub fn normalize_datetime(raw: &str) -> Option<String> {
    parse(raw).map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
}

fn parse(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(naive) = DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
    {
        return Some(naive.and_utc());
    }
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
