use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

/// Hours subtracted from "now" before comparing against a stored expiry.
/// A mapping is refused only once `expiry < now - EXPIRY_OFFSET_HOURS`.
pub const EXPIRY_OFFSET_HOURS: i64 = 8;

pub const MALFORMED_EXPIRY: &str = "date input malformed, please use ISO 8601";

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO-8601 expiry. Values without an offset are taken as UTC.
pub fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Oldest expiry timestamp still allowed to redirect at `now`.
pub fn expiry_cutoff(now: DateTime<Utc>) -> i64 {
    (now - Duration::hours(EXPIRY_OFFSET_HOURS)).timestamp()
}

pub fn is_expired(expiry: Option<i64>, now: DateTime<Utc>) -> bool {
    expiry.is_some_and(|e| e < expiry_cutoff(now))
}
