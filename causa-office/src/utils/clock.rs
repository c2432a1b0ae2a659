use chrono::{DateTime, SecondsFormat, Utc};

/// Current instant as a fixed-width RFC 3339 string, so stored timestamps
/// sort lexicographically.
pub fn now_ts() -> String {
    format_ts(Utc::now())
}

pub fn format_ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse an RFC 3339 instant (any offset) and normalise it to UTC.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
