/// Report time-window resolution.
///
/// Query parameters arrive as free-form strings. Date parsing here is
/// deliberately lenient: any value that fails to parse silently falls back
/// to the computed default window rather than failing the request. That
/// leniency is part of the endpoint contract; callers that care can log
/// the substitution.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;

/// A half-open query window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReportWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Hours in the default summary window when no explicit range is given.
const DEFAULT_WINDOW_HOURS: i64 = 24;

/// Resolves a window from optional raw `start`/`end` strings.
///
/// Defaults: `end` = now, `start` = end − 24 h. Each bound falls back to
/// its default independently when missing or unparsable.
pub fn resolve(start: Option<&str>, end: Option<&str>, now: DateTime<Utc>) -> ReportWindow {
    let end_dt = end.and_then(parse_timestamp).unwrap_or(now);
    let start_dt = start
        .and_then(parse_timestamp)
        .unwrap_or_else(|| end_dt - Duration::hours(DEFAULT_WINDOW_HOURS));
    ReportWindow { start: start_dt, end: end_dt }
}

/// Window covering the trailing `days` days up to `now`.
pub fn trailing_days(days: i64, now: DateTime<Utc>) -> ReportWindow {
    ReportWindow { start: now - Duration::days(days), end: now }
}

/// Parses a timestamp accepting RFC 3339, naive `YYYY-MM-DDTHH:MM:SS`
/// (with or without the `T`), and bare dates. Naive values are taken
/// as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }

    None
}

/// Lenient integer query parameter: missing, empty, or unparsable values
/// substitute the documented default.
pub fn parse_count(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(default)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
