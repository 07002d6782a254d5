//! Timestamp and freshness utilities

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

/// Age (hours) up to which a source counts as fully fresh
pub const FULLY_FRESH_HOURS: i64 = 24;

/// Freshness never decays below this floor
pub const FRESHNESS_FLOOR: f64 = 0.5;

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Parse a stored timestamp
///
/// Accepts RFC 3339 (what this workspace writes) and the naive
/// `YYYY-MM-DD HH:MM:SS[.f]` form SQLite's `datetime('now')` produces,
/// which is interpreted as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Freshness decay function
///
/// - age <= 24h: 1.0
/// - 24h < age <= `max_age`: linear decay from 1.0 down to 0.5
/// - age > `max_age`: 0.5
///
/// Timestamps in the future count as age zero.
pub fn freshness_score(timestamp: DateTime<Utc>, now: DateTime<Utc>, max_age: Duration) -> f64 {
    let age = now - timestamp;
    let fresh_window = Duration::hours(FULLY_FRESH_HOURS);

    if age <= fresh_window {
        return 1.0;
    }
    if age > max_age || max_age <= fresh_window {
        return FRESHNESS_FLOOR;
    }

    let decay_span = (max_age - fresh_window).num_milliseconds() as f64;
    let into_decay = (age - fresh_window).num_milliseconds() as f64;
    let score = 1.0 - (1.0 - FRESHNESS_FLOOR) * (into_decay / decay_span);

    score.clamp(FRESHNESS_FLOOR, 1.0)
}
