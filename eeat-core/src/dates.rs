//! Date parsing and calendar-month arithmetic
//!
//! Pages express dates in many shapes: RFC 3339 in JSON-LD and Open Graph
//! tags, RFC 2822 in `Last-Modified` headers, bare `YYYY-MM-DD` in Dublin
//! Core tags and `DD.MM.YYYY` on German pages.

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Average Gregorian month length in days, used only when calendar math overflows
const AVG_DAYS_PER_MONTH: f64 = 30.436875;

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y"];

/// Parse a date string as found in meta tags, JSON-LD and `<time>` elements.
///
/// Values without an offset are taken as UTC. Returns `None` for anything
/// unrecognized instead of guessing.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // ISO 8601 with a colon-less offset, e.g. 2024-01-15T10:00:00+0100
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    for fmt in NAIVE_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|naive| Utc.from_utc_datetime(&naive));
        }
    }

    None
}

/// Number of calendar months between two instants.
///
/// Whole months are counted on the calendar (2024-01-15 to 2024-03-15 is
/// exactly 2.0), the remainder is the covered fraction of the next month.
/// Returns 0.0 when `end` is not after `start`.
pub fn months_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    if end <= start {
        return 0.0;
    }

    match calendar_months(start, end) {
        Some(months) => months,
        None => (end - start).num_seconds() as f64 / 86_400.0 / AVG_DAYS_PER_MONTH,
    }
}

fn calendar_months(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<f64> {
    let mut whole =
        (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32;
    let mut anchor = start.checked_add_months(Months::new(u32::try_from(whole).ok()?))?;

    // Day-of-month clamping can push the anchor past `end`
    while whole > 0 && anchor > end {
        whole -= 1;
        anchor = start.checked_add_months(Months::new(u32::try_from(whole).ok()?))?;
    }

    let next = start.checked_add_months(Months::new(u32::try_from(whole + 1).ok()?))?;
    let month_len = (next - anchor).num_seconds() as f64;
    if month_len <= 0.0 {
        return None;
    }
    let covered = (end - anchor).num_seconds() as f64;

    Some(whole as f64 + covered / month_len)
}
