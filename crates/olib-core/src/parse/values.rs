//! Conversions for the human-readable values shown on upstream pages.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

static RELATIVE_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+|an?)\s+(second|minute|hour|day|week|month|year)s?\s+ago").unwrap()
});

static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+(?:\.[0-9]+)?").unwrap());

/// Parse a pull count such as `1.2M`, `35K` or `1,234`. Unparseable input is 0.
pub fn parse_pull_count(text: &str) -> u64 {
    let cleaned = text.trim().to_lowercase().replace(',', "");
    let (number, multiplier) = if let Some(n) = cleaned.strip_suffix('b') {
        (n, 1_000_000_000.0)
    } else if let Some(n) = cleaned.strip_suffix('m') {
        (n, 1_000_000.0)
    } else if let Some(n) = cleaned.strip_suffix('k') {
        (n, 1_000.0)
    } else {
        (cleaned.as_str(), 1.0)
    };
    number
        .trim()
        .parse::<f64>()
        .map(|n| (n * multiplier).round() as u64)
        .unwrap_or(0)
}

/// Parse a size such as `4.7GB` or `1.2 KB` into bytes (1024 based).
pub fn parse_size_bytes(text: &str) -> u64 {
    let upper = text.trim().to_uppercase();
    let Some(number) = NUMBER.find(&upper) else {
        return 0;
    };
    let Ok(value) = number.as_str().parse::<f64>() else {
        return 0;
    };
    let unit = upper[number.end()..].trim();
    let multiplier: f64 = match unit {
        u if u.starts_with("TB") || u.starts_with("TIB") => 1024f64.powi(4),
        u if u.starts_with("GB") || u.starts_with("GIB") => 1024f64.powi(3),
        u if u.starts_with("MB") || u.starts_with("MIB") => 1024f64.powi(2),
        u if u.starts_with("KB") || u.starts_with("KIB") => 1024.0,
        _ => 1.0,
    };
    (value * multiplier) as u64
}

/// Resolve a relative date (`3 days ago`, `yesterday`) against `now`.
///
/// Months count as 30 days and years as 365.
pub fn parse_relative_date(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let text = text.trim().to_lowercase();
    if text.contains("just now") || text.contains("moments ago") {
        return Some(now);
    }
    if text.contains("yesterday") {
        let midnight = now.date_naive().and_hms_opt(0, 0, 0)?.and_utc();
        return Some(midnight - Duration::days(1));
    }

    let caps = RELATIVE_DATE.captures(&text)?;
    let amount: i64 = match &caps[1] {
        "a" | "an" => 1,
        n => n.parse().ok()?,
    };
    let elapsed = match &caps[2] {
        "second" => Duration::try_seconds(amount),
        "minute" => Duration::try_minutes(amount),
        "hour" => Duration::try_hours(amount),
        "day" => Duration::try_days(amount),
        "week" => Duration::try_weeks(amount),
        "month" => amount.checked_mul(30).and_then(Duration::try_days),
        "year" => amount.checked_mul(365).and_then(Duration::try_days),
        _ => None,
    }?;
    now.checked_sub_signed(elapsed)
}

/// Parse the absolute timestamp upstream puts in `title` attributes,
/// e.g. `Apr 18, 2024 5:12 PM UTC`.
pub fn parse_absolute_date(text: &str) -> Option<DateTime<Utc>> {
    let trimmed = text.trim();
    let trimmed = trimmed.strip_suffix("UTC").unwrap_or(trimmed).trim();
    NaiveDateTime::parse_from_str(trimmed, "%b %d, %Y %I:%M %p")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Prefer the absolute title date, falling back to the relative text.
pub fn resolve_date(
    absolute: Option<&str>,
    relative: &str,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    absolute
        .and_then(parse_absolute_date)
        .or_else(|| parse_relative_date(relative, now))
}
