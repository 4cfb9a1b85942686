//! Mail date normalization
//!
//! Dates found in `Date:` headers come in many shapes: with or without a
//! weekday, with or without seconds, with a numeric offset, a zone name, a
//! trailing comment such as `(PST)`, or no zone at all. They are all brought
//! to a single UTC representation.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// Format of every normalized date.
pub const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const OFFSET_FORMATS: [&str; 4] = [
    "%d %b %Y %H:%M:%S %z",
    "%d %b %Y %H:%M %z",
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%dT%H:%M:%S%z",
];

const NAIVE_FORMATS: [&str; 6] = [
    "%d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%b %d %H:%M:%S %Y",
];

const WEEKDAYS: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

/// Normalize a raw `Date:` header value.
///
/// Returns the date in [`CANONICAL_DATE_FORMAT`], converted to UTC. Values no
/// recognized format accepts are returned trimmed but otherwise untouched.
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();

    match parse(trimmed) {
        Some(date) => date.format(CANONICAL_DATE_FORMAT).to_string(),
        None => trimmed.to_string(),
    }
}

/// Parse a mail date into UTC, if any known format matches.
pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
    let cleaned = collapse_whitespace(&strip_comments(raw));
    if cleaned.is_empty() {
        return None;
    }

    if let Ok(date) = DateTime::parse_from_rfc2822(&cleaned) {
        return Some(date.with_timezone(&Utc));
    }

    if let Ok(date) = DateTime::parse_from_rfc3339(&cleaned) {
        return Some(date.with_timezone(&Utc));
    }

    let without_weekday = strip_weekday(&cleaned);
    let (without_zone, zone) = split_zone_name(without_weekday);

    match zone {
        Some(name) => match zone_offset(name) {
            Some(offset) => parse_with_offset(&format!("{without_zone} {offset}")),
            None => parse_naive(without_zone),
        },
        None => parse_with_offset(without_zone).or_else(|| parse_naive(without_zone)),
    }
}

fn parse_with_offset(value: &str) -> Option<DateTime<Utc>> {
    OFFSET_FORMATS.iter().find_map(|format| {
        DateTime::parse_from_str(value, format)
            .ok()
            .map(|date| date.with_timezone(&Utc))
    })
}

fn parse_naive(value: &str) -> Option<DateTime<Utc>> {
    NAIVE_FORMATS.iter().find_map(|format| {
        NaiveDateTime::parse_from_str(value, format)
            .ok()
            .map(|naive| Utc.from_utc_datetime(&naive))
    })
}

/// Remove parenthesized comments, e.g. `-0800 (PST)`.
fn strip_comments(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut depth = 0usize;

    for c in value.chars() {
        match c {
            '(' => depth += 1,
            ')' if depth > 0 => depth -= 1,
            _ if depth == 0 => result.push(c),
            _ => {}
        }
    }

    result
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drop a leading `Mon, ` / `Monday ` style weekday.
fn strip_weekday(value: &str) -> &str {
    let Some((first, rest)) = value.split_once(' ') else {
        return value;
    };

    let word = first.trim_end_matches(',').to_ascii_lowercase();
    if word.len() >= 3 && WEEKDAYS.iter().any(|day| word.starts_with(day)) {
        rest.trim_start()
    } else {
        value
    }
}

/// Split off a trailing alphabetic zone name such as `GMT` or `EST`.
fn split_zone_name(value: &str) -> (&str, Option<&str>) {
    match value.rsplit_once(' ') {
        Some((head, last)) if !last.is_empty() && last.chars().all(|c| c.is_ascii_alphabetic()) => {
            (head, Some(last))
        }
        _ => (value, None),
    }
}

fn zone_offset(name: &str) -> Option<&'static str> {
    let offset = match name.to_ascii_uppercase().as_str() {
        "UT" | "UTC" | "GMT" | "Z" => "+0000",
        "EST" => "-0500",
        "EDT" => "-0400",
        "CST" => "-0600",
        "CDT" => "-0500",
        "MST" => "-0700",
        "MDT" => "-0600",
        "PST" => "-0800",
        "PDT" => "-0700",
        "CET" => "+0100",
        "CEST" => "+0200",
        "BST" => "+0100",
        "JST" => "+0900",
        _ => return None,
    };
    Some(offset)
}
