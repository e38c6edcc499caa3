// Date parsing and formatting for the `date` filter.
// Formats use PHP `date()` letters so templates written for the web platform keep working.

use std::fmt::Write;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, Timelike, Utc};

/// Naive layouts accepted after RFC 3339 and RFC 2822. Naive values are UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parse a feed timestamp. Returns `None` for anything unrecognized.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Some(seconds) = value.strip_prefix('@') {
        return seconds
            .parse::<i64>()
            .ok()
            .and_then(|s| DateTime::from_timestamp(s, 0));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Format a timestamp with PHP `date()` letters. `\` escapes the next character.
pub fn format(dt: &DateTime<FixedOffset>, pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut chars = pattern.chars();

    while let Some(c) = chars.next() {
        // Writing to a String cannot fail
        let _ = match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
                Ok(())
            }
            // Day
            'd' => write!(out, "{:02}", dt.day()),
            'D' => write!(out, "{}", dt.format("%a")),
            'j' => write!(out, "{}", dt.day()),
            'l' => write!(out, "{}", dt.format("%A")),
            'N' => write!(out, "{}", dt.weekday().number_from_monday()),
            'S' => write!(out, "{}", ordinal_suffix(dt.day())),
            'w' => write!(out, "{}", dt.weekday().num_days_from_sunday()),
            'z' => write!(out, "{}", dt.ordinal0()),
            // Week
            'W' => write!(out, "{:02}", dt.iso_week().week()),
            // Month
            'F' => write!(out, "{}", dt.format("%B")),
            'm' => write!(out, "{:02}", dt.month()),
            'M' => write!(out, "{}", dt.format("%b")),
            'n' => write!(out, "{}", dt.month()),
            't' => write!(out, "{}", days_in_month(dt.year(), dt.month())),
            // Year
            'L' => write!(out, "{}", u8::from(is_leap_year(dt.year()))),
            'o' => write!(out, "{}", dt.iso_week().year()),
            'Y' => write!(out, "{}", dt.year()),
            'y' => write!(out, "{:02}", dt.year().rem_euclid(100)),
            // Time
            'a' => write!(out, "{}", if dt.hour() < 12 { "am" } else { "pm" }),
            'A' => write!(out, "{}", if dt.hour() < 12 { "AM" } else { "PM" }),
            'g' => write!(out, "{}", dt.hour12().1),
            'G' => write!(out, "{}", dt.hour()),
            'h' => write!(out, "{:02}", dt.hour12().1),
            'H' => write!(out, "{:02}", dt.hour()),
            'i' => write!(out, "{:02}", dt.minute()),
            's' => write!(out, "{:02}", dt.second()),
            'u' => write!(out, "{:06}", dt.nanosecond() / 1_000),
            'v' => write!(out, "{:03}", dt.nanosecond() / 1_000_000),
            // Timezone
            'e' | 'T' => write!(out, "{}", zone_name(dt.offset())),
            'P' => write!(out, "{}", dt.format("%:z")),
            'p' if dt.offset().local_minus_utc() == 0 => write!(out, "Z"),
            'p' => write!(out, "{}", dt.format("%:z")),
            'O' => write!(out, "{}", dt.format("%z")),
            'Z' => write!(out, "{}", dt.offset().local_minus_utc()),
            // Full date/time
            'c' => write!(out, "{}", dt.format("%Y-%m-%dT%H:%M:%S%:z")),
            'r' => write!(out, "{}", dt.format("%a, %d %b %Y %H:%M:%S %z")),
            'U' => write!(out, "{}", dt.timestamp()),
            other => {
                out.push(other);
                Ok(())
            }
        };
    }

    out
}

fn ordinal_suffix(day: u32) -> &'static str {
    match day {
        11..=13 => "th",
        _ => match day % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        },
    }
}

fn is_leap_year(year: i32) -> bool {
    NaiveDate::from_ymd_opt(year, 2, 29).is_some()
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

fn zone_name(offset: &FixedOffset) -> String {
    if offset.local_minus_utc() == 0 {
        "UTC".to_string()
    } else {
        offset.to_string()
    }
}
