//! Human-readable dates for meeting cards and briefs.

use std::fmt::Display;

use chrono::{DateTime, Datelike, TimeZone, Utc};

const MINUTES_IN_DAY: i64 = 1440;
const MINUTES_IN_MONTH: i64 = 43200;

/// `1st`, `2nd`, `3rd`, `4th`, `11th`, `22nd`...
pub fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

/// `Wednesday, March 20th, 2025`
pub fn format_long_date<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    format!(
        "{}, {} {}, {}",
        dt.format("%A"),
        dt.format("%B"),
        ordinal(dt.day()),
        dt.year()
    )
}

/// `3:00 PM`
pub fn format_clock<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    dt.format("%-I:%M %p").to_string()
}

/// `Wednesday, March 20th · 3:00 PM`
pub fn format_card_datetime<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    format!(
        "{}, {} {} · {}",
        dt.format("%A"),
        dt.format("%B"),
        ordinal(dt.day()),
        format_clock(dt)
    )
}

/// Distance between `dt` and `now` in words, with an "in"/"ago" suffix.
///
/// Thresholds follow date-fns `formatDistance`.
pub fn relative_to(dt: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (dt - now).num_seconds();
    let distance = distance_in_words(seconds.abs());

    if seconds >= 0 {
        format!("in {distance}")
    } else {
        format!("{distance} ago")
    }
}

fn distance_in_words(seconds: i64) -> String {
    let minutes = (seconds as f64 / 60.0).round() as i64;

    if minutes == 0 {
        return "less than a minute".to_string();
    }
    if minutes < 45 {
        return plural(minutes, "minute");
    }
    if minutes < 90 {
        return "about 1 hour".to_string();
    }
    if minutes < MINUTES_IN_DAY {
        let hours = (minutes as f64 / 60.0).round() as i64;
        return format!("about {}", plural(hours, "hour"));
    }
    if minutes < 2520 {
        return "1 day".to_string();
    }
    if minutes < MINUTES_IN_MONTH {
        let days = (minutes as f64 / MINUTES_IN_DAY as f64).round() as i64;
        return plural(days, "day");
    }
    if minutes < 2 * MINUTES_IN_MONTH {
        let months = (minutes as f64 / MINUTES_IN_MONTH as f64).round() as i64;
        return format!("about {}", plural(months, "month"));
    }

    let months = minutes / MINUTES_IN_MONTH;
    if months < 12 {
        let nearest = (minutes as f64 / MINUTES_IN_MONTH as f64).round() as i64;
        return plural(nearest, "month");
    }

    let years = months / 12;
    let leftover = months % 12;
    if leftover < 3 {
        format!("about {}", plural(years, "year"))
    } else if leftover < 9 {
        format!("over {}", plural(years, "year"))
    } else {
        format!("almost {}", plural(years + 1, "year"))
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit}")
    } else {
        format!("{n} {unit}s")
    }
}
