//! FILETIME conversion and timestamp display helpers.
//!
//! The codec carries header timestamps as raw FILETIME ticks; conversion to
//! calendar time only happens here, for display.

use crate::error::{Error, Result};
use chrono::{DateTime, Datelike, Offset, TimeZone, Timelike, Utc, Weekday};
use chrono_tz::Tz;

/// 100-nanosecond intervals between 1601-01-01 and 1970-01-01
pub const FILETIME_EPOCH_DIFF: i128 = 116_444_736_000_000_000;

/// Convert FILETIME ticks to `DateTime<Utc>`; zero means "not set"
pub fn filetime_to_datetime(filetime: u64) -> Option<DateTime<Utc>> {
    if filetime == 0 {
        return None;
    }

    let ticks = filetime as i128 - FILETIME_EPOCH_DIFF;
    let secs = ticks.div_euclid(10_000_000) as i64;
    let nanos = (ticks.rem_euclid(10_000_000) * 100) as u32;
    DateTime::from_timestamp(secs, nanos)
}

/// Parse timezone string into a Tz object
/// Accepts "UTC" or UTC offset notation like "UTC+8", "UTC-5"
pub fn parse_timezone(timezone_str: &str) -> Result<Tz> {
    let invalid = || {
        Error::InvalidInput(format!(
            "Invalid timezone '{}'. Use 'UTC' or UTC offset notation like 'UTC+8'",
            timezone_str
        ))
    };

    let offset_part = timezone_str.strip_prefix("UTC").ok_or_else(invalid)?;
    if offset_part.is_empty() {
        return Ok(Tz::UTC);
    }

    let offset_hours: i32 = offset_part.parse().map_err(|_| invalid())?;
    if offset_hours == 0 {
        return Ok(Tz::UTC);
    }
    if !(-12..=14).contains(&offset_hours) {
        return Err(Error::InvalidInput(format!(
            "Unsupported UTC offset '{}'. Supported range is UTC-12 to UTC+14",
            timezone_str
        )));
    }

    // Etc/GMT zones use POSIX sign: Etc/GMT-8 is eight hours ahead of UTC
    let zone = if offset_hours > 0 {
        format!("Etc/GMT-{}", offset_hours)
    } else {
        format!("Etc/GMT+{}", -offset_hours)
    };
    zone.parse::<Tz>().map_err(|_| invalid())
}

/// Convert UTC datetime to specified timezone
pub fn convert_to_timezone(utc_dt: DateTime<Utc>, tz: Tz) -> DateTime<Tz> {
    utc_dt.with_timezone(&tz)
}

/// Format timestamp for human-readable output with timezone
pub fn format_timestamp_human<T: TimeZone>(dt: &DateTime<T>) -> String
where
    T::Offset: std::fmt::Display,
{
    let nanos = dt.nanosecond();
    let weekday = format_weekday(dt.weekday());
    let base_format = dt.format("%Y-%m-%d %H:%M:%S");
    let utc_offset = format_utc_offset(dt);

    format!("{} {}.{:07} {}", weekday, base_format, nanos / 100, utc_offset)
}

/// Render a FILETIME for display, "-" when unset
pub fn format_filetime(filetime: u64, tz: Tz) -> String {
    match filetime_to_datetime(filetime) {
        Some(dt) => format_timestamp_human(&convert_to_timezone(dt, tz)),
        None => "-".to_string(),
    }
}

/// Format weekday as three-letter abbreviation
fn format_weekday(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

/// Format UTC offset (e.g., "UTC+8", "UTC-10", "UTC", "UTC+5:30")
fn format_utc_offset<T: TimeZone>(dt: &DateTime<T>) -> String
where
    T::Offset: std::fmt::Display,
{
    let offset_seconds = dt.offset().fix().local_minus_utc();
    let offset_hours = offset_seconds / 3600;
    let offset_minutes = (offset_seconds.abs() % 3600) / 60;

    match (offset_hours, offset_minutes) {
        (0, 0) => "UTC".to_string(),
        (h, 0) if h > 0 => format!("UTC+{}", h),
        (h, 0) => format!("UTC{}", h),
        (h, m) if offset_seconds >= 0 => format!("UTC+{}:{:02}", h, m),
        (h, m) => format!("UTC-{}:{:02}", h.abs(), m),
    }
}
