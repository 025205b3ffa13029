//! Display formatting for published time values

use std::time::Duration;

use chrono::{DateTime, Datelike, TimeZone, Timelike};

use crate::LapRecord;

/// Stopwatch elapsed reading as `HH:MM:SS.cc`
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let centis = elapsed.subsec_millis() / 10;
    format!(
        "{:02}:{:02}:{:02}.{:02}",
        secs / 3600,
        secs % 3600 / 60,
        secs % 60,
        centis
    )
}

/// Short `MM:SS.cc` form used for lap entries
pub fn format_split(split: Duration) -> String {
    let secs = split.as_secs();
    let centis = split.subsec_millis() / 10;
    format!("{:02}:{:02}.{:02}", secs / 60, secs % 60, centis)
}

/// Lap entry as `Lap N: split (cumulative)`
pub fn format_lap(lap: &LapRecord) -> String {
    format!(
        "Lap {}: {} ({})",
        lap.index,
        format_split(lap.split),
        format_split(lap.cumulative)
    )
}

/// Countdown reading as `HH:MM:SS`
pub fn format_remaining(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, secs % 3600 / 60, secs % 60)
}

/// Wall-clock reading as `HH:MM:SS`
pub fn format_wall<Tz: TimeZone>(at: &DateTime<Tz>) -> String {
    format!("{:02}:{:02}:{:02}", at.hour(), at.minute(), at.second())
}

/// Calendar date as `YYYY-MM-DD Weekday`
pub fn format_date<Tz: TimeZone>(at: &DateTime<Tz>) -> String {
    format!(
        "{:04}-{:02}-{:02} {}",
        at.year(),
        at.month(),
        at.day(),
        at.weekday()
    )
}
