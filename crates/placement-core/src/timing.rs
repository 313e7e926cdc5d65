//! Duration formatting and attempt timing.

use chrono::{DateTime, Utc};

fn plural(n: u64, unit: &str) -> String {
    if n == 1 {
        format!("{n} {unit}")
    } else {
        format!("{n} {unit}s")
    }
}

/// Human-readable duration.
///
/// Under a minute reads as `"30 seconds"`, under an hour as `"2 minutes"` or
/// `"2m 30s"`, and longer spans as `"1h"`, `"2h 5m"`, `"2h 30s"` or
/// `"2h 5m 30s"`. Zero-valued components are omitted.
pub fn format_time(seconds: u64) -> String {
    if seconds < 60 {
        return plural(seconds, "second");
    }

    if seconds < 3600 {
        let minutes = seconds / 60;
        let secs = seconds % 60;
        return if secs == 0 {
            plural(minutes, "minute")
        } else {
            format!("{minutes}m {secs}s")
        };
    }

    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    let mut out = format!("{hours}h");
    if minutes > 0 {
        out.push_str(&format!(" {minutes}m"));
    }
    if secs > 0 {
        out.push_str(&format!(" {secs}s"));
    }
    out
}

/// Seconds left on an attempt. Negative once the attempt has overrun.
pub fn time_remaining(start: DateTime<Utc>, now: DateTime<Utc>, duration_secs: i64) -> i64 {
    duration_secs - (now - start).num_seconds()
}

/// `HH:MM:SS` clock. Hours are not wrapped at 24.
pub fn format_clock(seconds: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

/// Whole seconds between `start` and `end`, or 0 if `end` precedes `start`.
pub fn elapsed_secs(start: DateTime<Utc>, end: DateTime<Utc>) -> u64 {
    u64::try_from((end - start).num_seconds()).unwrap_or(0)
}
