//! Wall-clock and duration formatting.
//!
//! Line timestamps use the platform time zone (not UTC) via
//! [`jiff::Zoned::now`]. Durations measured on the monotonic clock are
//! rendered by [`format_duration`].

use std::fmt;

use jiff::Zoned;
use serde::Deserialize;

/// What the line timestamp shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimestampMode {
    /// `HH:MM:SS.mmm`
    #[default]
    Time,
    /// `YYYY-MM-DD HH:MM:SS.mmm`
    DateTime,
}

impl TimestampMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Time => "time",
            Self::DateTime => "dateTime",
        }
    }

    /// Parse `time` / `dateTime` (case-insensitive).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "time" => Some(Self::Time),
            "datetime" | "date_time" => Some(Self::DateTime),
            _ => None,
        }
    }
}

impl fmt::Display for TimestampMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Format a zoned instant for a log line (24-hour clock, milliseconds).
pub fn format_clock(now: &Zoned, mode: TimestampMode) -> String {
    match mode {
        TimestampMode::Time => now.strftime("%H:%M:%S%.3f").to_string(),
        TimestampMode::DateTime => now.strftime("%Y-%m-%d %H:%M:%S%.3f").to_string(),
    }
}

/// Current local time formatted for a log line.
pub fn local_clock(mode: TimestampMode) -> String {
    format_clock(&Zoned::now(), mode)
}

/// Current time as nanoseconds since the Unix epoch, with millisecond
/// precision (`ms × 1_000_000`), as a decimal string.
pub fn epoch_nanos_string() -> String {
    let millis = jiff::Timestamp::now().as_millisecond();
    format!("{}", i128::from(millis) * 1_000_000)
}

/// Render a millisecond duration as `1h 2m 3.004s`.
///
/// Hour and minute segments appear only when nonzero; the seconds segment
/// appears when seconds are nonzero or when there are neither hours nor
/// minutes, so the result is never empty.
pub fn format_duration(ms: u64) -> String {
    const MS_IN_SEC: u64 = 1000;
    const MS_IN_MIN: u64 = 60 * MS_IN_SEC;
    const MS_IN_HOUR: u64 = 60 * MS_IN_MIN;

    let hours = ms / MS_IN_HOUR;
    let minutes = (ms % MS_IN_HOUR) / MS_IN_MIN;
    let seconds = (ms % MS_IN_MIN) / MS_IN_SEC;
    let millis = ms % MS_IN_SEC;

    let mut parts: Vec<String> = Vec::with_capacity(3);
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    if seconds > 0 || (hours == 0 && minutes == 0) {
        parts.push(format!("{seconds}.{millis:03}s"));
    }
    parts.join(" ")
}

/// [`format_duration`] for a floating-point millisecond value (metrics
/// supplied by callers). Negative and non-finite values clamp to zero.
pub fn format_duration_f64(ms: f64) -> String {
    if !ms.is_finite() || ms <= 0.0 {
        return format_duration(0);
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let whole = ms.floor() as u64;
    format_duration(whole)
}
