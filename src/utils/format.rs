//! Countdown formatting helpers

/// `m:ss` or `h:mm:ss` for a non-negative number of seconds
pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Like [`format_duration`] but keeps the sign, so overtime reads `-0:05`
pub fn format_time(seconds: i64) -> String {
    let formatted = format_duration(seconds.saturating_abs());
    if seconds < 0 {
        format!("-{}", formatted)
    } else {
        formatted
    }
}
