//! Human-readable renderings of whole-second durations.

use std::fmt::Write;

/// Formats seconds as a `HH:MM:SS` stopwatch readout.
///
/// Every field is zero-padded to two digits. Hours are not wrapped at 24.
pub fn format_clock(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Formats seconds in the compact log form, e.g. `1h 2m 3s`.
///
/// Zero hour and minute parts are omitted; seconds are shown when non-zero
/// or when nothing else would be.
pub fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    let mut output = String::new();
    if hours > 0 {
        let _ = write!(output, "{hours}h");
    }
    if minutes > 0 {
        if !output.is_empty() {
            output.push(' ');
        }
        let _ = write!(output, "{minutes}m");
    }
    if seconds > 0 || output.is_empty() {
        if !output.is_empty() {
            output.push(' ');
        }
        let _ = write!(output, "{seconds}s");
    }
    output
}
