//! Display formatting shared by every collector.
//!
//! All helpers are pure functions. Units follow the report conventions:
//! gigabytes are binary (1024^3), percentages carry one decimal, frequencies
//! two, temperatures one.

use chrono::Duration;

/// Placeholder for values the host does not expose.
pub const NOT_AVAILABLE: &str = "N/A";

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Converts a byte count to gigabytes, e.g. `1073741824` -> `"1.00 GB"`.
pub fn bytes_to_gb(bytes: u64) -> String {
    format!("{:.2} GB", bytes as f64 / BYTES_PER_GB)
}

/// Converts a frequency in kilohertz (the cpufreq sysfs unit) to megahertz.
pub fn khz_to_mhz(khz: u64) -> f64 {
    khz as f64 / 1_000.0
}

/// Formats a frequency, `N/A` when absent or zero.
pub fn mhz(value: Option<f64>) -> String {
    match value {
        Some(v) if v > 0.0 => format!("{:.2} MHz", v),
        _ => NOT_AVAILABLE.to_string(),
    }
}

pub fn percent(value: f64) -> String {
    format!("{:.1}%", value)
}

/// `part / total * 100`, `None` for an empty total.
pub fn percent_of(part: u64, total: u64) -> Option<f64> {
    if total == 0 {
        None
    } else {
        Some(part as f64 / total as f64 * 100.0)
    }
}

pub fn celsius(value: f64) -> String {
    format!("{:.1}°C", value)
}

/// Formats an optional threshold; zero counts as "not reported".
pub fn optional_celsius(value: Option<f64>) -> String {
    match value {
        Some(v) if v != 0.0 => celsius(v),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Shortest round-trip decimal form, always with a fractional part
/// (`1.0`, `0.52`).
pub fn float_repr(value: f64) -> String {
    let shown = value.to_string();
    if value.is_finite() && !shown.contains('.') {
        format!("{}.0", shown)
    } else {
        shown
    }
}

/// Title-cases a string the way Python's `str.title` does: the first letter of
/// every run of letters is upper-cased, the rest lower-cased.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// Renders a duration as `[N day[s], ]H:MM:SS[.ffffff]`.
///
/// Negative durations (clock moved backwards) render as zero.
pub fn elapsed(duration: Duration) -> String {
    let total_micros = duration.num_microseconds().unwrap_or(i64::MAX).max(0);

    let micros = total_micros % 1_000_000;
    let total_secs = total_micros / 1_000_000;
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let secs = total_secs % 60;

    let mut out = String::new();
    if days > 0 {
        out.push_str(&format!(
            "{} day{}, ",
            days,
            if days == 1 { "" } else { "s" }
        ));
    }
    out.push_str(&format!("{}:{:02}:{:02}", hours, minutes, secs));
    if micros > 0 {
        out.push_str(&format!(".{:06}", micros));
    }
    out
}
