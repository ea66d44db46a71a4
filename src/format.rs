//! Formatting helpers for human-readable sizes, amounts and timestamps.

use chrono::NaiveDateTime;

/// Formats a byte count the way the file lists show it ("0 Bytes", "1.5 KB", "2.25 MB").
///
/// Values are rounded to at most two decimals with trailing zeros dropped.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    let (value, unit) = if bytes >= GB {
        (bytes as f64 / GB as f64, "GB")
    } else if bytes >= MB {
        (bytes as f64 / MB as f64, "MB")
    } else if bytes >= KB {
        (bytes as f64 / KB as f64, "KB")
    } else {
        return format!("{bytes} Bytes");
    };
    format!("{} {unit}", trim_decimals(value))
}

fn trim_decimals(value: f64) -> String {
    let s = format!("{value:.2}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Formats an amount in minor units (paise, cents) with its currency code.
#[must_use]
pub fn format_amount(minor_units: u64, currency: &str) -> String {
    format!("{currency} {}.{:02}", minor_units / 100, minor_units % 100)
}

/// Formats a server timestamp for tables, or "-" when absent.
#[must_use]
pub fn format_timestamp(ts: Option<NaiveDateTime>) -> String {
    ts.map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string())
}
