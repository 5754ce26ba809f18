//! Utility functions

use crate::constants::{APP_NAME, BLANK_LABEL};
use std::path::PathBuf;

/// Get the app data directory (settings, logs)
pub fn get_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Format bytes into human-readable string (B, KB, MB)
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Format a number the way the data file stores floats: whole numbers keep
/// one decimal place ("100.0"), others use the shortest exact form.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// Display label for a filter value
pub fn value_label(value: &str) -> &str {
    if value.is_empty() {
        BLANK_LABEL
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(100.0), "100.0");
        assert_eq!(format_number(0.0), "0.0");
        assert_eq!(format_number(12.34), "12.34");
        assert_eq!(format_number(-0.0001), "-0.0001");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_value_label() {
        assert_eq!(value_label(""), "(blank)");
        assert_eq!(value_label("Alpha"), "Alpha");
    }
}
