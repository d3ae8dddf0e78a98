//! Human-readable formatting helpers for views

use chrono::{DateTime, Utc};

const KIB: u64 = 1024;
const MIB: u64 = 1024 * 1024;

/// Format a byte count, e.g. `512 bytes`, `1.50 KB`, `2.34 MB`
pub fn format_file_size(size_in_bytes: u64) -> String {
    if size_in_bytes < KIB {
        format!("{} bytes", size_in_bytes)
    } else if size_in_bytes < MIB {
        format!("{:.2} KB", size_in_bytes as f64 / KIB as f64)
    } else {
        format!("{:.2} MB", size_in_bytes as f64 / MIB as f64)
    }
}

/// Format an RFC 3339 timestamp for display; unparseable input is returned as-is
pub fn format_timestamp(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => ts
            .with_timezone(&Utc)
            .format("%-d %B %Y at %H:%M")
            .to_string(),
        Err(_) => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size_bytes() {
        assert_eq!(format_file_size(0), "0 bytes");
        assert_eq!(format_file_size(1023), "1023 bytes");
    }

    #[test]
    fn test_format_file_size_kilobytes() {
        assert_eq!(format_file_size(1024), "1.00 KB");
        assert_eq!(format_file_size(1536), "1.50 KB");
    }

    #[test]
    fn test_format_file_size_megabytes() {
        assert_eq!(format_file_size(1024 * 1024), "1.00 MB");
        assert_eq!(format_file_size(10 * 1024 * 1024), "10.00 MB");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(
            format_timestamp("2026-03-05T14:07:00.000Z"),
            "5 March 2026 at 14:07"
        );
        assert_eq!(format_timestamp("yesterday"), "yesterday");
    }
}
