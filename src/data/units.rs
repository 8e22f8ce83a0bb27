//! Unit conversions and fixed-precision formatting.
//!
//! Every number shown on the dashboard goes through one of these helpers so
//! the precision rules live in one place: two decimals for watts and
//! gigabytes, none for megabytes and frequencies.

use std::time::Duration;

use anyhow::{bail, Result};

/// Bytes in one gigabyte as the dashboard counts them (binary, 1024^3).
pub const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Milliwatts in one watt.
pub const MILLIWATTS_PER_WATT: f64 = 1000.0;

/// Placeholder rendered for any metric missing from a sample.
pub const PLACEHOLDER: &str = "N/A";

/// Suffix to nanoseconds multiplier (longer suffixes first)
const DURATION_UNITS: &[(&str, f64)] = &[
    ("ns", 1.0),
    ("µs", 1_000.0),
    ("us", 1_000.0),
    ("ms", 1_000_000.0),
    ("s", 1_000_000_000.0),
];

/// Parse duration strings like "250ms", "300s", "1.5s".
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();

    for (suffix, multiplier) in DURATION_UNITS {
        if let Some(val_str) = s.strip_suffix(suffix) {
            let val: f64 = val_str.trim().parse()?;
            if !val.is_finite() || val < 0.0 {
                bail!("Duration must be a non-negative number: {}", s);
            }
            return Ok(Duration::from_nanos((val * multiplier) as u64));
        }
    }

    bail!("Unknown duration format: {}", s)
}

pub fn milliwatts_to_watts(milliwatts: f64) -> f64 {
    milliwatts / MILLIWATTS_PER_WATT
}

pub fn bytes_to_gb(bytes: f64) -> f64 {
    bytes / BYTES_PER_GB
}

/// "1.50 W"
pub fn format_watts(watts: f64) -> String {
    format!("{:.2} W", watts)
}

/// "31.25 GB"
pub fn format_gigabytes(gb: f64) -> String {
    format!("{:.2} GB", gb)
}

/// "1024 MB"
pub fn format_megabytes(mb: f64) -> String {
    format!("{:.0} MB", mb)
}

/// "1296 MHz"
pub fn format_frequency(mhz: f64) -> String {
    format!("{:.0} MHz", mhz)
}

/// Residency percentages keep the two decimals the telemetry source prints.
pub fn format_percent(percent: f64) -> String {
    format!("{:.2}%", percent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_milliseconds() {
        let d = parse_duration("250ms").unwrap();
        assert_eq!(d, Duration::from_millis(250));
    }

    #[test]
    fn test_parse_seconds() {
        let d = parse_duration("300s").unwrap();
        assert_eq!(d, Duration::from_secs(300));

        let d = parse_duration("1.5s").unwrap();
        assert_eq!(d, Duration::from_millis(1500));
    }

    #[test]
    fn test_parse_microseconds() {
        assert_eq!(parse_duration("16µs").unwrap().as_nanos(), 16_000);
        assert_eq!(parse_duration("16us").unwrap().as_nanos(), 16_000);
    }

    #[test]
    fn test_parse_rejects_unknown_and_negative() {
        assert!(parse_duration("5 minutes").is_err());
        assert!(parse_duration("-1s").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn test_fixed_precision() {
        assert_eq!(format_watts(milliwatts_to_watts(2300.0)), "2.30 W");
        assert_eq!(format_gigabytes(32.0), "32.00 GB");
        assert_eq!(format_megabytes(1023.6), "1024 MB");
        assert_eq!(format_megabytes(0.0), "0 MB");
        assert_eq!(format_frequency(1296.0), "1296 MHz");
        assert_eq!(format_percent(45.678), "45.68%");
    }

    #[test]
    fn test_bytes_to_gb() {
        assert_eq!(bytes_to_gb(34_359_738_368.0), 32.0);
    }
}
