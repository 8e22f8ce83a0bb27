//! Memory and swap accounting.
//!
//! Page counts come from `vm_stat`, total memory from `sysctl hw.memsize`
//! and swap from `sysctl vm.swapusage`. The "used" figure follows a fixed
//! convention: app memory (active + wired) plus compressed plus file-backed
//! pages, reported as the difference to total physical memory.

use serde::Serialize;

use super::metric::labelled_value;
use super::units::{bytes_to_gb, format_gigabytes, format_megabytes};

/// Page counters read from one `vm_stat` report. Missing counters are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PageCounts {
    pub active: u64,
    pub wired: u64,
    pub compressed: u64,
    pub file_backed: u64,
}

impl PageCounts {
    /// Parse `vm_stat` output, e.g.
    ///
    /// ```text
    /// Mach Virtual Memory Statistics: (page size of 16384 bytes)
    /// Pages active:                           1000000.
    /// Pages wired down:                        500000.
    /// ```
    pub fn parse_vm_stat(output: &str) -> Self {
        let counter = |label: &str| {
            labelled_value(output, label)
                .and_then(|v| v.trim_end_matches('.').parse::<u64>().ok())
                .unwrap_or(0)
        };

        Self {
            active: counter("Pages active"),
            wired: counter("Pages wired down"),
            compressed: counter("Pages stored in compressor"),
            file_backed: counter("File-backed pages"),
        }
    }
}

/// Page size announced in the `vm_stat` header, if present.
pub fn parse_page_size(vm_stat_output: &str) -> Option<u64> {
    let (_, rest) = vm_stat_output.split_once("page size of ")?;
    rest.split_whitespace().next()?.parse().ok()
}

/// Derived memory figures for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MemoryUsage {
    /// App + compressed + file-backed memory, in GB.
    pub used_gb: f64,
    /// Installed physical memory, in GB.
    pub total_gb: f64,
    /// The displayed figure: `used_gb - total_gb`.
    pub reported_gb: f64,
}

impl MemoryUsage {
    pub fn compute(pages: &PageCounts, page_size: u64, total_bytes: u64) -> Self {
        let page_size = page_size as f64;
        let app_memory = (pages.active + pages.wired) as f64 * page_size;
        let compressed_memory = pages.compressed as f64 * page_size;
        let cached_memory = pages.file_backed as f64 * page_size;

        let used_gb = bytes_to_gb(app_memory + compressed_memory + cached_memory);
        let total_gb = bytes_to_gb(total_bytes as f64);

        Self {
            used_gb,
            total_gb,
            reported_gb: used_gb - total_gb,
        }
    }

    /// "X.XX GB used of Y.YY GB"
    pub fn summary(&self) -> String {
        format!(
            "{} used of {}",
            format_gigabytes(self.reported_gb),
            format_gigabytes(self.total_gb)
        )
    }
}

/// Used swap in megabytes from `sysctl -n vm.swapusage` output such as
/// `total = 2048.00M  used = 1024.50M  free = 1023.50M  (encrypted)`.
///
/// Anything unreadable counts as zero.
pub fn parse_swap_used_mb(output: &str) -> f64 {
    output
        .split_once("used = ")
        .and_then(|(_, rest)| rest.split_whitespace().next())
        .and_then(|token| token.strip_suffix('M'))
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|value| value.is_finite() && *value >= 0.0)
        .unwrap_or(0.0)
}

pub fn format_swap(used_mb: f64) -> String {
    format_megabytes(used_mb)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VM_STAT: &str = "\
Mach Virtual Memory Statistics: (page size of 16384 bytes)
Pages free:                                8000.
Pages active:                           1000000.
Pages inactive:                          300000.
Pages speculative:                         1200.
Pages throttled:                              0.
Pages wired down:                        500000.
Pages purgeable:                           1500.
\"Translation faults\":                 123456789.
Pages copy-on-write:                    4567890.
File-backed pages:                       100000.
Anonymous pages:                         900000.
Pages stored in compressor:              200000.
Pages occupied by compressor:             60000.
";

    #[test]
    fn test_parse_vm_stat() {
        let pages = PageCounts::parse_vm_stat(VM_STAT);
        assert_eq!(
            pages,
            PageCounts {
                active: 1_000_000,
                wired: 500_000,
                compressed: 200_000,
                file_backed: 100_000,
            }
        );
    }

    #[test]
    fn test_parse_vm_stat_missing_counters() {
        let pages = PageCounts::parse_vm_stat("Pages active: 12.\n");
        assert_eq!(pages.active, 12);
        assert_eq!(pages.wired, 0);
        assert_eq!(PageCounts::parse_vm_stat(""), PageCounts::default());
    }

    #[test]
    fn test_parse_page_size() {
        assert_eq!(parse_page_size(VM_STAT), Some(16384));
        assert_eq!(parse_page_size("Pages active: 1."), None);
    }

    #[test]
    fn test_memory_usage_is_reproducible() {
        let pages = PageCounts::parse_vm_stat(VM_STAT);
        let usage = MemoryUsage::compute(&pages, 16384, 34_359_738_368);

        // 1.8M pages * 16 KiB = 1_800_000 / 65_536 GB
        assert_eq!(usage.used_gb, 27.4658203125);
        assert_eq!(usage.total_gb, 32.0);
        assert_eq!(usage.reported_gb, 27.4658203125 - 32.0);
        assert_eq!(usage.summary(), "-4.53 GB used of 32.00 GB");
    }

    #[test]
    fn test_memory_usage_without_data() {
        let usage = MemoryUsage::compute(&PageCounts::default(), 0, 0);
        assert_eq!(usage.summary(), "0.00 GB used of 0.00 GB");
    }

    #[test]
    fn test_parse_swap() {
        let output = "total = 2048.00M  used = 1024.25M  free = 1023.75M  (encrypted)";
        assert_eq!(parse_swap_used_mb(output), 1024.25);
        assert_eq!(format_swap(parse_swap_used_mb(output)), "1024 MB");
    }

    #[test]
    fn test_parse_swap_unreadable() {
        assert_eq!(parse_swap_used_mb(""), 0.0);
        assert_eq!(parse_swap_used_mb("used = lots"), 0.0);
        assert_eq!(format_swap(0.0), "0 MB");
    }
}
