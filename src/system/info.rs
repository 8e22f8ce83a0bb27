//! Static system information: chip, core counts, memory and swap.
//!
//! Everything here comes from one-shot commands. Only the GPU core count is
//! cached, because `system_profiler` takes seconds to answer; the other
//! queries are cheap enough to run for every frame.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use super::cache::TtlCache;
use super::command::CommandRunner;
use crate::config::CommandPaths;
use crate::data::memory::{parse_page_size, parse_swap_used_mb, MemoryUsage, PageCounts};
use crate::data::metric::labelled_value;

/// Physical core counts by performance tier, plus GPU cores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CoreCounts {
    pub efficiency: Option<u32>,
    pub performance: Option<u32>,
    pub gpu: Option<u32>,
}

impl fmt::Display for CoreCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = |c: Option<u32>| c.map_or_else(|| "?".to_string(), |c| c.to_string());
        write!(
            f,
            "cores: {}E+{}P+{}GPU",
            count(self.efficiency),
            count(self.performance),
            count(self.gpu)
        )
    }
}

/// The "System:" line of the header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemHeader {
    pub chip: String,
    pub cores: CoreCounts,
}

impl fmt::Display for SystemHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.chip, self.cores)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum StaticKey {
    GpuCores,
}

/// Source of static system information, owned by the render loop.
pub struct StaticInfo {
    runner: Box<dyn CommandRunner>,
    commands: CommandPaths,
    cache: TtlCache<StaticKey, u32>,
    gpu_cores_ttl: Duration,
}

impl fmt::Debug for StaticInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticInfo")
            .field("commands", &self.commands)
            .field("gpu_cores_ttl", &self.gpu_cores_ttl)
            .finish_non_exhaustive()
    }
}

impl StaticInfo {
    pub fn new(
        runner: Box<dyn CommandRunner>,
        commands: CommandPaths,
        gpu_cores_ttl: Duration,
    ) -> Self {
        Self {
            runner,
            commands,
            cache: TtlCache::new(),
            gpu_cores_ttl,
        }
    }

    fn sysctl(&self, names: &[&str]) -> String {
        let mut args = vec!["-n"];
        args.extend_from_slice(names);
        self.runner.run(&self.commands.sysctl, &args)
    }

    /// CPU brand string, e.g. "Apple M2 Pro".
    pub fn chip_brand(&self) -> String {
        let brand = self.sysctl(&["machdep.cpu.brand_string"]);
        let brand = brand.trim();
        if brand.is_empty() {
            "Unknown".to_string()
        } else {
            brand.to_string()
        }
    }

    pub fn core_counts(&mut self) -> CoreCounts {
        let output = self.sysctl(&["hw.perflevel1.physicalcpu", "hw.perflevel0.physicalcpu"]);
        let mut lines = output.lines().map(|l| l.trim().parse::<u32>().ok());
        let efficiency = lines.next().flatten();
        let performance = lines.next().flatten();

        let runner = &self.runner;
        let profiler = self.commands.system_profiler.as_str();
        let gpu = self.cache.get_or_refresh(StaticKey::GpuCores, self.gpu_cores_ttl, || {
            parse_gpu_cores(&runner.run(profiler, &["SPDisplaysDataType"]))
        });

        CoreCounts {
            efficiency,
            performance,
            gpu,
        }
    }

    pub fn system_header(&mut self) -> SystemHeader {
        SystemHeader {
            chip: self.chip_brand(),
            cores: self.core_counts(),
        }
    }

    /// Memory usage from `vm_stat` page counts and `hw.memsize`.
    pub fn memory_usage(&self) -> MemoryUsage {
        let vm_stat = self.runner.run(&self.commands.vm_stat, &[]);
        let pages = PageCounts::parse_vm_stat(&vm_stat);
        let page_size = parse_page_size(&vm_stat)
            .or_else(|| parse_u64(&self.sysctl(&["hw.pagesize"])))
            .unwrap_or(0);
        let total_bytes = parse_u64(&self.sysctl(&["hw.memsize"])).unwrap_or(0);

        MemoryUsage::compute(&pages, page_size, total_bytes)
    }

    pub fn swap_used_mb(&self) -> f64 {
        parse_swap_used_mb(&self.sysctl(&["vm.swapusage"]))
    }
}

fn parse_u64(output: &str) -> Option<u64> {
    output.trim().parse().ok()
}

/// GPU core count from `system_profiler SPDisplaysDataType` output.
pub fn parse_gpu_cores(output: &str) -> Option<u32> {
    labelled_value(output, "Total Number of Cores")?.parse().ok()
}
