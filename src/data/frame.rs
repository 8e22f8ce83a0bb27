//! Everything one dashboard frame shows, derived from a single sample record.

use serde::Serialize;

use super::memory::{format_swap, MemoryUsage};
use super::metric::{
    extract, Metric, MetricPattern, E_CLUSTER_FREQUENCY, E_CLUSTER_RESIDENCY, GPU_FREQUENCY,
    GPU_RESIDENCY, P_CLUSTER_FREQUENCY, P_CLUSTER_RESIDENCY,
};
use super::power::{watts, PowerReadings};
use super::units::{format_frequency, format_percent, format_watts, PLACEHOLDER};
use crate::system::SystemHeader;

/// Residency and frequency of one processor cluster (or the GPU).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ClusterUsage {
    pub residency: Option<Metric>,
    pub frequency: Option<Metric>,
}

impl ClusterUsage {
    fn extract(text: &str, residency: &MetricPattern, frequency: &MetricPattern) -> Self {
        Self {
            residency: extract(text, residency),
            frequency: extract(text, frequency),
        }
    }

    /// "45.67% @ 1020 MHz", or `None` when neither reading is present.
    pub fn summary(&self) -> Option<String> {
        if self.residency.is_none() && self.frequency.is_none() {
            return None;
        }
        let residency = self
            .residency
            .map_or_else(|| PLACEHOLDER.to_string(), |m| format_percent(m.value));
        let frequency = self
            .frequency
            .map_or_else(|| PLACEHOLDER.to_string(), |m| format_frequency(m.value));
        Some(format!("{} @ {}", residency, frequency))
    }
}

/// Metrics pulled from the telemetry stream for one record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    pub efficiency_cores: ClusterUsage,
    pub performance_cores: ClusterUsage,
    pub gpu: ClusterUsage,
    pub power: PowerReadings,
}

impl TelemetrySnapshot {
    pub fn from_record(text: &str) -> Self {
        Self {
            efficiency_cores: ClusterUsage::extract(
                text,
                &E_CLUSTER_RESIDENCY,
                &E_CLUSTER_FREQUENCY,
            ),
            performance_cores: ClusterUsage::extract(
                text,
                &P_CLUSTER_RESIDENCY,
                &P_CLUSTER_FREQUENCY,
            ),
            gpu: ClusterUsage::extract(text, &GPU_RESIDENCY, &GPU_FREQUENCY),
            power: PowerReadings::from_record(text),
        }
    }
}

/// One labelled line of a section. `None` renders as the placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricRow {
    pub label: &'static str,
    pub value: Option<String>,
}

impl MetricRow {
    fn new(label: &'static str, value: Option<String>) -> Self {
        Self { label, value }
    }
}

/// A titled group of rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: &'static str,
    pub rows: Vec<MetricRow>,
}

/// The full content of one rendered frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardFrame {
    pub system: SystemHeader,
    pub telemetry: TelemetrySnapshot,
    pub memory: MemoryUsage,
    pub swap_used_mb: f64,
}

impl DashboardFrame {
    pub fn sections(&self) -> Vec<Section> {
        let power = &self.telemetry.power;
        vec![
            Section {
                title: "CPU Metrics",
                rows: vec![
                    MetricRow::new("E-CORES Usage", self.telemetry.efficiency_cores.summary()),
                    MetricRow::new("P-CORES Usage", self.telemetry.performance_cores.summary()),
                ],
            },
            Section {
                title: "GPU Metrics",
                rows: vec![MetricRow::new("GPU Usage", self.telemetry.gpu.summary())],
            },
            Section {
                title: "Memory Metrics",
                rows: vec![
                    MetricRow::new("Memory Used", Some(self.memory.summary())),
                    MetricRow::new("Swap Used", Some(format_swap(self.swap_used_mb))),
                ],
            },
            Section {
                title: "Power Metrics",
                rows: vec![
                    MetricRow::new("CPU Power", watts(power.cpu).map(format_watts)),
                    MetricRow::new("GPU Power", watts(power.gpu).map(format_watts)),
                    MetricRow::new("ANE Power", watts(power.ane).map(format_watts)),
                    MetricRow::new("Combined Power", Some(format_watts(power.combined_watts()))),
                ],
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::PageCounts;
    use crate::system::CoreCounts;

    fn frame(text: &str) -> DashboardFrame {
        DashboardFrame {
            system: SystemHeader {
                chip: "Apple M2".to_string(),
                cores: CoreCounts {
                    efficiency: Some(4),
                    performance: Some(4),
                    gpu: Some(10),
                },
            },
            telemetry: TelemetrySnapshot::from_record(text),
            memory: MemoryUsage::compute(&PageCounts::default(), 16384, 8 << 30),
            swap_used_mb: 12.0,
        }
    }

    fn row<'a>(sections: &'a [Section], label: &str) -> &'a MetricRow {
        sections
            .iter()
            .flat_map(|s| s.rows.iter())
            .find(|r| r.label == label)
            .unwrap()
    }

    #[test]
    fn test_cluster_summary() {
        let text = "E-Cluster HW active frequency: 1020 MHz\n\
                    E-Cluster HW active residency:  45.67% (600 MHz: 12%)\n";
        let snapshot = TelemetrySnapshot::from_record(text);
        assert_eq!(
            snapshot.efficiency_cores.summary().as_deref(),
            Some("45.67% @ 1020 MHz")
        );
        assert_eq!(snapshot.performance_cores.summary(), None);
    }

    #[test]
    fn test_cluster_summary_partial() {
        let snapshot = TelemetrySnapshot::from_record("GPU HW active frequency: 389 MHz\n");
        assert_eq!(snapshot.gpu.summary().as_deref(), Some("N/A @ 389 MHz"));
    }

    #[test]
    fn test_sections_with_missing_metrics() {
        let sections = frame("CPU Power: 1500 mW\nGPU Power: 800 mW\n").sections();
        let titles: Vec<_> = sections.iter().map(|s| s.title).collect();
        assert_eq!(
            titles,
            vec!["CPU Metrics", "GPU Metrics", "Memory Metrics", "Power Metrics"]
        );

        assert_eq!(row(&sections, "CPU Power").value.as_deref(), Some("1.50 W"));
        assert_eq!(row(&sections, "GPU Power").value.as_deref(), Some("0.80 W"));
        assert_eq!(row(&sections, "ANE Power").value, None);
        assert_eq!(row(&sections, "Combined Power").value.as_deref(), Some("2.30 W"));
        assert_eq!(row(&sections, "E-CORES Usage").value, None);
        assert_eq!(row(&sections, "Swap Used").value.as_deref(), Some("12 MB"));
        assert_eq!(
            row(&sections, "Memory Used").value.as_deref(),
            Some("-8.00 GB used of 8.00 GB")
        );
    }

    #[test]
    fn test_frame_serializes() {
        let json = serde_json::to_value(frame("CPU Power: 1500 mW\n")).unwrap();
        assert_eq!(json["system"]["chip"], "Apple M2");
        assert_eq!(json["telemetry"]["power"]["cpu"]["value"], 1500.0);
        assert!(json["telemetry"]["power"]["ane"].is_null());
    }
}
