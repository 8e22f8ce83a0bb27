//! Metric extraction and derived figures.
//!
//! This module turns raw sample records and one-shot query output into the
//! typed values a dashboard frame displays.
//!
//! ## Submodules
//!
//! - [`metric`]: label/value/unit tokenizer over free-form telemetry text
//! - [`power`]: CPU/GPU/ANE power and the combined figure
//! - [`memory`]: `vm_stat` page counts, memory usage and swap parsing
//! - [`frame`]: the per-frame model ([`DashboardFrame`]) and its sections
//! - [`units`]: fixed-precision formatting and duration parsing
//!
//! ## Data Flow
//!
//! ```text
//! SampleRecord (raw text)
//!        │
//!        ▼
//! TelemetrySnapshot::from_record()
//!        │
//!        ├──▶ ClusterUsage (E / P / GPU residency + frequency)
//!        │
//!        └──▶ PowerReadings (combined power)
//!                    │
//!                    ▼
//!              DashboardFrame  ◀── SystemHeader, MemoryUsage, swap
//! ```

pub mod frame;
pub mod memory;
pub mod metric;
pub mod power;
pub mod units;

pub use frame::{ClusterUsage, DashboardFrame, MetricRow, Section, TelemetrySnapshot};
pub use memory::{MemoryUsage, PageCounts};
pub use metric::{extract, Metric, MetricPattern, Unit};
pub use power::PowerReadings;
