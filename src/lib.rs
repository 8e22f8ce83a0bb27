//! # powerwatch
//!
//! A live terminal dashboard for Apple silicon: CPU cluster and GPU residency
//! and frequency, power draw, memory and swap, refreshed from a streaming
//! `powermetrics` process.
//!
//! ## Architecture
//!
//! Ingestion and rendering are two independent loops joined by a single-slot
//! holder for the newest record:
//!
//! ```text
//! ┌──────────────┐ chunks ┌──────────────────────┐ latest  ┌─────────────┐
//! │ powermetrics │───────▶│ ingest (tokio task)  │────────▶│ watch slot  │
//! │  (or stdin)  │        │  RecordAccumulator   │ record  │ (overwrite) │
//! └──────────────┘        └──────────────────────┘         └──────┬──────┘
//!                                    ▲                             │ poll every 250ms
//!                                    │ Shutdown                    ▼
//!                           ┌────────┴───────┐            ┌─────────────────┐
//!                           │ Ctrl+C handler │            │ render loop     │
//!                           └────────────────┘            │  App + Screen   │
//!                                                         └────────┬────────┘
//!                                                                  │
//!                                       ┌──────────────────────────┼───────────────┐
//!                                       ▼                          ▼               ▼
//!                                 data::metric               system::StaticInfo  ui::dashboard
//!                                 (extract)                  (sysctl, vm_stat,   (ratatui)
//!                                                             TtlCache)
//! ```
//!
//! - **[`source`]**: record delimiting, the watch slot, the telemetry
//!   subprocess ([`TelemetrySampler`]) and generic streams ([`StreamSource`])
//! - **[`data`]**: metric extraction and derived figures (combined power,
//!   memory usage, swap)
//! - **[`system`]**: one-shot commands and the TTL cache for slow queries
//! - **[`app`]**, **[`runner`]**, **[`ui`]**: render loop state, pacing and
//!   drawing
//! - **[`config`]**: layered settings
//!
//! ## Usage
//!
//! ```bash
//! # powermetrics needs root
//! sudo powerwatch
//!
//! # Read an existing powermetrics stream from stdin
//! sudo powermetrics -i 1000 --samplers cpu_power,gpu_power | powerwatch --stdin
//!
//! # Print one frame as JSON and exit
//! sudo powerwatch --json
//! ```
//!
//! ### As a library with a channel source
//!
//! ```
//! use std::time::Duration;
//! use powerwatch::config::CommandPaths;
//! use powerwatch::source::SampleRecord;
//! use powerwatch::system::{StaticInfo, SystemCommand};
//! use powerwatch::ui::Theme;
//! use powerwatch::{App, ChannelSource};
//!
//! let (tx, source) = ChannelSource::create("example");
//! let info = StaticInfo::new(
//!     Box::new(SystemCommand),
//!     CommandPaths::default(),
//!     Duration::from_secs(300),
//! );
//! let mut app = App::new(Box::new(source), info, Theme::dark());
//!
//! tx.send_replace(Some(SampleRecord::new("CPU Power: 1500 mW\nGPU Power: 800 mW\n")));
//! assert!(app.reload_data());
//! assert_eq!(app.frame.unwrap().telemetry.power.combined_watts(), 2.3);
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod runner;
pub mod shutdown;
pub mod source;
pub mod system;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use config::Settings;
pub use data::{DashboardFrame, Metric, MetricPattern, TelemetrySnapshot, Unit};
pub use runner::{first_frame, run_dashboard, ExitReason};
pub use shutdown::Shutdown;
pub use source::{
    ChannelSource, RecordSource, SampleRecord, SamplerError, SamplerState, StreamSource,
    TelemetryCommand, TelemetrySampler,
};
