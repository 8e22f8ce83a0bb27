//! Terminal UI rendering using ratatui.
//!
//! ## Submodules
//!
//! - [`dashboard`]: the single view (header, metric sections, waiting frame)
//! - [`screen`]: terminal ownership and idempotent cursor restore
//! - [`theme`]: light/dark theme support with terminal auto-detection
//!
//! ## Layout
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ Header (title, system, exit hint)    │
//! ├──────────────────────────────────────┤
//! │ CPU Metrics                          │
//! │ GPU Metrics                          │
//! │ Memory Metrics                       │
//! │ Power Metrics                        │
//! │   (or "Waiting for telemetry...")    │
//! └──────────────────────────────────────┘
//! ```

pub mod dashboard;
pub mod screen;
pub mod theme;

pub use screen::Screen;
pub use theme::Theme;
