//! Application state for the render loop.

use crate::data::{DashboardFrame, TelemetrySnapshot};
use crate::source::{RecordSource, SampleRecord};
use crate::system::{StaticInfo, SystemHeader};
use crate::ui::Theme;

/// Main application state.
///
/// Owned by the render loop alone; the ingestion task only ever reaches it
/// through the record source.
pub struct App {
    source: Box<dyn RecordSource>,
    info: StaticInfo,

    /// Most recently built frame, `None` until the first record arrives.
    pub frame: Option<DashboardFrame>,
    /// Header shown above the metrics, also while waiting for data.
    pub system: Option<SystemHeader>,
    pub frames_built: u64,

    pub theme: Theme,
}

impl App {
    pub fn new(source: Box<dyn RecordSource>, info: StaticInfo, theme: Theme) -> Self {
        Self {
            source,
            info,
            frame: None,
            system: None,
            frames_built: 0,
            theme,
        }
    }

    /// Returns a description of the current record source.
    pub fn source_description(&self) -> &str {
        self.source.description()
    }

    pub fn source_error(&self) -> Option<&str> {
        self.source.error()
    }

    /// True once the source is closed and its last record has been taken.
    pub fn is_finished(&self) -> bool {
        self.source.is_closed()
    }

    /// Fetch the header if no frame has provided one yet.
    pub fn ensure_header(&mut self) {
        if self.system.is_none() {
            self.system = Some(self.info.system_header());
        }
    }

    /// Poll the record source for a new record.
    ///
    /// Returns true if a new frame was built.
    pub fn reload_data(&mut self) -> bool {
        let Some(record) = self.source.poll() else {
            return false;
        };

        let frame = self.build_frame(&record);
        self.system = Some(frame.system.clone());
        self.frame = Some(frame);
        self.frames_built += 1;
        true
    }

    /// Combine one record with freshly queried static info.
    pub fn build_frame(&mut self, record: &SampleRecord) -> DashboardFrame {
        DashboardFrame {
            system: self.info.system_header(),
            telemetry: TelemetrySnapshot::from_record(record.text()),
            memory: self.info.memory_usage(),
            swap_used_mb: self.info.swap_used_mb(),
        }
    }
}
