//! Telemetry record sources.
//!
//! A source turns an unbounded text stream into discrete [`SampleRecord`]s and
//! hands the most recent one to the render loop. Ingestion runs on a tokio
//! task and never waits for rendering; the render loop polls.

mod accumulator;
mod channel;
mod stream;
mod telemetry;

pub use accumulator::{RecordAccumulator, MAX_BUFFERED_BYTES};
pub use channel::ChannelSource;
pub use stream::{ingest, StreamEnd, StreamSource};
pub use telemetry::{SamplerError, SamplerState, TelemetryCommand, TelemetrySampler};

use std::fmt::Debug;

/// One delimited block of telemetry output covering one reporting interval.
///
/// The text is not validated; any subset of the expected metrics may be
/// missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleRecord(String);

impl SampleRecord {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn text(&self) -> &str {
        &self.0
    }
}

impl From<String> for SampleRecord {
    fn from(text: String) -> Self {
        Self(text)
    }
}

/// Trait for receiving sample records from a telemetry stream.
///
/// # Example
///
/// ```
/// use powerwatch::source::{ChannelSource, RecordSource, SampleRecord};
///
/// let (tx, mut source) = ChannelSource::create("test");
/// assert!(source.poll().is_none());
///
/// tx.send_replace(Some(SampleRecord::new("CPU Power: 1 mW\n")));
/// assert_eq!(source.poll().unwrap().text(), "CPU Power: 1 mW\n");
/// ```
pub trait RecordSource: Send + Debug {
    /// Take the latest record if one arrived since the previous poll.
    ///
    /// Never blocks. Records that were overwritten before being polled are
    /// gone.
    fn poll(&mut self) -> Option<SampleRecord>;

    /// Human-readable description of where records come from.
    fn description(&self) -> &str;

    /// Why the source stopped, if it stopped abnormally.
    fn error(&self) -> Option<&str>;

    /// True once no further records can arrive.
    fn is_closed(&self) -> bool;
}
