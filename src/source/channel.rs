//! Single-slot holder for the latest sample record.
//!
//! The ingestion side overwrites the slot through a tokio watch sender; the
//! render loop polls it. Nothing queues, so a slow renderer only ever sees
//! the freshest record.

use tokio::sync::watch;

use super::{RecordSource, SampleRecord};

/// A record source backed by a watch channel.
///
/// # Example
///
/// ```
/// use powerwatch::source::{ChannelSource, RecordSource};
///
/// let (tx, source) = ChannelSource::create("powermetrics");
/// assert_eq!(source.description(), "powermetrics");
/// drop(tx);
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    receiver: watch::Receiver<Option<SampleRecord>>,
    description: String,
    closed: bool,
}

impl ChannelSource {
    pub fn new(receiver: watch::Receiver<Option<SampleRecord>>, source_description: &str) -> Self {
        Self {
            receiver,
            description: source_description.to_string(),
            closed: false,
        }
    }

    /// Create a slot and the source reading from it.
    ///
    /// Dropping every sender closes the source once its last record has been
    /// polled.
    pub fn create(source_description: &str) -> (watch::Sender<Option<SampleRecord>>, Self) {
        let (tx, rx) = watch::channel(None);
        (tx, Self::new(rx, source_description))
    }
}

impl RecordSource for ChannelSource {
    fn poll(&mut self) -> Option<SampleRecord> {
        if self.closed {
            return None;
        }

        let sender_gone = self.receiver.has_changed().is_err();
        let record = {
            let latest = self.receiver.borrow_and_update();
            if latest.has_changed() {
                latest.clone()
            } else {
                None
            }
        };

        if sender_gone {
            self.closed = true;
        }
        record
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        // Producers report their own failures
        None
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
