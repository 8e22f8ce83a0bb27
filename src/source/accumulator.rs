//! Delimits raw stream chunks into sample records.

use tracing::warn;

use super::SampleRecord;

/// Upper bound on buffered bytes without a line terminator.
pub const MAX_BUFFERED_BYTES: usize = 1 << 20;

/// Accumulation buffer owned by the ingestion task.
///
/// A record is complete as soon as the buffer contains a line terminator
/// anywhere, not only at its end. The whole buffer then becomes the record
/// and is cleared, so bytes that arrived after the terminator in the same
/// chunk are dropped rather than carried into the next record.
///
/// # Example
///
/// ```
/// use powerwatch::source::RecordAccumulator;
///
/// let mut acc = RecordAccumulator::new();
/// assert!(acc.push(b"CPU Power: ").is_none());
/// let record = acc.push(b"1234 mW\nGPU").unwrap();
/// assert_eq!(record.text(), "CPU Power: 1234 mW\nGPU");
/// assert!(acc.is_empty());
/// ```
#[derive(Debug)]
pub struct RecordAccumulator {
    buffer: Vec<u8>,
    limit: usize,
}

impl Default for RecordAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordAccumulator {
    pub fn new() -> Self {
        Self::with_limit(MAX_BUFFERED_BYTES)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            buffer: Vec::new(),
            limit,
        }
    }

    /// Append a chunk and return a record if the buffer now holds a line
    /// terminator. Invalid UTF-8 is replaced.
    pub fn push(&mut self, chunk: &[u8]) -> Option<SampleRecord> {
        self.buffer.extend_from_slice(chunk);

        if self.buffer.iter().any(|&b| b == b'\n' || b == b'\r') {
            let text = String::from_utf8_lossy(&self.buffer).into_owned();
            self.buffer.clear();
            return Some(SampleRecord::from(text));
        }

        if self.buffer.len() > self.limit {
            warn!(
                buffered = self.buffer.len(),
                limit = self.limit,
                "no line terminator in telemetry stream, discarding buffer"
            );
            self.buffer.clear();
        }

        None
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
