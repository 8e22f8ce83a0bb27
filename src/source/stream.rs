//! Stream-based record source.
//!
//! Drains an async byte stream into a [`RecordAccumulator`] and publishes
//! each completed record into a single-slot channel. The reader is always
//! drained promptly; rendering never applies back-pressure to it.

use std::sync::{Arc, OnceLock};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{ChannelSource, RecordAccumulator, RecordSource, SampleRecord};
use crate::shutdown::Shutdown;

/// Why [`ingest`] returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEnd {
    /// The stream reached end of file.
    Eof,
    /// The shutdown signal fired.
    Shutdown,
    /// Reading failed.
    Failed(String),
}

/// Read `reader` in chunks of at most `chunk_size` bytes until it ends or
/// `shutdown` fires, overwriting `slot` with every completed record.
pub async fn ingest<R>(
    mut reader: R,
    chunk_size: usize,
    slot: &watch::Sender<Option<SampleRecord>>,
    shutdown: &Shutdown,
) -> StreamEnd
where
    R: AsyncRead + Unpin,
{
    let mut accumulator = RecordAccumulator::new();
    let mut chunk = vec![0u8; chunk_size.max(1)];
    let mut records = 0u64;

    loop {
        tokio::select! {
            _ = shutdown.triggered() => return StreamEnd::Shutdown,
            read = reader.read(&mut chunk) => match read {
                Ok(0) => {
                    debug!(records, pending = accumulator.len(), "telemetry stream reached EOF");
                    return StreamEnd::Eof;
                }
                Ok(n) => {
                    if let Some(record) = accumulator.push(&chunk[..n]) {
                        records += 1;
                        slot.send_replace(Some(record));
                    }
                }
                Err(e) => return StreamEnd::Failed(format!("read error: {}", e)),
            },
        }
    }
}

/// A record source fed by a background task reading an async stream.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use powerwatch::{Shutdown, StreamSource};
///
/// # tokio_test::block_on(async {
/// let stream = Cursor::new(b"CPU Power: 1234 mW\n".to_vec());
/// let source = StreamSource::spawn(stream, "example", 4096, Shutdown::new());
/// # });
/// ```
#[derive(Debug)]
pub struct StreamSource {
    inner: ChannelSource,
    failure: Arc<OnceLock<String>>,
}

impl StreamSource {
    /// Spawn a task that ingests `reader` until it ends or `shutdown` fires.
    pub fn spawn<R>(reader: R, description: &str, chunk_size: usize, shutdown: Shutdown) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, inner) = ChannelSource::create(description);
        let failure = Arc::new(OnceLock::new());
        let task_failure = failure.clone();
        let desc = description.to_string();

        tokio::spawn(async move {
            match ingest(reader, chunk_size, &tx, &shutdown).await {
                StreamEnd::Eof => info!(source = %desc, "telemetry stream closed"),
                StreamEnd::Shutdown => debug!(source = %desc, "ingestion stopped by shutdown"),
                StreamEnd::Failed(message) => {
                    warn!(source = %desc, error = %message, "telemetry stream failed");
                    let _ = task_failure.set(message);
                }
            }
            // Dropping the sender closes the slot
            drop(tx);
        });

        Self { inner, failure }
    }
}

impl RecordSource for StreamSource {
    fn poll(&mut self) -> Option<SampleRecord> {
        self.inner.poll()
    }

    fn description(&self) -> &str {
        self.inner.description()
    }

    fn error(&self) -> Option<&str> {
        self.failure.get().map(String::as_str)
    }

    fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}
