//! The telemetry subprocess and its lifecycle.
//!
//! ```text
//!  Starting ──spawn ok──▶ Streaming ──EOF / shutdown / read error──▶ Terminated
//!     │                                                                ▲
//!     └─────────────────────────spawn failed───────────────────────────┘
//! ```

use std::collections::VecDeque;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, Command};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{ingest, ChannelSource, RecordSource, SampleRecord, StreamEnd};
use crate::shutdown::Shutdown;

/// Lines of the source's stderr kept for the failure message.
const STDERR_TAIL_LINES: usize = 5;

/// How long to wait for stderr to close once the source has exited.
const STDERR_DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

/// How to invoke the telemetry source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryCommand {
    pub program: String,
    pub sample_interval_ms: u64,
    pub samplers: Vec<String>,
}

impl Default for TelemetryCommand {
    fn default() -> Self {
        Self {
            program: "/usr/bin/powermetrics".to_string(),
            sample_interval_ms: 1000,
            samplers: vec!["cpu_power".to_string(), "gpu_power".to_string()],
        }
    }
}

impl TelemetryCommand {
    pub fn args(&self) -> Vec<String> {
        vec![
            "-i".to_string(),
            self.sample_interval_ms.to_string(),
            "--samplers".to_string(),
            self.samplers.join(","),
        ]
    }

    /// Command line as shown to the user, e.g. in the waiting frame.
    pub fn display(&self) -> String {
        format!("{} {}", self.program, self.args().join(" "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerState {
    Starting,
    Streaming,
    Terminated,
}

/// Fatal failures while starting the telemetry source.
#[derive(Debug, Error)]
pub enum SamplerError {
    #[error("failed to start telemetry source '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("telemetry source '{0}' has no standard output")]
    MissingOutput(String),
}

/// Owns the telemetry subprocess and exposes its records as a
/// [`RecordSource`].
///
/// A supervisor task drains the child's stdout, waits for the child once the
/// stream ends and kills it on shutdown. If the source exits unsuccessfully
/// on its own, the exit status and the tail of its stderr become
/// [`RecordSource::error`].
#[derive(Debug)]
pub struct TelemetrySampler {
    inner: ChannelSource,
    state: watch::Receiver<SamplerState>,
    failure: Arc<OnceLock<String>>,
}

impl TelemetrySampler {
    /// Spawn the telemetry source and start ingesting its output.
    ///
    /// Must be called from within a tokio runtime. Returns an error without
    /// ever entering [`SamplerState::Streaming`] if the process cannot be
    /// started.
    pub fn start(
        command: &TelemetryCommand,
        chunk_size: usize,
        shutdown: Shutdown,
    ) -> Result<Self, SamplerError> {
        let (state_tx, state) = watch::channel(SamplerState::Starting);
        let program = command.program.clone();

        let mut child = Command::new(&command.program)
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SamplerError::Spawn {
                program: program.clone(),
                source,
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SamplerError::MissingOutput(program.clone()))?;

        let stderr_task = tokio::spawn(stderr_tail(child.stderr.take()));

        info!(program = %program, pid = ?child.id(), "telemetry source started");
        state_tx.send_replace(SamplerState::Streaming);

        let description = command.display();
        let (tx, inner) = ChannelSource::create(&description);
        let failure = Arc::new(OnceLock::new());
        let task_failure = failure.clone();

        tokio::spawn(async move {
            let end = ingest(stdout, chunk_size, &tx, &shutdown).await;
            match &end {
                StreamEnd::Eof => debug!("telemetry source closed its output"),
                StreamEnd::Shutdown => debug!("stopping telemetry source"),
                StreamEnd::Failed(message) => {
                    warn!(error = %message, "reading telemetry source failed");
                    let _ = task_failure.set(message.clone());
                }
            }

            let status = reap(child, end != StreamEnd::Eof, &shutdown).await;
            let diagnostic = match tokio::time::timeout(STDERR_DRAIN_TIMEOUT, stderr_task).await {
                Ok(Ok(lines)) => lines,
                _ => Vec::new(),
            };

            // Only an exit we did not cause counts as a failure
            if let (StreamEnd::Eof, Some(status)) = (&end, status) {
                if !status.success() {
                    let message = exit_failure(status, &diagnostic);
                    warn!(error = %message, "telemetry source failed");
                    let _ = task_failure.set(message);
                }
            }

            // Terminated must be visible before the slot closes
            state_tx.send_replace(SamplerState::Terminated);
            drop(tx);
        });

        Ok(Self {
            inner,
            state,
            failure,
        })
    }

    pub fn state(&self) -> SamplerState {
        *self.state.borrow()
    }
}

/// Wait for the child to exit, killing it first if asked to or if shutdown
/// fires while waiting.
async fn reap(mut child: Child, kill: bool, shutdown: &Shutdown) -> Option<ExitStatus> {
    if kill {
        if let Err(e) = child.start_kill() {
            debug!(error = %e, "telemetry source already gone");
        }
    }

    let status = tokio::select! {
        status = child.wait() => status,
        _ = shutdown.triggered() => {
            let _ = child.start_kill();
            child.wait().await
        }
    };

    match status {
        Ok(status) => {
            info!(%status, "telemetry source exited");
            Some(status)
        }
        Err(e) => {
            warn!(error = %e, "failed to wait for telemetry source");
            None
        }
    }
}

/// Drain the source's stderr, keeping its last few non-empty lines.
async fn stderr_tail(stderr: Option<ChildStderr>) -> Vec<String> {
    let Some(stderr) = stderr else {
        return Vec::new();
    };

    let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
    let mut lines = BufReader::new(stderr).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                debug!(line, "telemetry source stderr");
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line.to_string());
            }
            Ok(None) => break,
            Err(e) => {
                debug!(error = %e, "stopped reading telemetry source stderr");
                break;
            }
        }
    }
    tail.into()
}

fn exit_failure(status: ExitStatus, diagnostic: &[String]) -> String {
    if diagnostic.is_empty() {
        format!("telemetry source exited unsuccessfully ({})", status)
    } else {
        format!("{} ({})", diagnostic.join("; "), status)
    }
}

impl RecordSource for TelemetrySampler {
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
