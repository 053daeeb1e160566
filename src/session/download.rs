//! Single-use download session supervising the external tool
//!
//! A session binds one chosen format to one destination path, runs the tool
//! as a subprocess and parses its stdout for progress. The lifecycle is
//! `Idle -> Running -> Terminal` and nothing else; the terminal
//! notification fires exactly once, after the subprocess is gone.

use crate::extractor::models::VideoFormat;
use crate::session::progress::parse_progress_line;
use crate::session::terminate;
use crate::utils::error::TubeloaderError;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Grace period between the cancel interrupt and the forced kill
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Session lifecycle. The only legal transitions are
/// `Idle -> Running -> Terminal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    Terminal(TerminalState),
}

/// Final, irreversible status of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalState {
    Completed,
    Failed,
    Cancelled,
}

/// Delivered exactly once when the session reaches a terminal state
#[derive(Debug)]
pub struct SessionOutcome {
    pub cancelled: bool,
    pub destination: PathBuf,
    pub error: Option<TubeloaderError>,
}

/// Inputs accepted by [`DownloadSession::start`]
#[derive(Debug, Clone, Copy, Default)]
pub struct StartOptions {
    /// Ask the tool to skip its post-processing fixups
    pub no_fixup: bool,
}

/// State shared with the background read loop
#[derive(Debug)]
struct Shared {
    state: Mutex<SessionState>,
    cancel_requested: AtomicBool,
    child_pid: Mutex<Option<u32>>,
}

/// One download attempt, bound to one format and one destination.
///
/// Created by [`crate::extractor::YtDlp::prepare_download`]. `start` may
/// succeed at most once; afterwards the session only reports state. The
/// progress stream and the completion future are each take-once.
#[derive(Debug)]
pub struct DownloadSession {
    tool_path: PathBuf,
    format: VideoFormat,
    homepage_url: String,
    output_path: Mutex<Option<PathBuf>>,
    shared: Arc<Shared>,
    progress_tx: Mutex<Option<mpsc::UnboundedSender<f64>>>,
    progress_rx: Mutex<Option<mpsc::UnboundedReceiver<f64>>>,
    completion_tx: Mutex<Option<oneshot::Sender<SessionOutcome>>>,
    completion_rx: Mutex<Option<oneshot::Receiver<SessionOutcome>>>,
}

/// Lock that shrugs off poisoning: session state stays usable even if a
/// holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl DownloadSession {
    pub(crate) fn new(tool_path: PathBuf, format: VideoFormat, homepage_url: String) -> Self {
        let (progress_tx, progress_rx) = mpsc::unbounded_channel();
        let (completion_tx, completion_rx) = oneshot::channel();
        Self {
            tool_path,
            format,
            homepage_url,
            output_path: Mutex::new(None),
            shared: Arc::new(Shared {
                state: Mutex::new(SessionState::Idle),
                cancel_requested: AtomicBool::new(false),
                child_pid: Mutex::new(None),
            }),
            progress_tx: Mutex::new(Some(progress_tx)),
            progress_rx: Mutex::new(Some(progress_rx)),
            completion_tx: Mutex::new(Some(completion_tx)),
            completion_rx: Mutex::new(Some(completion_rx)),
        }
    }

    pub fn state(&self) -> SessionState {
        *lock(&self.shared.state)
    }

    pub fn format(&self) -> &VideoFormat {
        &self.format
    }

    pub fn cancel_requested(&self) -> bool {
        self.shared.cancel_requested.load(Ordering::SeqCst)
    }

    /// Destination path, fixed once `start` has succeeded.
    pub fn output_path(&self) -> Option<PathBuf> {
        lock(&self.output_path).clone()
    }

    /// Take the progress stream: a finite sequence of percentages in the
    /// order the tool reported them. Yields `None` after the first call.
    pub fn progress_stream(&self) -> Option<mpsc::UnboundedReceiver<f64>> {
        lock(&self.progress_rx).take()
    }

    /// Take the single-shot completion future. Yields `None` after the
    /// first call.
    pub fn completion(&self) -> Option<oneshot::Receiver<SessionOutcome>> {
        lock(&self.completion_rx).take()
    }

    /// Start the download towards `output_path`.
    ///
    /// Spawns the tool and a background loop reading its stdout; returns as
    /// soon as both are wired up. Fails with `AlreadyStarted` if the
    /// session ever left Idle, and with the spawn error if the subprocess
    /// could not be created (the session then rests in a failed terminal
    /// state). Must be called from within a Tokio runtime.
    pub fn start(&self, output_path: &Path, options: StartOptions) -> Result<(), TubeloaderError> {
        {
            let mut state = lock(&self.shared.state);
            if *state != SessionState::Idle {
                return Err(TubeloaderError::AlreadyStarted);
            }
            *state = SessionState::Running;
        }

        let mut cmd = terminate::tool_command(&self.tool_path);
        cmd.arg("--no-warnings")
            .arg("--newline")
            .arg("--no-part")
            .arg("--hls-prefer-native")
            .arg("--no-call-home");
        if options.no_fixup {
            cmd.arg("--fixup").arg("never");
        }
        if self.format.is_streaming_protocol() {
            cmd.arg("--hls-use-mpegts");
        }
        cmd.arg("--format")
            .arg(&self.format.format_id)
            .arg("--output")
            .arg(output_path)
            .arg(&self.homepage_url);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(err) => {
                *lock(&self.shared.state) = SessionState::Terminal(TerminalState::Failed);
                return Err(err.into());
            }
        };
        info!(
            "started download of format {} to {}",
            self.format.format_id,
            output_path.display()
        );

        *lock(&self.output_path) = Some(output_path.to_path_buf());
        *lock(&self.shared.child_pid) = child.id();

        // A cancel that raced the spawn missed the pid; honor it now.
        if self.shared.cancel_requested.load(Ordering::SeqCst) {
            if let Some(pid) = child.id() {
                terminate::interrupt(pid);
            }
        }

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // Keep the stderr pipe drained so the tool can never stall on it.
        tokio::spawn(async move {
            if let Some(stderr) = stderr {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(target: "tool:stderr", "{}", line);
                }
            }
        });

        let progress_tx = lock(&self.progress_tx).take();
        let completion_tx = lock(&self.completion_tx).take();
        let shared = Arc::clone(&self.shared);
        let destination = output_path.to_path_buf();

        tokio::spawn(async move {
            let mut read_error: Option<std::io::Error> = None;

            if let Some(stdout) = stdout {
                let mut lines = BufReader::new(stdout).lines();
                loop {
                    match lines.next_line().await {
                        Ok(Some(line)) => {
                            if let Some(percent) = parse_progress_line(&line) {
                                if let Some(tx) = &progress_tx {
                                    // Receiver may be gone; keep draining so
                                    // the tool never blocks on its stdout.
                                    let _ = tx.send(percent);
                                }
                            }
                        }
                        Ok(None) => break,
                        Err(err) => {
                            read_error = Some(err);
                            break;
                        }
                    }
                }
            }

            // The subprocess must be gone before the terminal notification.
            if let Err(err) = terminate::shutdown(&mut child, SHUTDOWN_GRACE).await {
                warn!("failed to shut down download process: {}", err);
            }

            let cancelled = shared.cancel_requested.load(Ordering::SeqCst);
            let terminal = if cancelled {
                TerminalState::Cancelled
            } else if read_error.is_some() {
                TerminalState::Failed
            } else {
                TerminalState::Completed
            };
            *lock(&shared.state) = SessionState::Terminal(terminal);
            debug!("download session reached {:?}", terminal);

            // Close the progress stream before the terminal event fires.
            drop(progress_tx);

            if let Some(tx) = completion_tx {
                let outcome = SessionOutcome {
                    cancelled,
                    destination,
                    error: read_error.map(TubeloaderError::from),
                };
                let _ = tx.send(outcome);
            }
        });

        Ok(())
    }

    /// Request cancellation of a running download.
    ///
    /// Idempotent and safe from any task: a no-op unless the session is
    /// Running, and at most one interrupt is ever sent. The read loop
    /// performs the bounded wait and force-kill, then reports a Cancelled
    /// terminal outcome.
    pub fn cancel(&self) {
        if self.state() != SessionState::Running {
            debug!("cancel ignored outside Running");
            return;
        }
        if self.shared.cancel_requested.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("cancelling download of format {}", self.format.format_id);
        if let Some(pid) = *lock(&self.shared.child_pid) {
            terminate::interrupt(pid);
        }
    }
}
