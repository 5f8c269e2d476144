// Background scan orchestration: one walk at a time, completion over a channel
use super::{walk_largest, CancelFlag, ScanRequest, ScanResult};
use crate::error::ScanError;
use std::fmt;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tracing::{debug, info, warn};

/// Identifies one scan started by a [`LargeFileScanner`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScanId(u64);

impl fmt::Display for ScanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scan#{}", self.0)
    }
}

/// Opaque handle to a started scan. Cloning shares the cancellation flag.
#[derive(Debug, Clone)]
pub struct ScanHandle {
    id: ScanId,
    cancel: CancelFlag,
}

impl ScanHandle {
    pub fn id(&self) -> ScanId {
        self.id
    }

    /// Asks the walk to stop at its next entry boundary
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Message posted by the background walk when it ends
#[derive(Debug)]
pub struct ScanCompletion {
    pub id: ScanId,
    pub outcome: Result<ScanResult, ScanError>,
}

/// Lifecycle of the scanner's single session
#[derive(Debug, Default)]
pub enum ScanState {
    #[default]
    Idle,
    Running(ScanId),
    Completed(ScanResult),
    Failed(ScanError),
    Cancelled,
}

impl ScanState {
    pub fn is_running(&self) -> bool {
        matches!(self, ScanState::Running(_))
    }

    /// Completed, failed or cancelled, and not yet consumed
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            ScanState::Completed(_) | ScanState::Failed(_) | ScanState::Cancelled
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScanState::Idle => "idle",
            ScanState::Running(_) => "running",
            ScanState::Completed(_) => "completed",
            ScanState::Failed(_) => "failed",
            ScanState::Cancelled => "cancelled",
        }
    }
}

/// Runs large-file scans off the caller's thread.
///
/// The scanner itself belongs to the foreground. It owns the session state
/// and the receiving end of each scan's completion channel; the background
/// walk holds the only sender, sends one [`ScanCompletion`] and never touches
/// the session. A walk that is dropped without reporting, for instance
/// because its runtime shut down, fails the scan with
/// [`ScanError::WorkerFailed`]. State
/// changes happen when the owner calls [`try_poll`](Self::try_poll) or
/// awaits [`wait`](Self::wait).
///
/// At most one scan runs at a time. The session stays `Running` until its
/// completion has been received, even after a cancel request, so a new scan
/// can never race a walk that is still winding down.
pub struct LargeFileScanner {
    runtime: Handle,
    state: ScanState,
    active: Option<ScanHandle>,
    next_id: u64,
    completion_rx: Option<mpsc::UnboundedReceiver<ScanCompletion>>,
}

impl LargeFileScanner {
    /// Creates a scanner that spawns its walks on `runtime`
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            state: ScanState::Idle,
            active: None,
            next_id: 1,
            completion_rx: None,
        }
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    /// Handle of the running or finished-but-unconsumed scan
    pub fn active(&self) -> Option<&ScanHandle> {
        self.active.as_ref()
    }

    /// Starts a scan in the background.
    ///
    /// Returns immediately. The only synchronous failure is
    /// [`ScanError::AlreadyInProgress`]; everything else, including an
    /// unusable root, arrives as the scan's completion. A finished but
    /// unconsumed session is discarded.
    pub fn start_scan(&mut self, request: ScanRequest) -> Result<ScanHandle, ScanError> {
        self.start_scan_with_cancel(request, CancelFlag::new())
    }

    /// Like [`start_scan`](Self::start_scan), tied to an existing cancel flag
    pub fn start_scan_with_cancel(
        &mut self,
        request: ScanRequest,
        cancel: CancelFlag,
    ) -> Result<ScanHandle, ScanError> {
        if let ScanState::Running(id) = self.state {
            debug!(%id, "rejecting scan request, session busy");
            return Err(ScanError::AlreadyInProgress);
        }

        let id = ScanId(self.next_id);
        self.next_id += 1;

        let handle = ScanHandle { id, cancel };
        let walk_cancel = handle.cancel.clone();
        let (tx, rx) = mpsc::unbounded_channel();

        info!(
            %id,
            root = %request.root().display(),
            min_size = request.min_size_bytes(),
            top_k = request.top_k(),
            "scan started"
        );

        self.runtime.spawn(async move {
            let joined =
                tokio::task::spawn_blocking(move || walk_largest(&request, &walk_cancel)).await;

            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => Err(ScanError::WorkerFailed(e.to_string())),
            };

            // A closed receiver means the session moved on; nobody wants this.
            let _ = tx.send(ScanCompletion { id, outcome });
        });

        self.state = ScanState::Running(id);
        self.completion_rx = Some(rx);
        self.active = Some(handle.clone());
        Ok(handle)
    }

    /// Requests cancellation of the given scan
    pub fn cancel(&self, handle: &ScanHandle) {
        if self.active.as_ref().map(ScanHandle::id) == Some(handle.id) && self.state.is_running() {
            info!(id = %handle.id, "cancelling scan");
        }
        handle.cancel();
    }

    /// Applies a pending completion, if any, without blocking.
    ///
    /// Returns the id of the scan that just finished.
    pub fn try_poll(&mut self) -> Option<ScanId> {
        let rx = self.completion_rx.as_mut()?;
        let completion = match rx.try_recv() {
            Ok(completion) => completion,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => self.lost_worker()?,
        };
        self.completion_rx = None;
        self.apply(completion)
    }

    /// Waits for the running scan to finish and applies its completion.
    ///
    /// Returns `None` straight away when no scan is running.
    pub async fn wait(&mut self) -> Option<ScanId> {
        if !self.state.is_running() {
            return None;
        }
        let rx = self.completion_rx.as_mut()?;
        let completion = match rx.recv().await {
            Some(completion) => completion,
            None => self.lost_worker()?,
        };
        self.completion_rx = None;
        self.apply(completion)
    }

    /// Waits for the running scan and hands its outcome over by value
    pub async fn completion(&mut self) -> Option<ScanCompletion> {
        self.wait().await?;
        self.take_outcome()
    }

    /// Moves a finished outcome out of the session, resetting it to `Idle`.
    ///
    /// A cancelled scan yields `Err(ScanError::Cancelled)` and no result.
    pub fn take_outcome(&mut self) -> Option<ScanCompletion> {
        if !self.state.is_finished() {
            return None;
        }

        let id = self.active.take()?.id;
        let outcome = match std::mem::take(&mut self.state) {
            ScanState::Completed(result) => Ok(result),
            ScanState::Failed(err) => Err(err),
            _ => Err(ScanError::Cancelled),
        };

        Some(ScanCompletion { id, outcome })
    }

    /// Discards a finished session. Has no effect while a scan is running.
    pub fn reset(&mut self) {
        if self.state.is_finished() {
            self.state = ScanState::Idle;
            self.active = None;
            self.completion_rx = None;
        }
    }

    /// Completion standing in for a walk whose sender was dropped unsent
    fn lost_worker(&self) -> Option<ScanCompletion> {
        match self.state {
            ScanState::Running(id) => Some(ScanCompletion {
                id,
                outcome: Err(ScanError::WorkerFailed(
                    "scan task ended without reporting".to_string(),
                )),
            }),
            _ => None,
        }
    }

    fn apply(&mut self, completion: ScanCompletion) -> Option<ScanId> {
        match self.state {
            ScanState::Running(id) if id == completion.id => {}
            _ => {
                warn!(id = %completion.id, "dropping completion for a scan that is not running");
                return None;
            }
        }

        self.state = match completion.outcome {
            Ok(result) => {
                info!(
                    id = %completion.id,
                    files = result.len(),
                    skipped = result.stats.skipped_total(),
                    elapsed_ms = result.stats.elapsed.as_millis() as u64,
                    "scan completed"
                );
                ScanState::Completed(result)
            }
            Err(ScanError::Cancelled) => {
                info!(id = %completion.id, "scan cancelled");
                ScanState::Cancelled
            }
            Err(err) => {
                warn!(id = %completion.id, error = %err, "scan failed");
                ScanState::Failed(err)
            }
        };

        Some(completion.id)
    }
}

impl Drop for LargeFileScanner {
    fn drop(&mut self) {
        // Stop an orphaned walk instead of letting it run to the end.
        if self.state.is_running() {
            if let Some(handle) = &self.active {
                handle.cancel();
            }
        }
    }
}
