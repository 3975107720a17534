//! Fetch execution
//!
//! The [`FetchExecutor`] consumes a planned job queue sequentially,
//! fetching each tile with retry, accumulating successful bytes in an
//! [`ArchiveBuilder`], and publishing [`ProgressSnapshot`] values over
//! a watch channel.
//!
//! # Control
//!
//! Control signals arrive on an mpsc channel and take effect at job
//! boundaries: [`ControlSignal::Pause`] blocks the queue before the
//! next fetch, [`ControlSignal::Resume`] unblocks it, and
//! [`ControlSignal::StopAndPack`] stops fetching and finalizes what
//! was already downloaded. Cancellation uses a [`CancellationToken`]
//! instead, so it can abort a fetch that is already in flight.

pub mod policy;

pub use policy::RetryPolicy;

use bytes::Bytes;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::archive::{ArchiveBuilder, ArchiveMetadata};
use crate::error::{ExportError, ExportOutcome};
use crate::plan::{ExportPlan, TileJob};
use crate::provider::{HttpClient, ProviderError};
use crate::session::{ExportSession, ExportState, ProgressSnapshot};

/// Progress snapshots are published every this many completed jobs.
pub const PROGRESS_BATCH: u64 = 25;

/// Capacity of the control signal channel.
pub const SIGNAL_CHANNEL_CAPACITY: usize = 8;

/// A control signal delivered to a running executor.
///
/// Signals are consumed at job boundaries; an in-flight fetch always
/// finishes (or is abandoned by cancellation) first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    /// Stop fetching before the next job; wait for resume.
    Pause,

    /// Leave the paused state and continue fetching.
    Resume,

    /// Stop fetching and package everything fetched so far.
    StopAndPack,
}

/// What the main loop decided after draining signals.
enum Flow {
    Continue,
    StopAndPack,
    Cancelled,
}

/// Sequential tile fetcher for one export session.
///
/// Generic over [`HttpClient`] so tests can drive it with scripted
/// responses. `run` consumes the executor; a session is not reusable.
pub struct FetchExecutor<C: HttpClient> {
    client: C,
    jobs: Vec<TileJob>,
    session: ExportSession,
    builder: ArchiveBuilder,
    pack_name: String,
    metadata: ArchiveMetadata,
    policy: RetryPolicy,
    signal_rx: mpsc::Receiver<ControlSignal>,
    cancel: CancellationToken,
    progress_tx: watch::Sender<ProgressSnapshot>,
}

impl<C: HttpClient> FetchExecutor<C> {
    /// Creates an executor over a planned job queue.
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client used for tile fetches
    /// * `plan` - Planned job queue, consumed in order
    /// * `pack_name` - Raw pack name; sanitized during finalize
    /// * `metadata` - Sidecar metadata describing the request
    /// * `policy` - Retry policy applied to each fetch
    /// * `signal_rx` - Control signal channel
    /// * `cancel` - Token that aborts the session
    /// * `progress_tx` - Watch channel for progress snapshots
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        client: C,
        plan: ExportPlan,
        pack_name: impl Into<String>,
        metadata: ArchiveMetadata,
        policy: RetryPolicy,
        signal_rx: mpsc::Receiver<ControlSignal>,
        cancel: CancellationToken,
        progress_tx: watch::Sender<ProgressSnapshot>,
    ) -> Self {
        let jobs = plan.into_jobs();
        let session = ExportSession::new(jobs.len() as u64);
        Self {
            client,
            jobs,
            session,
            builder: ArchiveBuilder::new(),
            pack_name: pack_name.into(),
            metadata,
            policy,
            signal_rx,
            cancel,
            progress_tx,
        }
    }

    /// Runs the session to its terminal state.
    ///
    /// Individual fetch failures are absorbed into the failure counter
    /// after the retry budget is exhausted; only packaging errors fail
    /// the whole session.
    pub async fn run(mut self) -> ExportOutcome {
        info!(
            tiles = self.jobs.len(),
            pack = %self.pack_name,
            "Export session started"
        );
        self.publish();

        let jobs = std::mem::take(&mut self.jobs);
        let mut stop_requested = false;

        for job in &jobs {
            match self.drain_signals().await {
                Flow::Continue => {}
                Flow::StopAndPack => {
                    stop_requested = true;
                    break;
                }
                Flow::Cancelled => return self.cancelled(),
            }

            let fetched = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return self.cancelled(),
                result = fetch_with_retry(&self.client, job, &self.policy) => result,
            };

            match fetched {
                Ok(bytes) => {
                    self.session.record_success(bytes.len() as u64);
                    self.builder.add_tile(&job.coord, bytes);
                }
                Err(error) => {
                    warn!(
                        zoom = job.coord.zoom,
                        x = job.coord.x,
                        y = job.coord.y,
                        %error,
                        "Tile failed after retries"
                    );
                    self.session.record_failure();
                }
            }

            if self.session.done() % PROGRESS_BATCH == 0 {
                self.publish();
            }
        }

        if stop_requested {
            info!(
                fetched = self.builder.len(),
                remaining = self.session.total() - self.session.done(),
                "Stop-and-pack requested; packaging partial export"
            );
            self.session.set_state(ExportState::StoppingToPack);
            self.publish();
        }

        self.finalize()
    }

    /// Packages accumulated tiles and moves to a terminal state.
    fn finalize(mut self) -> ExportOutcome {
        let builder = std::mem::take(&mut self.builder);
        let result = builder.finalize(&self.pack_name, &self.metadata);
        match result {
            Ok(archive) => {
                self.session.set_state(ExportState::Completed);
                self.publish();
                info!(
                    done = self.session.done(),
                    failed = self.session.failed_count(),
                    bytes = self.session.bytes_downloaded(),
                    archive = archive.file_name(),
                    "Export session completed"
                );
                ExportOutcome::Completed(archive)
            }
            Err(error) => {
                self.session.set_state(ExportState::Failed);
                self.publish();
                warn!(%error, "Export session failed during packaging");
                ExportOutcome::Failed(ExportError::Packaging(error))
            }
        }
    }

    /// Terminates the session, discarding everything fetched.
    fn cancelled(mut self) -> ExportOutcome {
        self.session.set_state(ExportState::Cancelled);
        self.publish();
        info!(
            done = self.session.done(),
            total = self.session.total(),
            "Export session cancelled; output discarded"
        );
        ExportOutcome::Cancelled
    }

    /// Drains pending control signals at a job boundary.
    ///
    /// On [`ControlSignal::Pause`] this blocks until a resume,
    /// stop-and-pack, or cancellation arrives.
    async fn drain_signals(&mut self) -> Flow {
        if self.cancel.is_cancelled() {
            return Flow::Cancelled;
        }

        while let Ok(signal) = self.signal_rx.try_recv() {
            match signal {
                ControlSignal::Pause => match self.wait_while_paused().await {
                    Flow::Continue => {}
                    other => return other,
                },
                ControlSignal::Resume => {}
                ControlSignal::StopAndPack => return Flow::StopAndPack,
            }
        }

        Flow::Continue
    }

    /// Parks the queue until resumed, stopped, or cancelled.
    async fn wait_while_paused(&mut self) -> Flow {
        debug!(done = self.session.done(), "Export session paused");
        self.session.set_state(ExportState::Paused);
        self.publish();

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return Flow::Cancelled,
                signal = self.signal_rx.recv() => match signal {
                    Some(ControlSignal::Resume) => {
                        debug!("Export session resumed");
                        self.session.set_state(ExportState::Running);
                        self.publish();
                        return Flow::Continue;
                    }
                    Some(ControlSignal::StopAndPack) => return Flow::StopAndPack,
                    Some(ControlSignal::Pause) => {}
                    // Handle dropped while paused: no observer can
                    // resume or repack the session, so it terminates.
                    None => return Flow::Cancelled,
                },
            }
        }
    }

    fn publish(&self) {
        let _ = self.progress_tx.send(self.session.snapshot());
    }
}

/// Fetches one tile, retrying per policy with a delay between attempts.
///
/// The caller races this against cancellation, so the inter-attempt
/// sleep does not need its own cancel check.
async fn fetch_with_retry<C: HttpClient>(
    client: &C,
    job: &TileJob,
    policy: &RetryPolicy,
) -> Result<Bytes, ProviderError> {
    let mut attempt = 1u32;
    loop {
        match client.get(&job.url).await {
            Ok(bytes) => return Ok(bytes),
            Err(error) => match policy.delay_for_attempt(attempt) {
                Some(delay) => {
                    debug!(
                        zoom = job.coord.zoom,
                        x = job.coord.x,
                        y = job.coord.y,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        %error,
                        "Tile fetch failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                None => return Err(error),
            },
        }
    }
}
