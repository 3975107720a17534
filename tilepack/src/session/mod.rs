//! Export session state
//!
//! An [`ExportSession`] owns the bookkeeping for one export: the fixed
//! job total, the monotone `done` cursor, failure and byte counters,
//! timestamps, and the [`ExportState`] machine. It is exclusively
//! owned by the executor for its lifetime; observers only ever see
//! read-only [`ProgressSnapshot`] values.

use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

/// Export session lifecycle state.
///
/// ```text
/// Planning -> Running <-> Paused
/// Running | Paused -> StoppingToPack -> Completed
/// Running | Paused -> Completed            (jobs exhausted)
/// any active state -> Cancelled            (terminal, discards output)
/// finalize failure -> Failed               (terminal)
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportState {
    /// Planning the job list; no network activity yet.
    #[default]
    Planning,

    /// Fetching tiles.
    Running,

    /// Paused at a job boundary; waiting for resume or cancel.
    Paused,

    /// Early finalize requested; packaging what was fetched.
    StoppingToPack,

    /// Finished; the archive was produced.
    Completed,

    /// Aborted; all accumulated output discarded.
    Cancelled,

    /// Packaging or planning failed after work started.
    Failed,
}

impl ExportState {
    /// Returns true for the terminal states.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }

    /// Returns true while the session can still make progress.
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if the session is paused.
    pub fn is_paused(&self) -> bool {
        matches!(self, Self::Paused)
    }

    /// Short description for display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planning => "Planning",
            Self::Running => "Running",
            Self::Paused => "Paused",
            Self::StoppingToPack => "StoppingToPack",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
            Self::Failed => "Failed",
        }
    }
}

impl fmt::Display for ExportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A read-only view of session progress.
///
/// Snapshots are published in batches by the executor and remain
/// available after the session terminates.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    /// Current session state.
    pub state: ExportState,
    /// Jobs attempted so far (success or exhausted-retry failure).
    pub done: u64,
    /// Total planned jobs; fixed once planning completes.
    pub total: u64,
    /// Tiles that exhausted their retry budget.
    pub failed_count: u64,
    /// Bytes of tile data fetched so far.
    pub bytes_downloaded: u64,
    /// Time since the session started.
    pub elapsed: Duration,
}

impl ProgressSnapshot {
    /// Completion ratio in `[0.0, 1.0]`; zero-job plans report 1.0.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.done as f64 / self.total as f64
        }
    }
}

/// Bookkeeping for one export session.
#[derive(Debug)]
pub struct ExportSession {
    state: ExportState,
    total: u64,
    done: u64,
    failed_count: u64,
    bytes_downloaded: u64,
    started_at: DateTime<Utc>,
    started_instant: Instant,
    ended_at: Option<DateTime<Utc>>,
}

impl ExportSession {
    /// Creates a session for a plan of `total` jobs.
    pub fn new(total: u64) -> Self {
        Self {
            state: ExportState::Running,
            total,
            done: 0,
            failed_count: 0,
            bytes_downloaded: 0,
            started_at: Utc::now(),
            started_instant: Instant::now(),
            ended_at: None,
        }
    }

    /// Records a successful tile fetch and advances the done cursor.
    pub fn record_success(&mut self, bytes: u64) {
        self.bytes_downloaded += bytes;
        self.done += 1;
    }

    /// Records an exhausted-retry failure and advances the done cursor.
    pub fn record_failure(&mut self) {
        self.failed_count += 1;
        self.done += 1;
    }

    /// Moves the session to a new state, stamping `ended_at` on the
    /// transition into a terminal state.
    pub fn set_state(&mut self, state: ExportState) {
        self.state = state;
        if state.is_terminal() && self.ended_at.is_none() {
            self.ended_at = Some(Utc::now());
        }
    }

    pub fn state(&self) -> ExportState {
        self.state
    }

    pub fn done(&self) -> u64 {
        self.done
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn failed_count(&self) -> u64 {
        self.failed_count
    }

    pub fn bytes_downloaded(&self) -> u64 {
        self.bytes_downloaded
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Time elapsed since the session started.
    pub fn elapsed(&self) -> Duration {
        self.started_instant.elapsed()
    }

    /// Produces a read-only progress snapshot.
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            state: self.state,
            done: self.done,
            total: self.total,
            failed_count: self.failed_count,
            bytes_downloaded: self.bytes_downloaded,
            elapsed: self.elapsed(),
        }
    }
}
