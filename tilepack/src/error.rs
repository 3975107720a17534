//! Top-level error and outcome types for an export run.

use thiserror::Error;

use crate::archive::{ArchiveError, ExportArchive};
use crate::plan::PlanError;

/// Errors that terminate an export.
///
/// Individual tile failures are not errors at this level; they are
/// recorded in progress counters and the run continues. An export
/// fails only when it cannot be planned or packaged at all.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The export request could not be turned into a plan.
    #[error("planning failed: {0}")]
    Plan(#[from] PlanError),

    /// The fetched tiles could not be packaged.
    #[error("packaging failed: {0}")]
    Packaging(#[from] ArchiveError),

    /// The executor task terminated abnormally (panic or runtime abort).
    #[error("export task aborted: {0}")]
    Aborted(String),
}

/// Final result of an export run.
///
/// Cancellation is a normal outcome rather than an error: the run was
/// asked to stop and did, discarding all fetched data.
#[derive(Debug)]
pub enum ExportOutcome {
    /// The run finished (fully, or truncated by stop-and-pack) and
    /// produced an archive.
    Completed(ExportArchive),

    /// The run was cancelled; nothing was produced.
    Cancelled,

    /// The run failed terminally.
    Failed(ExportError),
}

impl ExportOutcome {
    /// Returns the archive if the run completed, consuming the outcome.
    pub fn into_archive(self) -> Option<ExportArchive> {
        match self {
            Self::Completed(archive) => Some(archive),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
