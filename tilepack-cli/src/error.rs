//! CLI error type.

use std::fmt;

/// Errors surfaced to the terminal user.
#[derive(Debug)]
pub enum CliError {
    /// A command-line argument failed validation.
    InvalidArgument(String),

    /// The export could not be planned.
    Plan(tilepack::plan::PlanError),

    /// The export session failed.
    Export(String),

    /// The export was cancelled before producing an archive.
    Cancelled,

    /// The finished archive could not be written to disk.
    Write(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Self::Plan(e) => write!(f, "Planning failed: {}", e),
            Self::Export(msg) => write!(f, "Export failed: {}", msg),
            Self::Cancelled => write!(f, "Export cancelled; nothing written"),
            Self::Write(msg) => write!(f, "Failed to write archive: {}", msg),
        }
    }
}

impl std::error::Error for CliError {}

impl From<tilepack::plan::PlanError> for CliError {
    fn from(e: tilepack::plan::PlanError) -> Self {
        Self::Plan(e)
    }
}
