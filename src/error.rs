//! Error taxonomy shared by the stores, the analysis orchestrator and the CLI.
//!
//! Every fallible operation returns [`Result`]. Only the command handlers turn
//! an error into a printed message and an exit code.

use thiserror::Error;

/// Everything that can go wrong while preparing, sending or rendering an analysis.
#[derive(Debug, Error)]
pub enum TriageError {
    /// Manual input rejected before any mutation (blank title, bad field).
    #[error("{0}")]
    Validation(String),

    /// Malformed import payload or persisted blob.
    #[error("Invalid JSON: {0}")]
    Format(String),

    /// One element of an import batch could not be turned into a task.
    #[error("Invalid JSON: Task {index} {reason}")]
    Import { index: usize, reason: String },

    /// Analysis requested with zero tasks.
    #[error("Please add at least one task before analyzing")]
    EmptyInput,

    /// Positional access outside the task sequence.
    #[error("No task at index {index} (store holds {len})")]
    Index { index: usize, len: usize },

    /// Network failure talking to the analysis service.
    #[error("Failed to analyze tasks: {0}")]
    Transport(String),

    /// The analysis service answered with a non-success status.
    #[error("Failed to analyze tasks: HTTP error! status: {status}")]
    Service { status: u16, body: String },

    /// The analysis service answered, but not with something we understand.
    #[error("Failed to analyze tasks: {0}")]
    Decode(String),

    /// A newer analysis started before this one finished.
    #[error("analysis generation {generation} was superseded")]
    Superseded { generation: u64 },

    #[error("Config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TriageError>;
