//! Error types shared across the crate

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that end a scan or reject a scan request.
///
/// Per-entry failures inside the walk never show up here; they are counted in
/// [`crate::scan::ScanStats`] instead.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The scan root is missing, is not a directory, or cannot be listed
    #[error("scan root unavailable: {}: {source}", .path.display())]
    RootUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A scan is already running on this scanner
    #[error("a scan is already in progress")]
    AlreadyInProgress,

    /// The request itself is malformed (e.g. `top_k == 0`)
    #[error("invalid scan request: {0}")]
    InvalidRequest(String),

    /// The wall-clock budget ran out before the walk finished
    #[error("scan exceeded its time budget")]
    TimedOut,

    /// The caller cancelled the scan. Not a failure, but it carries no result.
    #[error("scan cancelled")]
    Cancelled,

    /// The background task died before posting a result
    #[error("scan worker failed: {0}")]
    WorkerFailed(String),
}

impl ScanError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ScanError::Cancelled)
    }
}

/// Errors from the pass-through delete action
#[derive(Debug, Error)]
pub enum DeleteError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("file is in use: {}", .0.display())]
    InUse(PathBuf),

    #[error("not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("could not move {} to trash: {message}", .path.display())]
    Trash { path: PathBuf, message: String },

    #[error("failed to delete {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Errors from revealing a file in the platform file manager
#[derive(Debug, Error)]
pub enum RevealError {
    #[error("containing folder does not exist: {}", .0.display())]
    FolderMissing(PathBuf),

    #[error("failed to open file manager for {}: {source}", .path.display())]
    Launch {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Errors from the desktop organizer
#[derive(Debug, Error)]
pub enum OrganizeError {
    #[error("source is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("undo journal error: {0}")]
    Journal(String),
}

/// Top-level error for the binary and the config layer
#[derive(Debug, Error)]
pub enum TidyError {
    #[error("config error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Delete(#[from] DeleteError),

    #[error(transparent)]
    Reveal(#[from] RevealError),

    #[error(transparent)]
    Organize(#[from] OrganizeError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, TidyError>;
