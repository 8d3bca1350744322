//! Error types for sync operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for SyncGuard operations.
pub type SyncResultOf<T> = std::result::Result<T, SyncError>;

/// Errors surfaced by [`crate::SyncGuard`] and the commands built on it.
///
/// An empty download is not an error; it is reported as
/// [`crate::SyncResult::Empty`] and turned into a failure by the caller.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("download from {backend} failed: {message}")]
    DownloadFailed { backend: String, message: String },

    #[error("cannot list {backend} folder for pruning: {message}")]
    PruneFailed { backend: String, message: String },

    #[error("local path exists but is not a directory: {}", path.display())]
    InvalidLocalPath { path: PathBuf },

    #[error("invalid remote folder: {0}")]
    InvalidRemote(String),

    #[error("missing credential: {0} is empty and not set in the environment")]
    MissingCredentials(&'static str),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write log file {}: {source}", path.display())]
    Log {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
