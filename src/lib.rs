//! SyncGuard Library
//!
//! Fetch a remote folder into a local working directory before a pipeline
//! step runs, and refuse to continue when nothing arrived.
//! Provides the following capabilities:
//! - One-shot guarded download (`SyncGuard::sync`) with a Populated/Empty verdict
//! - Dropbox, rclone and local-directory backends behind one trait
//! - Selective pruning of the remote folder between and after runs
//! - The pipeline's enable flag as an explicit, separately owned value
//!
//! Pipeline: ensure local dir -> download (backend) -> verify non-empty

pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod guard;
pub mod journal;
pub mod prune;
pub mod remote;
pub mod sync;

// Re-export main types
pub use config::{OrchestratorFlag, Settings};
pub use credentials::Credentials;
pub use error::{SyncError, SyncResultOf};
pub use guard::{SyncGuard, SyncRequest, SyncResult};
pub use journal::SyncLog;
pub use prune::{PrunePolicy, PruneReport};
pub use remote::RemoteFolder;
pub use sync::{
    Backend, BackendKind, DownloadReport, DropboxProvider, LocalProvider, RcloneProvider,
    RemoteDownloader, RemoteFile, RemotePruner,
};
