//! Remote store capabilities - abstraction over the download backend.
//!
//! The guard only ever needs one thing from a backend: copy everything under
//! a remote folder into a local directory. Pruning is a separate capability
//! because not every caller needs it.

use crate::credentials::Credentials;
use crate::journal::SyncLog;
use crate::remote::RemoteFolder;
use anyhow::Result;
use std::path::Path;

/// What a backend reports after a download it considers successful.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadReport {
    /// Names of files the backend wrote into the local directory
    pub files: Vec<String>,
    /// Entries the backend saw but did not download (folders, etc.)
    pub skipped: usize,
}

impl DownloadReport {
    pub fn downloaded(&self) -> usize {
        self.files.len()
    }
}

/// A file entry directly under a remote folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// File name without any directory part
    pub name: String,
    /// Full path in the remote store
    pub path: String,
}

/// One-shot download of a remote folder into a local directory.
///
/// Returning `Err` means the transfer failed; the guard will not look at the
/// local directory in that case.
pub trait RemoteDownloader {
    /// Backend name used in diagnostics (dropbox, rclone, local)
    fn name(&self) -> &'static str {
        "custom"
    }

    /// Copy every object under `remote` into `local`, appending progress
    /// lines to `log`. `local` already exists when this is called.
    fn download(
        &self,
        remote: &RemoteFolder,
        local: &Path,
        credentials: &Credentials,
        log: &mut SyncLog,
    ) -> Result<DownloadReport>;
}

impl<F> RemoteDownloader for F
where
    F: Fn(&RemoteFolder, &Path, &Credentials, &mut SyncLog) -> Result<DownloadReport>,
{
    fn download(
        &self,
        remote: &RemoteFolder,
        local: &Path,
        credentials: &Credentials,
        log: &mut SyncLog,
    ) -> Result<DownloadReport> {
        self(remote, local, credentials, log)
    }
}

/// Listing and deletion of files directly under a remote folder.
pub trait RemotePruner {
    fn name(&self) -> &'static str;

    /// List file entries (not folders) directly under `remote`.
    fn list_files(&self, remote: &RemoteFolder, credentials: &Credentials)
        -> Result<Vec<RemoteFile>>;

    /// Delete a single file previously returned by `list_files`.
    fn delete_file(&self, file: &RemoteFile, credentials: &Credentials) -> Result<()>;
}
