//! Sync module - remote store backends.
//!
//! This module contains:
//! - RemoteDownloader / RemotePruner traits for abstraction
//! - Dropbox provider (HTTP API, refresh-token auth)
//! - Rclone provider (shells out to the rclone binary)
//! - Local provider (a host directory standing in for the remote)

pub mod dropbox;
pub mod local;
pub mod provider;
pub mod rclone;

pub use dropbox::DropboxProvider;
pub use local::LocalProvider;
pub use provider::{DownloadReport, RemoteDownloader, RemoteFile, RemotePruner};
pub use rclone::RcloneProvider;

use crate::config::Settings;
use crate::credentials::Credentials;
use crate::journal::SyncLog;
use crate::remote::RemoteFolder;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Which backend to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Dropbox,
    Rclone,
    Local,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Dropbox => "dropbox",
            Self::Rclone => "rclone",
            Self::Local => "local",
        };
        f.write_str(name)
    }
}

/// A concrete backend selected at runtime.
pub enum Backend {
    Dropbox(DropboxProvider),
    Rclone(RcloneProvider),
    Local(LocalProvider),
}

impl Backend {
    pub fn from_settings(kind: BackendKind, settings: &Settings) -> anyhow::Result<Self> {
        Ok(match kind {
            BackendKind::Dropbox => Self::Dropbox(DropboxProvider::new(&settings.dropbox)?),
            BackendKind::Rclone => Self::Rclone(RcloneProvider::new(&settings.rclone)),
            BackendKind::Local => Self::Local(LocalProvider::new()),
        })
    }
}

impl RemoteDownloader for Backend {
    fn name(&self) -> &'static str {
        match self {
            Self::Dropbox(p) => RemoteDownloader::name(p),
            Self::Rclone(p) => RemoteDownloader::name(p),
            Self::Local(p) => RemoteDownloader::name(p),
        }
    }

    fn download(
        &self,
        remote: &RemoteFolder,
        local: &Path,
        credentials: &Credentials,
        log: &mut SyncLog,
    ) -> anyhow::Result<DownloadReport> {
        match self {
            Self::Dropbox(p) => p.download(remote, local, credentials, log),
            Self::Rclone(p) => p.download(remote, local, credentials, log),
            Self::Local(p) => p.download(remote, local, credentials, log),
        }
    }
}

impl RemotePruner for Backend {
    fn name(&self) -> &'static str {
        match self {
            Self::Dropbox(p) => RemotePruner::name(p),
            Self::Rclone(p) => RemotePruner::name(p),
            Self::Local(p) => RemotePruner::name(p),
        }
    }

    fn list_files(
        &self,
        remote: &RemoteFolder,
        credentials: &Credentials,
    ) -> anyhow::Result<Vec<RemoteFile>> {
        match self {
            Self::Dropbox(p) => p.list_files(remote, credentials),
            Self::Rclone(p) => p.list_files(remote, credentials),
            Self::Local(p) => p.list_files(remote, credentials),
        }
    }

    fn delete_file(&self, file: &RemoteFile, credentials: &Credentials) -> anyhow::Result<()> {
        match self {
            Self::Dropbox(p) => p.delete_file(file, credentials),
            Self::Rclone(p) => p.delete_file(file, credentials),
            Self::Local(p) => p.delete_file(file, credentials),
        }
    }
}

/// Reject names that would escape the local directory.
pub(crate) fn safe_file_name(name: &str) -> anyhow::Result<&str> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
    {
        anyhow::bail!("Refusing to write remote entry with unsafe name '{}'", name);
    }
    Ok(name)
}
