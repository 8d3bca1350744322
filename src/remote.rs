//! Remote folder paths.
//!
//! `RemoteFolder` is the one place a user-supplied remote path is validated
//! and normalized before any backend sees it.

use crate::error::{SyncError, SyncResultOf};
use std::fmt;

/// Path naming a folder in the remote object store.
///
/// Stored normalized: a single leading `/`, no trailing `/`. The store root
/// is kept as `/`. The path as given is kept for backends that address the
/// host file system.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteFolder {
    path: String,
    raw: String,
}

impl RemoteFolder {
    pub fn new(path: &str) -> SyncResultOf<Self> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Err(SyncError::InvalidRemote(
                "remote folder must not be empty".to_string(),
            ));
        }

        let inner = trimmed.trim_matches('/');
        if inner.split('/').any(|segment| segment == "..") {
            return Err(SyncError::InvalidRemote(format!(
                "'{}' must not contain '..' segments",
                trimmed
            )));
        }

        Ok(Self {
            path: format!("/{}", inner),
            raw: trimmed.to_string(),
        })
    }

    /// Normalized path, e.g. `/engineering_simulations_pipeline`.
    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// The path exactly as supplied (trimmed of surrounding whitespace).
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn is_root(&self) -> bool {
        self.path == "/"
    }

    /// Path in the form the Dropbox API expects: root is the empty string.
    pub fn api_path(&self) -> &str {
        if self.is_root() {
            ""
        } else {
            &self.path
        }
    }

    /// Child path for an entry directly under this folder.
    pub fn child(&self, name: &str) -> String {
        if self.is_root() {
            format!("/{}", name)
        } else {
            format!("{}/{}", self.path, name)
        }
    }
}

impl fmt::Display for RemoteFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}
