//! Append-only diagnostic log file.

use crate::error::{SyncError, SyncResultOf};
use chrono::{SecondsFormat, Utc};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Plain-text log opened in append mode. Each line is prefixed with a UTC
/// timestamp.
pub struct SyncLog {
    path: PathBuf,
    file: File,
}

impl SyncLog {
    /// Open (or create) the log file for appending, creating parent
    /// directories as needed.
    pub fn open(path: &Path) -> SyncResultOf<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| SyncError::Log {
                path: path.to_path_buf(),
                source,
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| SyncError::Log {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one line.
    pub fn line(&mut self, message: impl AsRef<str>) -> SyncResultOf<()> {
        let message = message.as_ref();
        debug!("[log] {}", message);

        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        writeln!(self.file, "[{}] {}", timestamp, message).map_err(|source| SyncError::Log {
            path: self.path.clone(),
            source,
        })
    }

    /// Append a block of text (e.g. captured child-process output), one
    /// timestamped line per non-empty input line.
    pub fn block(&mut self, text: &str) -> SyncResultOf<()> {
        for line in text.lines().map(str::trim_end).filter(|l| !l.is_empty()) {
            self.line(line)?;
        }
        Ok(())
    }
}
