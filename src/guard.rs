//! SyncGuard - download a remote folder, then check something actually arrived.
//!
//! Flow for a single attempt:
//! 1. Make sure the local directory exists (idempotent)
//! 2. Hand the transfer to the injected [`RemoteDownloader`]
//! 3. Count entries in the local directory and report `Populated` or `Empty`
//!
//! No retries. A failed download is returned immediately, before the local
//! directory is inspected.

use crate::credentials::Credentials;
use crate::error::{SyncError, SyncResultOf};
use crate::journal::SyncLog;
use crate::remote::RemoteFolder;
use crate::sync::RemoteDownloader;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Outcome of one sync attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncResult {
    /// The local directory holds at least one entry
    Populated { entries: usize },
    /// The download succeeded but the local directory is empty
    Empty,
}

impl SyncResult {
    pub fn is_populated(&self) -> bool {
        matches!(self, Self::Populated { .. })
    }

    /// Process exit status for the caller's fail-fast policy.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Populated { .. } => 0,
            Self::Empty => 1,
        }
    }
}

/// Everything one sync attempt needs besides the backend.
#[derive(Debug, Clone)]
pub struct SyncRequest {
    pub remote: RemoteFolder,
    pub local: PathBuf,
    pub credentials: Credentials,
    pub log_path: PathBuf,
}

/// Drives a download through a [`RemoteDownloader`] and verifies the result.
pub struct SyncGuard<D> {
    downloader: D,
}

impl<D: RemoteDownloader> SyncGuard<D> {
    pub fn new(downloader: D) -> Self {
        Self { downloader }
    }

    pub fn downloader(&self) -> &D {
        &self.downloader
    }

    /// Run one sync attempt.
    pub fn sync(&self, request: &SyncRequest) -> SyncResultOf<SyncResult> {
        let backend = self.downloader.name();

        ensure_local_dir(&request.local)?;

        let mut log = SyncLog::open(&request.log_path)?;
        log.line(format!(
            "Starting download process ({}): {} -> {}",
            backend,
            request.remote,
            request.local.display()
        ))?;

        info!(
            "[{}] Downloading {} into {}",
            backend,
            request.remote,
            request.local.display()
        );

        let report = match self.downloader.download(
            &request.remote,
            &request.local,
            &request.credentials,
            &mut log,
        ) {
            Ok(report) => report,
            Err(e) => {
                let message = format!("{:#}", e);
                warn!("[{}] Download failed: {}", backend, message);
                if let Err(log_err) = log.line(format!("Error downloading files: {}", message)) {
                    debug!("Cannot record download failure: {}", log_err);
                }
                return Err(SyncError::DownloadFailed {
                    backend: backend.to_string(),
                    message,
                });
            }
        };

        log.line(format!(
            "Download completed successfully ({} downloaded, {} skipped).",
            report.downloaded(),
            report.skipped
        ))?;

        let entries = count_entries(&request.local)?;
        let result = if entries > 0 {
            SyncResult::Populated { entries }
        } else {
            SyncResult::Empty
        };

        match result {
            SyncResult::Populated { entries } => {
                info!(
                    "[{}] {} contains {} entries",
                    backend,
                    request.local.display(),
                    entries
                );
                log.line(format!(
                    "Verified {}: {} entries present.",
                    request.local.display(),
                    entries
                ))?;
            }
            SyncResult::Empty => {
                warn!("[{}] {} is empty after download", backend, request.local.display());
                log.line(format!(
                    "Verification failed: no files downloaded into {}.",
                    request.local.display()
                ))?;
            }
        }

        Ok(result)
    }
}

/// Create `path` and any missing parents. Fails if `path` exists and is not
/// a directory.
pub fn ensure_local_dir(path: &Path) -> SyncResultOf<()> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(SyncError::InvalidLocalPath {
            path: path.to_path_buf(),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            fs::create_dir_all(path).map_err(|e| SyncError::io(path, e))
        }
        Err(e) => Err(SyncError::io(path, e)),
    }
}

/// Number of directory entries (files, folders, links) directly in `path`.
pub fn count_entries(path: &Path) -> SyncResultOf<usize> {
    let mut count = 0;
    for entry in fs::read_dir(path).map_err(|e| SyncError::io(path, e))? {
        entry.map_err(|e| SyncError::io(path, e))?;
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::DownloadReport;
    use std::cell::Cell;
    use tempfile::TempDir;

    fn request(temp_dir: &TempDir) -> SyncRequest {
        SyncRequest {
            remote: RemoteFolder::new("/engineering_simulations_pipeline").unwrap(),
            local: temp_dir.path().join("data").join("input"),
            credentials: Credentials::new("key", "secret", "token").unwrap(),
            log_path: temp_dir.path().join("sync.log"),
        }
    }

    #[test]
    fn test_ensure_local_dir_is_idempotent() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("a").join("b").join("c");

        ensure_local_dir(&path)?;
        ensure_local_dir(&path)?;
        assert!(path.is_dir());
        Ok(())
    }

    #[test]
    fn test_ensure_local_dir_rejects_regular_file() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("not-a-dir");
        std::fs::write(&path, b"x")?;

        let err = ensure_local_dir(&path).unwrap_err();
        assert!(matches!(err, SyncError::InvalidLocalPath { .. }));
        Ok(())
    }

    #[test]
    fn test_populated_result() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let req = request(&temp_dir);

        let guard = SyncGuard::new(
            |_: &RemoteFolder,
             local: &Path,
             _: &Credentials,
             log: &mut SyncLog|
             -> anyhow::Result<DownloadReport> {
                std::fs::write(local.join("flow_data.json"), b"{}")?;
                log.line("Downloaded flow_data.json")?;
                Ok(DownloadReport {
                    files: vec!["flow_data.json".to_string()],
                    skipped: 0,
                })
            },
        );

        let result = guard.sync(&req)?;
        assert_eq!(result, SyncResult::Populated { entries: 1 });
        assert_eq!(result.exit_code(), 0);
        Ok(())
    }

    #[test]
    fn test_empty_result() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let req = request(&temp_dir);

        let guard = SyncGuard::new(
            |_: &RemoteFolder,
             _: &Path,
             _: &Credentials,
             _: &mut SyncLog|
             -> anyhow::Result<DownloadReport> {
                Ok(DownloadReport::default())
            },
        );

        let result = guard.sync(&req)?;
        assert_eq!(result, SyncResult::Empty);
        assert_eq!(result.exit_code(), 1);
        assert!(req.local.is_dir());

        let log = std::fs::read_to_string(&req.log_path)?;
        assert!(log.contains("no files downloaded"));
        Ok(())
    }

    #[test]
    fn test_download_failure_skips_inspection() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let req = request(&temp_dir);

        // Leaves a partial file behind, then fails
        let guard = SyncGuard::new(
            |_: &RemoteFolder,
             local: &Path,
             _: &Credentials,
             _: &mut SyncLog|
             -> anyhow::Result<DownloadReport> {
                std::fs::write(local.join("partial.vtk"), b"...")?;
                anyhow::bail!("connection reset")
            },
        );

        let err = guard.sync(&req).unwrap_err();
        match err {
            SyncError::DownloadFailed { backend, message } => {
                assert_eq!(backend, "custom");
                assert!(message.contains("connection reset"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let log = std::fs::read_to_string(&req.log_path)?;
        assert!(log.contains("Error downloading files: connection reset"));
        assert!(!log.contains("Verified"));
        Ok(())
    }

    #[test]
    fn test_invalid_local_path_does_not_download() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let mut req = request(&temp_dir);
        req.local = temp_dir.path().join("file.txt");
        std::fs::write(&req.local, b"x")?;

        let calls = Cell::new(0);
        let guard = SyncGuard::new(
            |_: &RemoteFolder,
             _: &Path,
             _: &Credentials,
             _: &mut SyncLog|
             -> anyhow::Result<DownloadReport> {
                calls.set(calls.get() + 1);
                Ok(DownloadReport::default())
            },
        );

        let err = guard.sync(&req).unwrap_err();
        assert!(matches!(err, SyncError::InvalidLocalPath { .. }));
        assert_eq!(calls.get(), 0);
        Ok(())
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_download_failure_survives_unwritable_log() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let req = request(&temp_dir);

        // Every write to /dev/full fails with ENOSPC
        let guard = SyncGuard::new(
            |_: &RemoteFolder,
             _: &Path,
             _: &Credentials,
             log: &mut SyncLog|
             -> anyhow::Result<DownloadReport> {
                *log = SyncLog::open(Path::new("/dev/full"))?;
                anyhow::bail!("401 Unauthorized")
            },
        );

        let err = guard.sync(&req).unwrap_err();
        assert!(
            matches!(err, SyncError::DownloadFailed { ref message, .. } if message.contains("401")),
            "unexpected error: {err:?}"
        );
        Ok(())
    }
}
