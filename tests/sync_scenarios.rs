//! Scenario tests for SyncGuard with an in-memory remote store.

use anyhow::{bail, Result};
use std::cell::Cell;
use std::collections::BTreeMap;
use std::path::Path;
use syncguard::{
    Credentials, DownloadReport, RemoteDownloader, RemoteFolder, SyncError, SyncGuard, SyncLog,
    SyncRequest, SyncResult,
};
use tempfile::TempDir;

/// Remote store double: folder path -> (file name -> contents).
#[derive(Default)]
struct FakeStore {
    folders: BTreeMap<String, Vec<(&'static str, &'static str)>>,
    fail_with: Option<&'static str>,
    calls: Cell<usize>,
}

impl FakeStore {
    fn with_folder(mut self, path: &str, files: Vec<(&'static str, &'static str)>) -> Self {
        self.folders.insert(path.to_string(), files);
        self
    }
}

impl RemoteDownloader for FakeStore {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn download(
        &self,
        remote: &RemoteFolder,
        local: &Path,
        _credentials: &Credentials,
        log: &mut SyncLog,
    ) -> Result<DownloadReport> {
        self.calls.set(self.calls.get() + 1);
        if let Some(reason) = self.fail_with {
            bail!("{}", reason);
        }

        let mut report = DownloadReport::default();
        for (name, contents) in self.folders.get(remote.as_str()).into_iter().flatten() {
            std::fs::write(local.join(name), contents.as_bytes())?;
            log.line(format!("Downloaded {}", name))?;
            report.files.push(name.to_string());
        }
        Ok(report)
    }
}

fn request(temp_dir: &TempDir, remote: &str) -> SyncRequest {
    SyncRequest {
        remote: RemoteFolder::new(remote).unwrap(),
        local: temp_dir.path().join("data").join("testing-input-output"),
        credentials: Credentials::new("app-key", "app-secret", "refresh-token").unwrap(),
        log_path: temp_dir.path().join("download.log"),
    }
}

#[test]
fn test_three_files_into_absent_directory() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = FakeStore::default().with_folder(
        "/engineering_simulations_pipeline",
        vec![
            ("impeller.step", "ISO-10303-21;"),
            ("flow_data.json", r#"{"inlet_velocity": 2.5}"#),
            ("geometry_resolution_advice.json", "{}"),
        ],
    );
    let req = request(&temp_dir, "/engineering_simulations_pipeline");
    assert!(!req.local.exists());

    let result = SyncGuard::new(store).sync(&req)?;

    assert_eq!(result, SyncResult::Populated { entries: 3 });
    assert_eq!(result.exit_code(), 0);
    assert_eq!(std::fs::read_dir(&req.local)?.count(), 3);
    Ok(())
}

#[test]
fn test_empty_remote_folder() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = FakeStore::default().with_folder("/engineering_simulations_pipeline", vec![]);
    let req = request(&temp_dir, "/engineering_simulations_pipeline");

    let result = SyncGuard::new(store).sync(&req)?;

    assert_eq!(result, SyncResult::Empty);
    assert_eq!(result.exit_code(), 1);
    assert!(req.local.is_dir());
    assert_eq!(std::fs::read_dir(&req.local)?.count(), 0);
    Ok(())
}

#[test]
fn test_repeated_sync_is_idempotent() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = FakeStore::default().with_folder("/sim", vec![("flow_data.json", "{}")]);
    let req = request(&temp_dir, "/sim");

    let guard = SyncGuard::new(store);
    let first = guard.sync(&req)?;
    let second = guard.sync(&req)?;

    assert_eq!(first, second);
    assert_eq!(guard.downloader().calls.get(), 2);

    let log = std::fs::read_to_string(&req.log_path)?;
    assert_eq!(log.matches("Starting download process").count(), 2);
    Ok(())
}

#[test]
fn test_failed_download_is_not_inspected() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = FakeStore {
        fail_with: Some("Failed to refresh access token"),
        ..FakeStore::default()
    };
    let req = request(&temp_dir, "/sim");

    // Stale file from an earlier run must not turn a failure into Populated
    std::fs::create_dir_all(&req.local)?;
    std::fs::write(req.local.join("stale.json"), b"{}")?;

    let err = SyncGuard::new(store).sync(&req).unwrap_err();
    assert!(matches!(err, SyncError::DownloadFailed { ref backend, .. } if backend == "fake"));
    Ok(())
}

#[test]
fn test_credentials_never_reach_the_log() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = FakeStore::default().with_folder("/sim", vec![("a.step", "x")]);
    let req = request(&temp_dir, "/sim");

    SyncGuard::new(store).sync(&req)?;

    let log = std::fs::read_to_string(&req.log_path)?;
    assert!(!log.contains("app-key"));
    assert!(!log.contains("app-secret"));
    assert!(!log.contains("refresh-token"));
    Ok(())
}
