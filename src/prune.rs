//! Selective deletion of files in the remote folder between and after runs.

use crate::credentials::Credentials;
use crate::error::{SyncError, SyncResultOf};
use crate::journal::SyncLog;
use crate::remote::RemoteFolder;
use crate::sync::RemotePruner;
use clap::ValueEnum;
use std::path::Path;
use tracing::{info, warn};

/// Which files survive a prune.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PrunePolicy {
    /// Between resolution runs: geometry, flow input, resolution advice and
    /// the run archive stay
    #[default]
    Interim,
    /// After the last run: resolution advice is removed too
    Final,
}

impl PrunePolicy {
    const FINAL_KEEP: [&'static str; 2] = ["flow_data.json", "navier_stokes_runs.zip"];
    const ADVICE_FILE: &'static str = "geometry_resolution_advice.json";

    /// Whether a file with this name is kept.
    pub fn keeps(&self, name: &str) -> bool {
        if name.ends_with(".step") || Self::FINAL_KEEP.iter().any(|keep| *keep == name) {
            return true;
        }
        matches!(self, Self::Interim) && name == Self::ADVICE_FILE
    }
}

/// Counts from one prune.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub deleted: usize,
    pub kept: usize,
    pub failed: usize,
}

impl PruneReport {
    pub fn exit_code(&self) -> u8 {
        if self.failed > 0 {
            1
        } else {
            0
        }
    }
}

/// Delete every file directly under `remote` that `policy` does not keep.
///
/// A listing failure aborts the prune. Individual delete failures are
/// logged, counted and skipped.
pub fn prune<P: RemotePruner + ?Sized>(
    pruner: &P,
    remote: &RemoteFolder,
    credentials: &Credentials,
    policy: PrunePolicy,
    log_path: &Path,
) -> SyncResultOf<PruneReport> {
    let backend = pruner.name();
    let mut log = SyncLog::open(log_path)?;
    log.line(format!(
        "Starting selective deletion ({}, {:?} policy): {}",
        backend, policy, remote
    ))?;

    let files = match pruner.list_files(remote, credentials) {
        Ok(files) => files,
        Err(e) => {
            let message = format!("{:#}", e);
            log.line(format!("Error during deletion: {}", message))?;
            return Err(SyncError::PruneFailed {
                backend: backend.to_string(),
                message,
            });
        }
    };

    let mut report = PruneReport::default();
    for file in &files {
        if policy.keeps(&file.name) {
            report.kept += 1;
            continue;
        }

        match pruner.delete_file(file, credentials) {
            Ok(()) => {
                info!("[{}] Deleted {}", backend, file.path);
                log.line(format!("Deleted file: {}", file.path))?;
                report.deleted += 1;
            }
            Err(e) => {
                warn!("[{}] Failed to delete {}: {:#}", backend, file.path, e);
                log.line(format!("Failed to delete file: {}, error: {:#}", file.path, e))?;
                report.failed += 1;
            }
        }
    }

    log.line(format!(
        "Selective deletion completed: {} deleted, {} kept, {} failed.",
        report.deleted, report.kept, report.failed
    ))?;

    Ok(report)
}
