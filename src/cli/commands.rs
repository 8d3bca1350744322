//! Command implementations for the SyncGuard CLI.
//!
//! Each command returns the process exit status on success; any `Err` is
//! printed by `main` and exits with [`EXIT_ERROR`].
//!
//! Main commands:
//! - sync: download the remote folder, refuse an empty result
//! - prune: delete intermediate files from the remote folder
//! - orchestrator: read or toggle the pipeline enable flag

use crate::cli::{Cli, Commands, OrchestratorAction};
use crate::config::{OrchestratorFlag, Settings};
use crate::credentials::Credentials;
use crate::guard::{SyncGuard, SyncRequest, SyncResult};
use crate::prune::{prune, PrunePolicy, PruneReport};
use crate::remote::RemoteFolder;
use crate::sync::{Backend, RemoteDownloader, RemotePruner};
use anyhow::Result;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Exit status for errors (download failure, bad arguments, I/O).
pub const EXIT_ERROR: u8 = 2;

/// Dispatch a parsed command line.
pub fn run(cli: Cli) -> Result<u8> {
    let settings = Settings::load_or_default(cli.config.as_deref())?;
    let kind = cli.backend.unwrap_or(settings.backend);
    debug!("Using backend: {}", kind);

    match cli.command {
        Commands::Sync {
            remote_folder,
            local_folder,
            refresh_token,
            app_key,
            app_secret,
            log_file,
        } => {
            let request = SyncRequest {
                remote: RemoteFolder::new(&remote_folder)?,
                local: local_folder,
                credentials: Credentials::resolve(&app_key, &app_secret, &refresh_token)?,
                log_path: log_file,
            };
            let backend = Backend::from_settings(kind, &settings)?;
            sync(backend, &request)
        }
        Commands::Prune {
            remote_folder,
            refresh_token,
            app_key,
            app_secret,
            log_file,
            policy,
        } => {
            let remote = RemoteFolder::new(&remote_folder)?;
            let credentials = Credentials::resolve(&app_key, &app_secret, &refresh_token)?;
            let backend = Backend::from_settings(kind, &settings)?;
            prune_remote(&backend, &remote, &credentials, policy, &log_file)
        }
        Commands::Orchestrator { action, path } => orchestrator(action, &path),
    }
}

fn spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Diagnostic printed when a sync finishes with nothing on disk.
pub fn empty_diagnostic(request: &SyncRequest) -> String {
    format!(
        "no files downloaded from {} into {} (see {})",
        request.remote,
        request.local.display(),
        request.log_path.display()
    )
}

/// Run one guarded sync and map the outcome to an exit status.
pub fn sync<D: RemoteDownloader>(downloader: D, request: &SyncRequest) -> Result<u8> {
    let guard = SyncGuard::new(downloader);

    let progress = spinner(format!(
        "Downloading {} via {}...",
        request.remote,
        guard.downloader().name()
    ));
    let outcome = guard.sync(request);
    progress.finish_and_clear();

    let result = outcome?;
    match result {
        SyncResult::Populated { entries } => {
            println!(
                "  {} {} entries in {}",
                "✓".green(),
                entries.to_string().cyan(),
                request.local.display()
            );
        }
        SyncResult::Empty => {
            eprintln!("  {} {}", "✗".red(), empty_diagnostic(request).red().bold());
        }
    }

    Ok(result.exit_code())
}

/// Prune the remote folder and map the report to an exit status.
pub fn prune_remote<P: RemotePruner + ?Sized>(
    pruner: &P,
    remote: &RemoteFolder,
    credentials: &Credentials,
    policy: PrunePolicy,
    log_path: &Path,
) -> Result<u8> {
    let progress = spinner(format!("Pruning {} via {}...", remote, pruner.name()));
    let outcome = prune(pruner, remote, credentials, policy, log_path);
    progress.finish_and_clear();

    let report: PruneReport = outcome?;
    println!(
        "  {} {} deleted, {} kept",
        "✓".green(),
        report.deleted.to_string().cyan(),
        report.kept
    );
    if report.failed > 0 {
        eprintln!(
            "  {} {} deletions failed (see {})",
            "✗".red(),
            report.failed.to_string().red().bold(),
            log_path.display()
        );
    }

    Ok(report.exit_code())
}

/// Read or toggle the orchestrator flag.
pub fn orchestrator(action: OrchestratorAction, path: &Path) -> Result<u8> {
    match action {
        OrchestratorAction::Status => {
            let flag = OrchestratorFlag::load(path)?;
            println!("{}", if flag.enabled { "enabled" } else { "disabled" });
        }
        OrchestratorAction::Enable | OrchestratorAction::Disable => {
            let enabled = action == OrchestratorAction::Enable;
            let previous = OrchestratorFlag::set(path, enabled)?;
            let state = if enabled {
                "enabled".green()
            } else {
                "disabled".yellow()
            };
            if previous == enabled {
                println!("  {} Orchestrator already {}", "✓".green(), state);
            } else {
                println!("  {} Orchestrator {} in {}", "✓".green(), state, path.display());
            }
        }
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::SyncLog;
    use crate::sync::DownloadReport;
    use tempfile::TempDir;

    fn request(temp_dir: &TempDir) -> SyncRequest {
        SyncRequest {
            remote: RemoteFolder::new("/engineering_simulations_pipeline").unwrap(),
            local: temp_dir.path().join("input"),
            credentials: Credentials::new("k", "s", "t").unwrap(),
            log_path: temp_dir.path().join("sync.log"),
        }
    }

    fn download_nothing(
        _: &RemoteFolder,
        _: &Path,
        _: &Credentials,
        _: &mut SyncLog,
    ) -> Result<DownloadReport> {
        Ok(DownloadReport::default())
    }

    fn download_flow_data(
        _: &RemoteFolder,
        local: &Path,
        _: &Credentials,
        _: &mut SyncLog,
    ) -> Result<DownloadReport> {
        std::fs::write(local.join("flow_data.json"), b"{}")?;
        Ok(DownloadReport {
            files: vec!["flow_data.json".to_string()],
            skipped: 0,
        })
    }

    fn download_rejected(
        _: &RemoteFolder,
        _: &Path,
        _: &Credentials,
        _: &mut SyncLog,
    ) -> Result<DownloadReport> {
        anyhow::bail!("Failed to refresh access token (400 Bad Request)")
    }

    #[test]
    fn test_sync_exit_codes() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let req = request(&temp_dir);

        assert_eq!(sync(download_nothing, &req)?, 1);
        assert_eq!(sync(download_flow_data, &req)?, 0);
        Ok(())
    }

    #[test]
    fn test_sync_propagates_download_failure() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let req = request(&temp_dir);

        let err = sync(download_rejected, &req).unwrap_err();
        assert!(err.to_string().contains("download from custom failed"));
        Ok(())
    }

    #[test]
    fn test_empty_diagnostic_mentions_paths() {
        let temp_dir = TempDir::new().unwrap();
        let req = request(&temp_dir);
        let message = empty_diagnostic(&req);
        assert!(message.starts_with("no files downloaded"));
        assert!(message.contains("/engineering_simulations_pipeline"));
    }

    #[test]
    fn test_orchestrator_toggle() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("config").join("orchestrator_config.json");

        assert_eq!(orchestrator(OrchestratorAction::Disable, &path)?, 0);
        assert!(!OrchestratorFlag::load(&path)?.enabled);

        assert_eq!(orchestrator(OrchestratorAction::Enable, &path)?, 0);
        assert!(OrchestratorFlag::load(&path)?.enabled);
        Ok(())
    }
}
