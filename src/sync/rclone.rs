use crate::config::RcloneSettings;
use crate::credentials::Credentials;
use crate::journal::SyncLog;
use crate::remote::RemoteFolder;
use crate::sync::provider::{DownloadReport, RemoteDownloader, RemoteFile, RemotePruner};
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tracing::{debug, info};

#[cfg(windows)]
use std::os::windows::process::CommandExt;

/// Windows flag to prevent console window from appearing
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x08000000;

/// Rclone sync provider.
/// Wraps the rclone command line tool with a Dropbox remote that is
/// configured entirely through `RCLONE_CONFIG_<NAME>_*` environment
/// variables, so credentials never show up in argv or on disk.
pub struct RcloneProvider {
    rclone_path: PathBuf,
    remote_name: String,
}

impl RcloneProvider {
    pub fn new(settings: &RcloneSettings) -> Self {
        Self {
            rclone_path: settings.binary.clone().unwrap_or_else(Self::find_rclone),
            remote_name: settings.remote_name.clone(),
        }
    }

    /// Locate rclone binary.
    fn find_rclone() -> PathBuf {
        // 1. Check next to our own executable
        if let Ok(current_exe) = std::env::current_exe() {
            if let Some(bin_dir) = current_exe.parent() {
                let bundled_path = if cfg!(windows) {
                    bin_dir.join("rclone.exe")
                } else {
                    bin_dir.join("rclone")
                };
                if bundled_path.exists() {
                    return bundled_path;
                }
            }
        }

        // 2. Fallback to system PATH
        debug!("[Rclone] Falling back to system PATH for rclone");
        if cfg!(windows) {
            PathBuf::from("rclone.exe")
        } else {
            PathBuf::from("rclone")
        }
    }

    pub fn rclone_path(&self) -> &Path {
        &self.rclone_path
    }

    pub fn remote_name(&self) -> &str {
        &self.remote_name
    }

    /// Prefix for this remote's config environment variables.
    fn env_prefix(&self) -> String {
        let normalized: String = self
            .remote_name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("RCLONE_CONFIG_{}", normalized)
    }

    /// Environment that defines the Dropbox remote for a single invocation.
    fn remote_env(&self, credentials: &Credentials) -> Result<Vec<(String, String)>> {
        let prefix = self.env_prefix();
        // Empty access token with a zero expiry makes rclone refresh on first use
        let token = serde_json::json!({
            "access_token": "",
            "token_type": "bearer",
            "refresh_token": credentials.refresh_token(),
            "expiry": "0001-01-01T00:00:00Z",
        });

        Ok(vec![
            (format!("{}_TYPE", prefix), "dropbox".to_string()),
            (
                format!("{}_CLIENT_ID", prefix),
                credentials.app_key().to_string(),
            ),
            (
                format!("{}_CLIENT_SECRET", prefix),
                credentials.app_secret().to_string(),
            ),
            (
                format!("{}_TOKEN", prefix),
                serde_json::to_string(&token).context("Cannot encode rclone token")?,
            ),
        ])
    }

    /// Get full remote URL (remote:path).
    fn remote_url(&self, path: &str) -> String {
        format!("{}:{}", self.remote_name, path)
    }

    /// Run rclone and return its raw output, whatever the exit status.
    fn spawn(&self, args: &[&str], credentials: &Credentials) -> Result<Output> {
        let mut cmd = Command::new(&self.rclone_path);
        cmd.args(args)
            .envs(self.remote_env(credentials)?)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // On Windows, prevent console window from appearing
        #[cfg(windows)]
        cmd.creation_flags(CREATE_NO_WINDOW);

        debug!("[Rclone] {} {}", self.rclone_path.display(), args.join(" "));
        cmd.output()
            .with_context(|| format!("Cannot execute {}", self.rclone_path.display()))
    }

    /// Run rclone command and return stdout.
    fn run_rclone(&self, args: &[&str], credentials: &Credentials) -> Result<String> {
        let output = self.spawn(args, credentials)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("Rclone failed ({}): {}", output.status, stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl RemoteDownloader for RcloneProvider {
    fn name(&self) -> &'static str {
        "rclone"
    }

    fn download(
        &self,
        remote: &RemoteFolder,
        local: &Path,
        credentials: &Credentials,
        log: &mut SyncLog,
    ) -> Result<DownloadReport> {
        let remote_url = self.remote_url(remote.as_str());
        let local_path = local.to_string_lossy();

        info!("[Rclone] Pulling from {} to {}...", remote_url, local_path);

        // rclone copy remote:path local_path
        let output = self.spawn(
            &[
                "copy",
                &remote_url,
                &local_path,
                "--max-depth",
                "1",
                "--verbose",
                "--stats-one-line",
            ],
            credentials,
        )?;

        // rclone reports progress on stderr
        let stderr = String::from_utf8_lossy(&output.stderr);
        log.block(&stderr)?;

        if !output.status.success() {
            bail!(
                "Rclone copy exited with {}: {}",
                output.status,
                stderr.lines().last().unwrap_or("").trim()
            );
        }

        Ok(DownloadReport {
            files: parse_copied_files(&stderr),
            skipped: 0,
        })
    }
}

impl RemotePruner for RcloneProvider {
    fn name(&self) -> &'static str {
        "rclone"
    }

    fn list_files(
        &self,
        remote: &RemoteFolder,
        credentials: &Credentials,
    ) -> Result<Vec<RemoteFile>> {
        let remote_url = self.remote_url(remote.as_str());
        let output = self.run_rclone(
            &["lsf", "--files-only", "--max-depth", "1", &remote_url],
            credentials,
        )?;

        Ok(output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|name| RemoteFile {
                name: name.to_string(),
                path: remote.child(name),
            })
            .collect())
    }

    fn delete_file(&self, file: &RemoteFile, credentials: &Credentials) -> Result<()> {
        let target = self.remote_url(&file.path);
        self.run_rclone(&["deletefile", &target], credentials)?;
        Ok(())
    }
}

/// Pull file names out of `rclone copy --verbose` output, e.g.
/// `2024/01/01 12:00:00 INFO  : flow_data.json: Copied (new)`.
fn parse_copied_files(stderr: &str) -> Vec<String> {
    stderr
        .lines()
        .filter_map(|line| {
            let (_, rest) = line.split_once("INFO  : ")?;
            let (name, status) = rest.rsplit_once(": ")?;
            status.starts_with("Copied").then(|| name.to_string())
        })
        .collect()
}
