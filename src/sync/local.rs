use crate::credentials::Credentials;
use crate::journal::SyncLog;
use crate::remote::RemoteFolder;
use crate::sync::provider::{DownloadReport, RemoteDownloader, RemoteFile, RemotePruner};
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Local file system provider.
/// Treats the remote folder as a directory on this host (e.g. a mounted
/// share or a fixture tree). Credentials are accepted but not used.
#[derive(Debug, Default, Clone)]
pub struct LocalProvider;

impl LocalProvider {
    pub fn new() -> Self {
        Self
    }

    fn source_dir(remote: &RemoteFolder) -> PathBuf {
        PathBuf::from(remote.raw())
    }

    /// The target may be neither the source folder nor anything below it.
    fn check_disjoint(source: &Path, local: &Path) -> Result<()> {
        let source = source
            .canonicalize()
            .with_context(|| format!("Cannot resolve {}", source.display()))?;
        if !local.exists() {
            fs::create_dir_all(local)?;
        }
        let local = local
            .canonicalize()
            .with_context(|| format!("Cannot resolve {}", local.display()))?;

        if local.starts_with(&source) {
            bail!(
                "Local folder {} is inside source folder {}",
                local.display(),
                source.display()
            );
        }
        Ok(())
    }

    /// Recursive copy helper
    fn copy_dir_all(src: &Path, dst: &Path, log: &mut SyncLog) -> Result<Vec<String>> {
        if !dst.exists() {
            fs::create_dir_all(dst)?;
        }

        let mut copied = Vec::new();
        for entry in fs::read_dir(src)? {
            let entry = entry?;
            let ty = entry.file_type()?;
            let dst_path = dst.join(entry.file_name());

            if ty.is_dir() {
                copied.extend(Self::copy_dir_all(&entry.path(), &dst_path, log)?);
            } else {
                fs::copy(entry.path(), &dst_path).with_context(|| {
                    format!("Cannot copy {} to {}", entry.path().display(), dst_path.display())
                })?;
                let name = entry.file_name().to_string_lossy().to_string();
                log.line(format!("Downloaded {} to {}", name, dst_path.display()))?;
                copied.push(name);
            }
        }
        Ok(copied)
    }
}

impl RemoteDownloader for LocalProvider {
    fn name(&self) -> &'static str {
        "local"
    }

    fn download(
        &self,
        remote: &RemoteFolder,
        local: &Path,
        _credentials: &Credentials,
        log: &mut SyncLog,
    ) -> Result<DownloadReport> {
        let source = Self::source_dir(remote);
        if !source.is_dir() {
            bail!("Source directory does not exist: {}", source.display());
        }

        Self::check_disjoint(&source, local)?;

        info!("[Local] Copying {:?} to {:?}", source, local);
        let files = Self::copy_dir_all(&source, local, log)?;

        Ok(DownloadReport { files, skipped: 0 })
    }
}

impl RemotePruner for LocalProvider {
    fn name(&self) -> &'static str {
        "local"
    }

    fn list_files(
        &self,
        remote: &RemoteFolder,
        _credentials: &Credentials,
    ) -> Result<Vec<RemoteFile>> {
        let source = Self::source_dir(remote);
        let mut files = Vec::new();

        for entry in fs::read_dir(&source)
            .with_context(|| format!("Cannot list {}", source.display()))?
        {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(RemoteFile {
                    name: entry.file_name().to_string_lossy().to_string(),
                    path: entry.path().to_string_lossy().to_string(),
                });
            }
        }

        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    fn delete_file(&self, file: &RemoteFile, _credentials: &Credentials) -> Result<()> {
        fs::remove_file(&file.path).with_context(|| format!("Cannot delete {}", file.path))
    }
}
