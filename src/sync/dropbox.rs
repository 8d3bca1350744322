//! Dropbox HTTP API provider.
//!
//! Auth uses the long-lived refresh token: every provider instance trades it
//! for a short-lived access token once, on first use.
//!
//! Endpoints used:
//! - `oauth2/token` (refresh_token grant)
//! - `files/list_folder` + `files/list_folder/continue`
//! - `files/download` (content host, `Dropbox-API-Arg` header)
//! - `files/delete_v2`

use crate::config::DropboxSettings;
use crate::credentials::Credentials;
use crate::journal::SyncLog;
use crate::remote::RemoteFolder;
use crate::sync::provider::{DownloadReport, RemoteDownloader, RemoteFile, RemotePruner};
use crate::sync::safe_file_name;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info};

/// Response from the token endpoint
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Serialize)]
struct ListFolderRequest<'a> {
    path: &'a str,
    recursive: bool,
}

#[derive(Debug, Serialize)]
struct ListFolderContinueRequest<'a> {
    cursor: &'a str,
}

#[derive(Debug, Serialize)]
struct PathArg<'a> {
    path: &'a str,
}

#[derive(Debug, Deserialize)]
struct ListFolderResponse {
    entries: Vec<Metadata>,
    cursor: String,
    has_more: bool,
}

/// Folder entry metadata, tagged by `.tag`.
#[derive(Debug, Deserialize)]
#[serde(tag = ".tag", rename_all = "lowercase")]
enum Metadata {
    File {
        name: String,
        #[serde(default)]
        path_lower: Option<String>,
    },
    Folder {
        name: String,
    },
    Deleted {
        name: String,
    },
}

/// Dropbox provider backed by a blocking HTTP client.
pub struct DropboxProvider {
    client: reqwest::blocking::Client,
    token_url: String,
    api_url: String,
    content_url: String,
    access_token: Mutex<Option<String>>,
}

impl DropboxProvider {
    pub fn new(settings: &DropboxSettings) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(concat!("syncguard/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Cannot build HTTP client")?;

        Ok(Self {
            client,
            token_url: settings.token_url.clone(),
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            content_url: settings.content_url.trim_end_matches('/').to_string(),
            access_token: Mutex::new(None),
        })
    }

    /// Exchange the refresh token for an access token, once per provider.
    fn access_token(&self, credentials: &Credentials) -> Result<String> {
        let mut cached = self
            .access_token
            .lock()
            .map_err(|_| anyhow::anyhow!("Access token cache poisoned"))?;

        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }

        debug!("[Dropbox] Refreshing access token");
        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", credentials.refresh_token()),
                ("client_id", credentials.app_key()),
                ("client_secret", credentials.app_secret()),
            ])
            .send()
            .context("Cannot reach Dropbox token endpoint")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            bail!("Failed to refresh access token ({}): {}", status, body);
        }

        let token: TokenResponse = response
            .json()
            .context("Cannot parse access token response")?;

        *cached = Some(token.access_token.clone());
        Ok(token.access_token)
    }

    /// POST a JSON body to an RPC endpoint and decode the JSON reply.
    fn rpc<B, R>(&self, endpoint: &str, body: &B, token: &str) -> Result<R>
    where
        B: Serialize,
        R: for<'de> Deserialize<'de>,
    {
        let url = format!("{}/{}", self.api_url, endpoint);
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(body)
            .send()
            .with_context(|| format!("Cannot reach Dropbox endpoint {}", endpoint))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            bail!("Dropbox {} returned {}: {}", endpoint, status, body);
        }

        response
            .json()
            .with_context(|| format!("Cannot parse response from {}", endpoint))
    }

    /// All entries directly under `remote`, following pagination.
    fn list_folder(&self, remote: &RemoteFolder, token: &str) -> Result<Vec<Metadata>> {
        let mut page: ListFolderResponse = self.rpc(
            "files/list_folder",
            &ListFolderRequest {
                path: remote.api_path(),
                recursive: false,
            },
            token,
        )?;

        let mut entries = std::mem::take(&mut page.entries);
        while page.has_more {
            page = self.rpc(
                "files/list_folder/continue",
                &ListFolderContinueRequest {
                    cursor: &page.cursor,
                },
                token,
            )?;
            entries.append(&mut page.entries);
        }

        Ok(entries)
    }

    /// Stream one file to `target`.
    fn download_file(&self, path: &str, target: &Path, token: &str) -> Result<u64> {
        let url = format!("{}/files/download", self.content_url);
        let arg = serde_json::to_string(&PathArg { path })?;

        let mut response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .header("Dropbox-API-Arg", arg)
            .send()
            .with_context(|| format!("Cannot download {}", path))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            bail!("Dropbox download of {} returned {}: {}", path, status, body);
        }

        let mut file = File::create(target)
            .with_context(|| format!("Cannot create {}", target.display()))?;
        let bytes = response
            .copy_to(&mut file)
            .with_context(|| format!("Cannot write {}", target.display()))?;

        Ok(bytes)
    }
}

fn entry_path(remote: &RemoteFolder, name: &str, path_lower: Option<String>) -> String {
    path_lower.unwrap_or_else(|| remote.child(name))
}

impl RemoteDownloader for DropboxProvider {
    fn name(&self) -> &'static str {
        "dropbox"
    }

    fn download(
        &self,
        remote: &RemoteFolder,
        local: &Path,
        credentials: &Credentials,
        log: &mut SyncLog,
    ) -> Result<DownloadReport> {
        let token = self.access_token(credentials)?;
        let entries = self.list_folder(remote, &token)?;

        info!("[Dropbox] {} entries under {}", entries.len(), remote);

        let mut report = DownloadReport::default();
        for entry in entries {
            match entry {
                Metadata::File { name, path_lower } => {
                    let file_name = safe_file_name(&name)?;
                    let target = local.join(file_name);
                    let path = entry_path(remote, &name, path_lower);

                    let bytes = self.download_file(&path, &target, &token)?;
                    log.line(format!(
                        "Downloaded {} to {} ({} bytes)",
                        name,
                        target.display(),
                        bytes
                    ))?;
                    info!("[Dropbox] Downloaded {}", name);
                    report.files.push(name);
                }
                Metadata::Folder { name } | Metadata::Deleted { name } => {
                    debug!("[Dropbox] Skipping non-file entry {}", name);
                    report.skipped += 1;
                }
            }
        }

        Ok(report)
    }
}

impl RemotePruner for DropboxProvider {
    fn name(&self) -> &'static str {
        "dropbox"
    }

    fn list_files(
        &self,
        remote: &RemoteFolder,
        credentials: &Credentials,
    ) -> Result<Vec<RemoteFile>> {
        let token = self.access_token(credentials)?;
        let files = self
            .list_folder(remote, &token)?
            .into_iter()
            .filter_map(|entry| match entry {
                Metadata::File { name, path_lower } => Some(RemoteFile {
                    path: entry_path(remote, &name, path_lower),
                    name,
                }),
                _ => None,
            })
            .collect();
        Ok(files)
    }

    fn delete_file(&self, file: &RemoteFile, credentials: &Credentials) -> Result<()> {
        let token = self.access_token(credentials)?;
        let _: serde_json::Value =
            self.rpc("files/delete_v2", &PathArg { path: &file.path }, &token)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_tags() -> Result<()> {
        let json = r#"{
            "entries": [
                {".tag": "file", "name": "flow_data.json", "path_lower": "/sim/flow_data.json", "size": 12},
                {".tag": "folder", "name": "runs", "path_lower": "/sim/runs"},
                {".tag": "file", "name": "Model.step"}
            ],
            "cursor": "AAE",
            "has_more": false
        }"#;

        let page: ListFolderResponse = serde_json::from_str(json)?;
        assert_eq!(page.entries.len(), 3);
        assert!(!page.has_more);

        let remote = RemoteFolder::new("/sim")?;
        match &page.entries[2] {
            Metadata::File { name, path_lower } => {
                assert_eq!(
                    entry_path(&remote, name, path_lower.clone()),
                    "/sim/Model.step"
                );
            }
            other => panic!("unexpected entry: {other:?}"),
        }
        assert!(matches!(page.entries[1], Metadata::Folder { .. }));
        Ok(())
    }

    #[test]
    fn test_download_arg_header() -> Result<()> {
        let arg = serde_json::to_string(&PathArg {
            path: "/sim/flow_data.json",
        })?;
        assert_eq!(arg, r#"{"path":"/sim/flow_data.json"}"#);
        Ok(())
    }

    #[test]
    fn test_provider_trims_base_urls() -> Result<()> {
        let settings = DropboxSettings {
            api_url: "https://api.example.test/2/".to_string(),
            content_url: "https://content.example.test/2/".to_string(),
            ..DropboxSettings::default()
        };
        let provider = DropboxProvider::new(&settings)?;
        assert_eq!(provider.api_url, "https://api.example.test/2");
        assert_eq!(provider.content_url, "https://content.example.test/2");
        Ok(())
    }
}
