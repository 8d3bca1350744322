//! Config module - tool settings (syncguard.toml) and the orchestrator flag.
//!
//! Settings file contains:
//! - Default backend
//! - Dropbox endpoints and HTTP timeout
//! - Rclone binary and remote name
//!
//! The orchestrator flag is a separate JSON file owned by the surrounding
//! automation. `sync` never reads it.

use crate::sync::BackendKind;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default location of the orchestrator flag, relative to the repository.
pub const DEFAULT_ORCHESTRATOR_CONFIG: &str = "config/orchestrator_config.json";

/// Dropbox HTTP API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropboxSettings {
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_content_url")]
    pub content_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_token_url() -> String {
    "https://api.dropbox.com/oauth2/token".to_string()
}

fn default_api_url() -> String {
    "https://api.dropboxapi.com/2".to_string()
}

fn default_content_url() -> String {
    "https://content.dropboxapi.com/2".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

impl Default for DropboxSettings {
    fn default() -> Self {
        Self {
            token_url: default_token_url(),
            api_url: default_api_url(),
            content_url: default_content_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Rclone settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RcloneSettings {
    /// Path to the rclone binary (default: next to syncguard, then PATH)
    #[serde(default)]
    pub binary: Option<PathBuf>,
    /// Name of the environment-defined remote
    #[serde(default = "default_remote_name")]
    pub remote_name: String,
}

fn default_remote_name() -> String {
    "syncguard".to_string()
}

impl Default for RcloneSettings {
    fn default() -> Self {
        Self {
            binary: None,
            remote_name: default_remote_name(),
        }
    }
}

/// Main settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Backend used when `--backend` is not given
    #[serde(default)]
    pub backend: BackendKind,

    #[serde(default)]
    pub dropbox: DropboxSettings,

    #[serde(default)]
    pub rclone: RcloneSettings,
}

/// Get default config directory (~/.config/syncguard/).
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("syncguard"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get default settings file path.
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("syncguard.toml")
}

impl Settings {
    /// Load settings from file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file: {}", path.display()))?;

        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Cannot parse config file: {}", path.display()))?;

        Ok(settings)
    }

    /// Load from an explicit path, else the default path if it exists,
    /// else defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let path = default_config_path();
                if path.exists() {
                    Self::load(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Save settings to file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).with_context(|| "Cannot serialize config to TOML")?;

        std::fs::write(path, content)
            .with_context(|| format!("Cannot write config file: {}", path.display()))?;

        Ok(())
    }
}

/// External enable/disable switch for the simulation pipeline.
///
/// Keys other than `enabled` are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorFlag {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_enabled() -> bool {
    true
}

impl Default for OrchestratorFlag {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            extra: serde_json::Map::new(),
        }
    }
}

impl OrchestratorFlag {
    /// Load the flag file. A missing file reads as enabled.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read orchestrator config: {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Cannot parse orchestrator config: {}", path.display()))
    }

    /// Write the flag file (2-space indented JSON).
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut content = serde_json::to_string_pretty(self)
            .with_context(|| "Cannot serialize orchestrator config")?;
        content.push('\n');

        std::fs::write(path, content)
            .with_context(|| format!("Cannot write orchestrator config: {}", path.display()))
    }

    /// Load, set `enabled`, save. Returns the previous value.
    pub fn set(path: &Path, enabled: bool) -> Result<bool> {
        let mut flag = Self::load(path)?;
        let previous = flag.enabled;
        flag.enabled = enabled;
        flag.save(path)?;
        Ok(previous)
    }
}
