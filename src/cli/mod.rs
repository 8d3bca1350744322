//! CLI definitions and command implementations for SyncGuard.

pub mod commands;

use crate::config::DEFAULT_ORCHESTRATOR_CONFIG;
use crate::prune::PrunePolicy;
use crate::sync::BackendKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// SyncGuard - fetch a remote folder and fail fast when nothing arrived
#[derive(Parser)]
#[command(name = "syncguard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file (default: ~/.config/syncguard/syncguard.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Remote backend (overrides the settings file)
    #[arg(long, global = true, value_enum)]
    pub backend: Option<BackendKind>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download a remote folder and verify the local copy is not empty.
    ///
    /// Empty credential arguments ("") are read from REFRESH_TOKEN, APP_KEY
    /// and APP_SECRET.
    Sync {
        /// Remote folder, e.g. /engineering_simulations_pipeline
        remote_folder: String,
        /// Local directory to fill (created if missing)
        local_folder: PathBuf,
        /// OAuth refresh token
        refresh_token: String,
        /// App key (OAuth client id)
        app_key: String,
        /// App secret (OAuth client secret)
        app_secret: String,
        /// Log file to append diagnostics to
        log_file: PathBuf,
    },

    /// Delete files in the remote folder that the policy does not keep
    Prune {
        /// Remote folder, e.g. /engineering_simulations_pipeline
        remote_folder: String,
        /// OAuth refresh token
        refresh_token: String,
        /// App key (OAuth client id)
        app_key: String,
        /// App secret (OAuth client secret)
        app_secret: String,
        /// Log file to append diagnostics to
        log_file: PathBuf,
        /// Which files survive
        #[arg(long, value_enum, default_value_t = PrunePolicy::Interim)]
        policy: PrunePolicy,
    },

    /// Read or toggle the pipeline's enable flag
    Orchestrator {
        #[command(subcommand)]
        action: OrchestratorAction,

        /// Flag file
        #[arg(long, default_value = DEFAULT_ORCHESTRATOR_CONFIG)]
        path: PathBuf,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorAction {
    /// Print "enabled" or "disabled"
    Status,
    /// Set enabled = true
    Enable,
    /// Set enabled = false
    Disable,
}
