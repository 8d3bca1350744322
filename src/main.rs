//! SyncGuard CLI - download, verify, fail fast.
//!
//! Usage:
//!   syncguard sync <remote_folder> <local_folder> <refresh_token> <app_key> <app_secret> <log_file>
//!   syncguard prune <remote_folder> <refresh_token> <app_key> <app_secret> <log_file> [--policy final]
//!   syncguard orchestrator status|enable|disable

use clap::Parser;
use colored::Colorize;
use std::process::ExitCode;
use syncguard::cli::{commands, Cli};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging (stderr, so stdout stays scriptable)
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("syncguard={}", log_level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match commands::run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::from(commands::EXIT_ERROR)
        }
    }
}
