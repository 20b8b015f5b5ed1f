//! CLI for the sitemerge sitemap merger.

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sitemerge_core::{config, interrupt, lock, logging};
use std::path::PathBuf;

use commands::{run_merge, run_validate, MergeArgs};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "sitemerge")]
#[command(
    about = "Merge a latest-articles sitemap into a persistent master sitemap",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Fetch the remote sitemap and merge new articles into the local one.
    Run {
        /// Config file (default: ~/.config/sitemerge/config.toml if present).
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
        /// Override the remote sitemap URL.
        #[arg(long, value_name = "URL")]
        remote_url: Option<String>,
        /// Override the local master sitemap path.
        #[arg(long, value_name = "PATH")]
        local_path: Option<PathBuf>,
        /// Report what would change without writing anything.
        #[arg(long)]
        dry_run: bool,
    },

    /// Parse a sitemap file and report how many valid URLs it holds.
    Validate {
        /// Path to the sitemap file.
        path: PathBuf,
    },
}

/// Log the interruption, let an in-progress file replacement finish, drop
/// the run lock, exit 1.
fn setup_interrupt_handler() -> Result<()> {
    ctrlc::set_handler(|| {
        tracing::info!("process interrupted by user");
        let state = interrupt::global();
        state.request();
        let _held = state.wait_for_critical();
        lock::release_active();
        std::process::exit(1);
    })
    .context("failed to set Ctrl+C handler")
}

impl Cli {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Run {
                config: config_path,
                remote_url,
                local_path,
                dry_run,
            } => {
                let mut cfg = config::load(config_path.as_deref())?;
                if let Some(url) = remote_url {
                    cfg.remote_url = url;
                }
                if let Some(path) = local_path {
                    cfg.local_path = path;
                }

                if let Err(e) = logging::init_logging(cfg.log_path.as_deref()) {
                    logging::init_logging_stderr();
                    tracing::warn!("log file unavailable, logging to stderr only: {:#}", e);
                }
                setup_interrupt_handler()?;
                tracing::debug!("loaded config: {:?}", cfg);

                run_merge(&cfg, MergeArgs { dry_run })?;
            }
            CliCommand::Validate { path } => {
                logging::init_logging_stderr();
                run_validate(&path)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
