//! Run command: one fetch-merge-write pass.

use anyhow::Result;
use sitemerge_core::config::MergeConfig;
use sitemerge_core::fetch::HttpSource;
use sitemerge_core::pipeline::{self, RunMode, RunOutcome};

#[derive(Debug, Clone, Copy, Default)]
pub struct MergeArgs {
    pub dry_run: bool,
}

/// Merge the remote sitemap into the local one and print a one-line summary.
pub fn run_merge(cfg: &MergeConfig, args: MergeArgs) -> Result<()> {
    let mode = if args.dry_run {
        RunMode::DryRun
    } else {
        RunMode::Write
    };
    let source = HttpSource::from_config(cfg);

    match pipeline::run(cfg, &source, mode)? {
        RunOutcome::Written {
            report,
            added,
            updated,
        } => println!(
            "{}: {} URLs ({} new, {} updated)",
            report.path.display(),
            report.urls,
            added,
            updated
        ),
        RunOutcome::NoChanges { .. } => println!("{}: up to date", cfg.local_path.display()),
        RunOutcome::DryRun {
            path,
            urls,
            added,
            updated,
        } => println!(
            "{}: would write {} URLs ({} new, {} updated)",
            path.display(),
            urls,
            added,
            updated
        ),
    }
    Ok(())
}
