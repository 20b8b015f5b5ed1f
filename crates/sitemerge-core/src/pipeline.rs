//! One merge run: fetch, parse, read local, merge, write.

use anyhow::{bail, Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::config::MergeConfig;
use crate::fetch::SitemapSource;
use crate::interrupt;
use crate::lock::RunLock;
use crate::merge;
use crate::record::UrlRecord;
use crate::sitemap::{self, WriteReport};

/// Whether a run may touch the local file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    Write,
    /// Fetch, parse and merge, report the result, write nothing.
    DryRun,
}

/// How a successful run ended. Every variant maps to exit code 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The merged sitemap was written.
    Written {
        report: WriteReport,
        added: usize,
        updated: usize,
    },
    /// Nothing new upstream; the local file was left alone.
    NoChanges { candidates: usize },
    /// Dry run: what would have been written.
    DryRun {
        path: PathBuf,
        urls: usize,
        added: usize,
        updated: usize,
    },
}

/// Read and parse the local master sitemap.
///
/// A missing file means no prior state. An unreadable or unparseable file is
/// logged and also treated as empty.
pub fn read_local(path: &Path) -> Vec<UrlRecord> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!("{} does not exist, a new one will be created", path.display());
            return Vec::new();
        }
        Err(e) => {
            tracing::error!("error reading local sitemap {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    match sitemap::parse_sitemap(&content) {
        Ok(records) => {
            tracing::info!("local sitemap read with {} URLs", records.len());
            records
        }
        Err(e) => {
            tracing::error!("error parsing local sitemap {}: {:#}", path.display(), e);
            Vec::new()
        }
    }
}

/// Run the merge pipeline once.
///
/// Fatal conditions (fetch failure, remote sitemap unparseable or without a
/// single valid URL, write failure, lock held elsewhere) are returned as errors
/// and leave the local file untouched.
pub fn run(config: &MergeConfig, source: &dyn SitemapSource, mode: RunMode) -> Result<RunOutcome> {
    let local_path = config.local_path.as_path();
    tracing::info!("starting update of {}", local_path.display());

    let _lock = if config.lock && mode == RunMode::Write {
        Some(RunLock::acquire(local_path)?)
    } else {
        None
    };

    let remote_xml = source
        .fetch()
        .context("could not obtain the remote sitemap")?;
    interrupt::global().check()?;

    let remote = sitemap::parse_sitemap(&remote_xml)
        .with_context(|| format!("remote sitemap {} is not valid XML", source.describe()))?;
    if remote.is_empty() {
        bail!("remote sitemap {} contains no valid URLs", source.describe());
    }

    let local = read_local(local_path);

    let merged = merge::merge(&remote, &local);
    if merged.is_noop() {
        tracing::info!("no new articles found, nothing to write");
        return Ok(RunOutcome::NoChanges {
            candidates: merged.candidates,
        });
    }

    if mode == RunMode::DryRun {
        tracing::info!(
            "dry run: would write {} URLs to {} ({} new, {} updated)",
            merged.records.len(),
            local_path.display(),
            merged.added,
            merged.updated
        );
        return Ok(RunOutcome::DryRun {
            path: local_path.to_path_buf(),
            urls: merged.records.len(),
            added: merged.added,
            updated: merged.updated,
        });
    }

    let report = {
        let _critical = interrupt::global().enter_critical()?;
        sitemap::write_sitemap(local_path, &merged.records, config.max_urls)
            .context("error writing the updated sitemap")?
    };
    tracing::info!("update completed successfully");

    Ok(RunOutcome::Written {
        report,
        added: merged.added,
        updated: merged.updated,
    })
}
