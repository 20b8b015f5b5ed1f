//! Validate command: parse a sitemap file and report valid and dropped entries.

use anyhow::{Context, Result};
use sitemerge_core::sitemap::{self, ParseReport};
use std::path::Path;

pub fn run_validate(path: &Path) -> Result<ParseReport> {
    let xml = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let report =
        sitemap::parse_sitemap_report(&xml).with_context(|| format!("parse {}", path.display()))?;
    println!("{}", summary(path, &report));
    Ok(report)
}

fn summary(path: &Path, report: &ParseReport) -> String {
    format!(
        "{}: {} valid URLs, {} dropped",
        path.display(),
        report.records.len(),
        report.dropped()
    )
}
