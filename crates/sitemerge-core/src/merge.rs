//! Merge the remote (latest articles) collection into the local master collection.

use std::collections::HashMap;

use crate::record::UrlRecord;

/// Static asset extensions never treated as articles.
const STATIC_EXTENSIONS: &[&str] = &["css", "js", "png", "jpg", "jpeg", "gif", "ico", "pdf"];

/// Outcome of [`merge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    /// Local records plus new candidates, sorted newest first.
    pub records: Vec<UrlRecord>,
    /// Remote records that passed the article filter.
    pub candidates: usize,
    /// Candidates appended because their `loc` was not in the local collection.
    pub added: usize,
    /// Local records whose `lastmod` changed.
    pub updated: usize,
}

impl MergeReport {
    /// True when writing would change nothing.
    pub fn is_noop(&self) -> bool {
        self.candidates == 0 || (self.added == 0 && self.updated == 0)
    }
}

/// True if `loc` looks like article content rather than site infrastructure:
/// not the site root, not a sitemap or robots file, not a static asset.
/// Decided on the URL path, so query strings do not hide an asset extension.
pub fn is_candidate_article(loc: &str) -> bool {
    let url = match url::Url::parse(loc) {
        Ok(u) => u,
        Err(_) => return false,
    };
    let path = url.path();

    // Site root; `/?p=42` style permalinks still count as articles.
    if (path.is_empty() || path == "/") && url.query().is_none() {
        return false;
    }
    if path.ends_with("/sitemap.xml") || path.ends_with("/robots.txt") {
        return false;
    }

    let last = path.rsplit('/').next().unwrap_or_default();
    match last.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => !STATIC_EXTENSIONS
            .iter()
            .any(|s| s.eq_ignore_ascii_case(ext)),
        _ => true,
    }
}

/// Merge `remote` into `local`.
///
/// Every remote candidate already present locally has its `lastmod` replaced
/// (other fields keep their local values) unless the remote value was
/// filled in by the parser; every other candidate is appended.
/// The result is unique by `loc` and sorted by `lastmod`, newest first.
pub fn merge(remote: &[UrlRecord], local: &[UrlRecord]) -> MergeReport {
    let mut records: Vec<UrlRecord> = Vec::with_capacity(local.len() + remote.len());
    let mut index: HashMap<String, usize> = HashMap::with_capacity(local.len() + remote.len());

    for record in local {
        if index.contains_key(&record.loc) {
            continue;
        }
        index.insert(record.loc.clone(), records.len());
        records.push(record.clone());
    }

    let mut candidates = 0;
    let mut added = 0;
    let mut updated = 0;

    for record in remote.iter().filter(|r| is_candidate_article(&r.loc)) {
        candidates += 1;
        match index.get(&record.loc) {
            Some(&i) => {
                let existing = &mut records[i];
                if record.lastmod_defaulted {
                    tracing::debug!("no lastmod upstream for {}, keeping local value", record.loc);
                } else if existing.lastmod != record.lastmod {
                    tracing::info!("existing URL updated: {}", record.loc);
                    existing.lastmod = record.lastmod.clone();
                    updated += 1;
                }
            }
            None => {
                tracing::info!("new URL added: {}", record.loc);
                index.insert(record.loc.clone(), records.len());
                records.push(record.clone());
                added += 1;
            }
        }
    }

    tracing::info!(
        "{} candidate article(s): {} new, {} updated",
        candidates,
        added,
        updated
    );

    sort_by_lastmod_desc(&mut records);

    MergeReport {
        records,
        candidates,
        added,
        updated,
    }
}

/// Stable sort, most recently modified first. Unparseable `lastmod` sorts last.
pub fn sort_by_lastmod_desc(records: &mut [UrlRecord]) {
    records.sort_by_cached_key(|r| std::cmp::Reverse(r.lastmod_instant()));
}
