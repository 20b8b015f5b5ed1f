//! Namespace-aware sitemap reader.

use anyhow::{bail, Result};
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use std::collections::HashSet;

use super::SITEMAP_NS;
use crate::record::{
    is_valid_lastmod, is_valid_loc, is_valid_priority, now_lastmod, UrlRecord, DEFAULT_CHANGEFREQ,
    DEFAULT_PRIORITY,
};

#[derive(Debug, Clone, Copy)]
enum Field {
    Loc,
    Lastmod,
    Changefreq,
    Priority,
}

impl Field {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"loc" => Some(Field::Loc),
            b"lastmod" => Some(Field::Lastmod),
            b"changefreq" => Some(Field::Changefreq),
            b"priority" => Some(Field::Priority),
            _ => None,
        }
    }
}

/// Child text of one `<url>` element, before validation.
#[derive(Debug, Default)]
struct RawEntry {
    loc: Option<String>,
    lastmod: Option<String>,
    changefreq: Option<String>,
    priority: Option<String>,
}

impl RawEntry {
    fn slot(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Loc => &mut self.loc,
            Field::Lastmod => &mut self.lastmod,
            Field::Changefreq => &mut self.changefreq,
            Field::Priority => &mut self.priority,
        }
    }

    /// Opens `field` for capture. False if it already appeared (first occurrence wins).
    fn open(&mut self, field: Field) -> bool {
        let slot = self.slot(field);
        if slot.is_some() {
            return false;
        }
        *slot = Some(String::new());
        true
    }

    /// Validate and fill defaults. `index` is the 1-based `<url>` position, for logs.
    fn finish(self, index: usize) -> Option<UrlRecord> {
        let loc = non_empty(self.loc);
        let loc = match loc {
            Some(loc) if is_valid_loc(&loc) => loc,
            other => {
                tracing::warn!("invalid URL in element {}: {:?}", index, other);
                return None;
            }
        };

        let (lastmod, lastmod_defaulted) = match non_empty(self.lastmod) {
            Some(v) if is_valid_lastmod(&v) => (v, false),
            Some(v) => {
                tracing::warn!("invalid lastmod for {}: {}", loc, v);
                (now_lastmod(), true)
            }
            None => (now_lastmod(), true),
        };

        let changefreq = non_empty(self.changefreq).unwrap_or_else(|| DEFAULT_CHANGEFREQ.to_string());

        let priority = match non_empty(self.priority) {
            Some(p) if is_valid_priority(&p) => p,
            Some(p) => {
                tracing::warn!("invalid priority for {}: {}", loc, p);
                DEFAULT_PRIORITY.to_string()
            }
            None => DEFAULT_PRIORITY.to_string(),
        };

        Some(UrlRecord {
            loc,
            lastmod,
            changefreq,
            priority,
            lastmod_defaulted,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn in_sitemap_ns(ns: &ResolveResult) -> bool {
    matches!(ns, ResolveResult::Bound(Namespace(uri)) if *uri == SITEMAP_NS.as_bytes())
}

/// Records read from a sitemap plus how many `<url>` elements it had.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseReport {
    pub records: Vec<UrlRecord>,
    /// Every `<url>` element seen, valid or not.
    pub elements: usize,
}

impl ParseReport {
    /// Elements dropped for a bad `loc` or as duplicates.
    pub fn dropped(&self) -> usize {
        self.elements.saturating_sub(self.records.len())
    }
}

/// Parse sitemap XML into valid, unique records.
///
/// Only `<url>` children of the root bound to the sitemap namespace are read.
/// Entries with a missing or invalid `loc` are dropped; a bad `lastmod` or
/// `priority` is repaired with a default. Malformed XML is an error.
pub fn parse_sitemap(xml: &str) -> Result<Vec<UrlRecord>> {
    parse_sitemap_report(xml).map(|report| report.records)
}

/// Like [`parse_sitemap`], also reporting the number of `<url>` elements.
pub fn parse_sitemap_report(xml: &str) -> Result<ParseReport> {
    let mut reader = NsReader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut depth = 0usize;
    let mut saw_root = false;
    let mut entry: Option<RawEntry> = None;
    let mut field: Option<Field> = None;
    let mut elements = 0usize;
    let mut records = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    let mut push = |raw: RawEntry, index: usize, records: &mut Vec<UrlRecord>| {
        if let Some(record) = raw.finish(index) {
            if seen.insert(record.loc.clone()) {
                records.push(record);
            } else {
                tracing::warn!("duplicate URL dropped: {}", record.loc);
            }
        }
    };

    loop {
        let step = reader
            .read_resolved_event()
            .map(|(ns, event)| (in_sitemap_ns(&ns), event));
        let (in_ns, event) = match step {
            Ok(v) => v,
            Err(e) => bail!(
                "malformed XML near byte {}: {}",
                reader.buffer_position(),
                e
            ),
        };

        match event {
            Event::Start(e) => {
                depth += 1;
                let local = e.local_name();
                match depth {
                    1 => saw_root = true,
                    2 if in_ns && local.as_ref() == b"url" => {
                        elements += 1;
                        entry = Some(RawEntry::default());
                    }
                    3 if in_ns => {
                        if let (Some(raw), Some(f)) =
                            (entry.as_mut(), Field::from_local_name(local.as_ref()))
                        {
                            if raw.open(f) {
                                field = Some(f);
                            }
                        }
                    }
                    _ => {}
                }
            }
            Event::Empty(e) => {
                let local = e.local_name();
                match depth + 1 {
                    1 => saw_root = true,
                    2 if in_ns && local.as_ref() == b"url" => {
                        elements += 1;
                        push(RawEntry::default(), elements, &mut records);
                    }
                    3 if in_ns => {
                        if let (Some(raw), Some(f)) =
                            (entry.as_mut(), Field::from_local_name(local.as_ref()))
                        {
                            raw.open(f);
                        }
                    }
                    _ => {}
                }
            }
            Event::Text(t) if depth == 3 => {
                if let (Some(raw), Some(f)) = (entry.as_mut(), field) {
                    let text = t.unescape()?;
                    if let Some(slot) = raw.slot(f).as_mut() {
                        slot.push_str(&text);
                    }
                }
            }
            Event::CData(c) if depth == 3 => {
                if let (Some(raw), Some(f)) = (entry.as_mut(), field) {
                    if let Some(slot) = raw.slot(f).as_mut() {
                        slot.push_str(&String::from_utf8_lossy(&c));
                    }
                }
            }
            Event::End(_) => {
                match depth {
                    3 => field = None,
                    2 => {
                        if let Some(raw) = entry.take() {
                            push(raw, elements, &mut records);
                        }
                    }
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        bail!("document has no root element");
    }
    if depth != 0 {
        bail!("unexpected end of document: {} element(s) left open", depth);
    }

    tracing::info!(
        "parsed {} valid URLs out of {} elements",
        records.len(),
        elements
    );
    Ok(ParseReport { records, elements })
}
