//! Sitemap URL record and field validation.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

pub const DEFAULT_CHANGEFREQ: &str = "daily";
pub const DEFAULT_PRIORITY: &str = "0.8";

/// One `<url>` entry of a sitemap. `loc` is the unique key within a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRecord {
    pub loc: String,
    /// ISO-8601 timestamp, kept verbatim as read so output preserves the source form.
    pub lastmod: String,
    pub changefreq: String,
    pub priority: String,
    /// `lastmod` was missing or invalid in the source and was filled with the
    /// read time. Such a value carries no upstream information.
    pub lastmod_defaulted: bool,
}

impl UrlRecord {
    /// Record with the given `loc` and `lastmod`, other fields at their defaults.
    pub fn new(loc: impl Into<String>, lastmod: impl Into<String>) -> Self {
        Self {
            loc: loc.into(),
            lastmod: lastmod.into(),
            changefreq: DEFAULT_CHANGEFREQ.to_string(),
            priority: DEFAULT_PRIORITY.to_string(),
            lastmod_defaulted: false,
        }
    }

    /// `lastmod` as an instant, for ordering. None if it does not parse.
    pub fn lastmod_instant(&self) -> Option<DateTime<Utc>> {
        parse_lastmod(&self.lastmod)
    }
}

/// True if `loc` parses as an absolute URL with a non-empty scheme and host.
pub fn is_valid_loc(loc: &str) -> bool {
    match url::Url::parse(loc) {
        Ok(u) => !u.scheme().is_empty() && u.host_str().is_some_and(|h| !h.is_empty()),
        Err(_) => false,
    }
}

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const OFFSET_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M%:z", "%Y-%m-%dT%H:%M:%S%.f%z"];

/// Parse an ISO-8601 `lastmod`.
///
/// Accepts RFC 3339 (`Z` or offset), naive date-times (read as UTC), date-times
/// without seconds, and plain dates (midnight UTC).
pub fn parse_lastmod(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

pub fn is_valid_lastmod(value: &str) -> bool {
    parse_lastmod(value).is_some()
}

/// Current time as a sitemap `lastmod` (`YYYY-MM-DDTHH:MM:SS+00:00`).
pub fn now_lastmod() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// True if `value` is a decimal in `[0.0, 1.0]`.
pub fn is_valid_priority(value: &str) -> bool {
    value
        .trim()
        .parse::<f64>()
        .is_ok_and(|p| (0.0..=1.0).contains(&p))
}
