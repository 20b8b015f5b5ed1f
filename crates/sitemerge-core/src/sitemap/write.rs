//! Sitemap serialization and the backup-then-replace file write.

use anyhow::{Context, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::SITEMAP_NS;
use crate::record::UrlRecord;

/// Result of a successful [`write_sitemap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReport {
    pub path: PathBuf,
    pub urls: usize,
    /// Previous file, moved aside. None if there was nothing to back up.
    pub backup: Option<PathBuf>,
}

/// `<path>.backup`
pub fn backup_path(path: &Path) -> PathBuf {
    let mut s: OsString = path.as_os_str().to_owned();
    s.push(".backup");
    PathBuf::from(s)
}

fn write_text_element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Serialize records as an indented sitemap document with an XML declaration.
pub fn render_sitemap(records: &[UrlRecord]) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::with_capacity(256 * (records.len() + 1)), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(
        BytesStart::new("urlset").with_attributes([("xmlns", SITEMAP_NS)]),
    ))?;
    for record in records {
        writer.write_event(Event::Start(BytesStart::new("url")))?;
        write_text_element(&mut writer, "loc", &record.loc)?;
        write_text_element(&mut writer, "lastmod", &record.lastmod)?;
        write_text_element(&mut writer, "changefreq", &record.changefreq)?;
        write_text_element(&mut writer, "priority", &record.priority)?;
        writer.write_event(Event::End(BytesEnd::new("url")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("urlset")))?;

    let mut xml = String::from_utf8(writer.into_inner()).context("sitemap is not valid UTF-8")?;
    xml.push('\n');
    Ok(xml)
}

/// Write `records` to `path`, keeping the previous file as `<path>.backup`.
///
/// The document is serialized and written to a temp file in the same directory
/// first; only then is the old file renamed to the backup and the temp file
/// renamed into place. A failure before that point leaves `path` untouched.
/// More than `max_urls` records only logs a warning.
pub fn write_sitemap(path: &Path, records: &[UrlRecord], max_urls: usize) -> Result<WriteReport> {
    if records.len() > max_urls {
        tracing::warn!(
            "sitemap exceeds the recommended limit ({} > {})",
            records.len(),
            max_urls
        );
    }

    let xml = render_sitemap(records).context("serialize sitemap")?;

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("create temp file in {}", dir.display()))?;
    tmp.write_all(xml.as_bytes())
        .with_context(|| format!("write temp file {}", tmp.path().display()))?;
    tmp.as_file().sync_all().context("sync temp file")?;

    let backup = if path.exists() {
        let perms = fs::metadata(path)
            .with_context(|| format!("stat {}", path.display()))?
            .permissions();
        tmp.as_file()
            .set_permissions(perms)
            .context("copy permissions to temp file")?;

        let backup = backup_path(path);
        fs::rename(path, &backup).with_context(|| {
            format!("failed to rename {} to {}", path.display(), backup.display())
        })?;
        tracing::info!("backup created: {}", backup.display());
        Some(backup)
    } else {
        set_default_permissions(tmp.as_file())?;
        None
    };

    tmp.persist(path)
        .with_context(|| format!("failed to move new sitemap into {}", path.display()))?;

    tracing::info!(
        "updated sitemap saved to {} ({} URLs)",
        path.display(),
        records.len()
    );

    Ok(WriteReport {
        path: path.to_path_buf(),
        urls: records.len(),
        backup,
    })
}

/// Temp files are created 0600; a published sitemap should be world-readable.
#[cfg(unix)]
fn set_default_permissions(file: &fs::File) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o644))
        .context("set sitemap permissions")
}

#[cfg(not(unix))]
fn set_default_permissions(_file: &fs::File) -> Result<()> {
    Ok(())
}
