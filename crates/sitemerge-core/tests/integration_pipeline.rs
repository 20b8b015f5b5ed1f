//! Integration tests: full merge runs against a local HTTP server.

mod common;

use common::log_capture::LogCapture;
use common::sitemap_server::{self, Reply};
use sitemerge_core::config::MergeConfig;
use sitemerge_core::fetch::HttpSource;
use sitemerge_core::pipeline::{self, RunMode, RunOutcome};
use sitemerge_core::sitemap::{backup_path, parse_sitemap, SITEMAP_NS};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::tempdir;

fn urlset(entries: &[(&str, &str)]) -> String {
    let mut xml = format!(r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="{SITEMAP_NS}">"#);
    for (loc, lastmod) in entries {
        xml.push_str(&format!(
            "<url><loc>{loc}</loc><lastmod>{lastmod}</lastmod><changefreq>daily</changefreq><priority>0.8</priority></url>"
        ));
    }
    xml.push_str("</urlset>");
    xml
}

fn config(dir: &Path, remote_url: &str) -> MergeConfig {
    let mut cfg = MergeConfig {
        remote_url: remote_url.to_string(),
        local_path: dir.join("sitemap-general.xml"),
        log_path: None,
        request_timeout_secs: 0.3,
        ..MergeConfig::default()
    };
    cfg.retry.base_delay_secs = 0.01;
    cfg
}

#[test]
fn merges_remote_into_existing_local_file() {
    let server = sitemap_server::start(urlset(&[
        ("https://blog.example.com/", "2024-06-03T00:00:00"),
        ("https://blog.example.com/a", "2024-06-01T00:00:00"),
        ("https://blog.example.com/b", "2024-06-02T00:00:00"),
    ]));
    let dir = tempdir().unwrap();
    let cfg = config(dir.path(), &server.url);
    let previous = urlset(&[("https://blog.example.com/a", "2024-01-01T00:00:00")]);
    fs::write(&cfg.local_path, &previous).unwrap();

    let outcome = pipeline::run(&cfg, &HttpSource::from_config(&cfg), RunMode::Write).unwrap();
    assert!(matches!(outcome, RunOutcome::Written { added: 1, updated: 1, .. }));

    let merged = parse_sitemap(&fs::read_to_string(&cfg.local_path).unwrap()).unwrap();
    let locs: Vec<_> = merged.iter().map(|r| r.loc.as_str()).collect();
    assert_eq!(locs, vec!["https://blog.example.com/b", "https://blog.example.com/a"]);
    assert_eq!(merged[1].lastmod, "2024-06-01T00:00:00");
    assert_eq!(fs::read_to_string(backup_path(&cfg.local_path)).unwrap(), previous);
}

#[test]
fn fetch_timeouts_leave_local_file_untouched() {
    let server = sitemap_server::start_script(vec![Reply::Hang(Duration::from_secs(3))]);
    let dir = tempdir().unwrap();
    let cfg = config(dir.path(), &server.url);
    fs::write(&cfg.local_path, "previous").unwrap();

    let logs = LogCapture::default();
    let result = logs.run(|| pipeline::run(&cfg, &HttpSource::from_config(&cfg), RunMode::Write));

    assert!(result.is_err());
    assert_eq!(server.hits(), 3);
    assert_eq!(fs::read_to_string(&cfg.local_path).unwrap(), "previous");
    assert!(!backup_path(&cfg.local_path).exists());

    let text = logs.contents();
    assert!(text.contains("attempt 1/3"), "{text}");
    assert!(text.contains("attempt 3/3"), "{text}");
    assert!(text.contains("timeout on attempt 1"), "{text}");
}

#[test]
fn creates_local_file_when_missing() {
    let server = sitemap_server::start(urlset(&[("https://blog.example.com/first", "2024-06-01")]));
    let dir = tempdir().unwrap();
    let cfg = config(dir.path(), &server.url);

    pipeline::run(&cfg, &HttpSource::from_config(&cfg), RunMode::Write).unwrap();

    let merged = parse_sitemap(&fs::read_to_string(&cfg.local_path).unwrap()).unwrap();
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].loc, "https://blog.example.com/first");
    assert!(!backup_path(&cfg.local_path).exists());
}

#[test]
fn repeated_run_is_a_noop() {
    let server = sitemap_server::start(urlset(&[("https://blog.example.com/first", "2024-06-01")]));
    let dir = tempdir().unwrap();
    let cfg = config(dir.path(), &server.url);
    let source = HttpSource::from_config(&cfg);

    pipeline::run(&cfg, &source, RunMode::Write).unwrap();
    let outcome = pipeline::run(&cfg, &source, RunMode::Write).unwrap();
    assert_eq!(outcome, RunOutcome::NoChanges { candidates: 1 });
    assert!(!backup_path(&cfg.local_path).exists());
}

#[test]
fn invalid_entries_are_logged_and_dropped() {
    let body = format!(
        r#"<urlset xmlns="{SITEMAP_NS}">
             <url><loc>not-a-url</loc></url>
             <url><loc>https://blog.example.com/ok</loc><lastmod>someday</lastmod></url>
           </urlset>"#
    );
    let server = sitemap_server::start(body);
    let dir = tempdir().unwrap();
    let cfg = config(dir.path(), &server.url);

    let logs = LogCapture::default();
    logs.run(|| pipeline::run(&cfg, &HttpSource::from_config(&cfg), RunMode::Write))
        .unwrap();

    let merged = parse_sitemap(&fs::read_to_string(&cfg.local_path).unwrap()).unwrap();
    assert_eq!(merged.len(), 1);
    assert_ne!(merged[0].lastmod, "someday");

    let text = logs.contents();
    assert!(text.contains("invalid URL in element 1"), "{text}");
    assert!(text.contains("invalid lastmod for https://blog.example.com/ok"), "{text}");
}

#[test]
fn run_without_upstream_lastmod_is_idempotent() {
    let body = format!(
        r#"<urlset xmlns="{SITEMAP_NS}"><url><loc>https://blog.example.com/undated</loc></url></urlset>"#
    );
    let server = sitemap_server::start(body);
    let dir = tempdir().unwrap();
    let cfg = config(dir.path(), &server.url);
    let source = HttpSource::from_config(&cfg);

    pipeline::run(&cfg, &source, RunMode::Write).unwrap();
    let first = fs::read_to_string(&cfg.local_path).unwrap();

    // Let the clock move past the one-second resolution of generated lastmods.
    std::thread::sleep(Duration::from_millis(1100));
    let outcome = pipeline::run(&cfg, &source, RunMode::Write).unwrap();

    assert_eq!(outcome, RunOutcome::NoChanges { candidates: 1 });
    assert_eq!(fs::read_to_string(&cfg.local_path).unwrap(), first);
    assert!(!backup_path(&cfg.local_path).exists());
}

#[test]
fn unparseable_local_file_is_logged_as_error() {
    let server = sitemap_server::start(urlset(&[("https://blog.example.com/first", "2024-06-01")]));
    let dir = tempdir().unwrap();
    let cfg = config(dir.path(), &server.url);
    fs::write(&cfg.local_path, "<urlset><url>").unwrap();

    let logs = LogCapture::default();
    logs.run(|| pipeline::run(&cfg, &HttpSource::from_config(&cfg), RunMode::Write))
        .unwrap();

    let text = logs.contents();
    assert!(
        text.lines()
            .any(|l| l.contains("ERROR") && l.contains("error parsing local sitemap")),
        "{text}"
    );
    assert_eq!(
        fs::read_to_string(backup_path(&cfg.local_path)).unwrap(),
        "<urlset><url>"
    );
}
