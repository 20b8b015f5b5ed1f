use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Retry policy parameters (optional `[retry]` section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of fetch attempts (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (1.0 gives 1s, 2s, 4s, ...).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 1.0,
            max_delay_secs: 30,
        }
    }
}

/// Configuration for one merge run, loaded from `~/.config/sitemerge/config.toml`
/// or an explicit path. Every field has a default so partial files are fine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Sitemap holding only the latest articles.
    pub remote_url: String,
    /// Master sitemap that accumulates the full site history.
    pub local_path: PathBuf,
    /// Append-only log file. None = stderr only.
    pub log_path: Option<PathBuf>,
    /// Recommended maximum number of URLs in one sitemap. Exceeding it only warns.
    pub max_urls: usize,
    /// Total timeout for one HTTP attempt, in seconds.
    pub request_timeout_secs: f64,
    /// Hold `<local_path>.lock` for the duration of a run.
    pub lock: bool,
    pub retry: RetryConfig,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            remote_url: "https://es.hgaruna.org/sitemap.xml".to_string(),
            local_path: PathBuf::from("sistemapGNRAL.xml"),
            log_path: Some(PathBuf::from("sitemap_update.log")),
            max_urls: 50_000,
            request_timeout_secs: 15.0,
            lock: true,
            retry: RetryConfig::default(),
        }
    }
}

impl MergeConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.request_timeout_secs.max(0.0))
    }

    /// Backoff policy derived from the `[retry]` section.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts.max(1),
            base_delay: Duration::from_secs_f64(self.retry.base_delay_secs.max(0.0)),
            max_delay: Duration::from_secs(self.retry.max_delay_secs),
        }
    }
}

/// Existing `~/.config/sitemerge/config.toml`, if any.
pub fn config_path() -> Result<Option<PathBuf>> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("sitemerge")?;
    Ok(xdg_dirs.find_config_file("config.toml"))
}

/// Load configuration.
///
/// An explicit path must exist. Without one, the XDG config file is used when
/// present and built-in defaults otherwise.
pub fn load(explicit: Option<&Path>) -> Result<MergeConfig> {
    if let Some(path) = explicit {
        return load_from_path(path);
    }

    match config_path()? {
        Some(path) => load_from_path(&path),
        None => {
            tracing::debug!("no config file found, using defaults");
            Ok(MergeConfig::default())
        }
    }
}

fn load_from_path(path: &Path) -> Result<MergeConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("read config: {}", path.display()))?;
    let cfg: MergeConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    tracing::debug!("loaded config from {}", path.display());
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_values() {
        let cfg = MergeConfig::default();
        assert_eq!(cfg.remote_url, "https://es.hgaruna.org/sitemap.xml");
        assert_eq!(cfg.local_path, PathBuf::from("sistemapGNRAL.xml"));
        assert_eq!(cfg.log_path, Some(PathBuf::from("sitemap_update.log")));
        assert_eq!(cfg.max_urls, 50_000);
        assert_eq!(cfg.request_timeout(), Duration::from_secs(15));
        assert!(cfg.lock);
        assert_eq!(cfg.retry.max_attempts, 3);
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = MergeConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: MergeConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.remote_url, cfg.remote_url);
        assert_eq!(parsed.local_path, cfg.local_path);
        assert_eq!(parsed.max_urls, cfg.max_urls);
        assert_eq!(parsed.retry.max_attempts, cfg.retry.max_attempts);
    }

    #[test]
    fn config_toml_partial_uses_defaults() {
        let toml = r#"
            remote_url = "https://blog.example.org/latest.xml"
            local_path = "public/sitemap.xml"
        "#;
        let cfg: MergeConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.remote_url, "https://blog.example.org/latest.xml");
        assert_eq!(cfg.local_path, PathBuf::from("public/sitemap.xml"));
        assert_eq!(cfg.max_urls, 50_000);
        assert_eq!(cfg.retry.max_attempts, 3);
        assert!((cfg.retry.base_delay_secs - 1.0).abs() < 1e-9);
    }

    #[test]
    fn config_toml_retry_section() {
        let toml = r#"
            request_timeout_secs = 10
            lock = false

            [retry]
            max_attempts = 5
            base_delay_secs = 0.5
        "#;
        let cfg: MergeConfig = toml::from_str(toml).unwrap();
        assert!(!cfg.lock);
        assert_eq!(cfg.request_timeout(), Duration::from_secs(10));
        assert_eq!(cfg.retry.max_attempts, 5);
        assert_eq!(cfg.retry.max_delay_secs, 30);

        let policy = cfg.retry_policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.base_delay, Duration::from_millis(500));
        assert_eq!(policy.max_delay, Duration::from_secs(30));
    }

    #[test]
    fn retry_policy_never_allows_zero_attempts() {
        let mut cfg = MergeConfig::default();
        cfg.retry.max_attempts = 0;
        assert_eq!(cfg.retry_policy().max_attempts, 1);
    }

    #[test]
    fn load_explicit_path() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "max_urls = 10").unwrap();
        f.flush().unwrap();
        let cfg = load(Some(f.path())).unwrap();
        assert_eq!(cfg.max_urls, 10);
    }

    #[test]
    fn load_explicit_path_missing_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn load_explicit_path_invalid_toml_is_error() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "max_urls = [").unwrap();
        f.flush().unwrap();
        assert!(load(Some(f.path())).is_err());
    }
}
