//! Remote sitemap retrieval.
//!
//! The pipeline only depends on [`SitemapSource`]; [`HttpSource`] is the real
//! implementation, a curl GET wrapped in the retry policy.

mod http;

use anyhow::Result;
use std::time::Duration;

use crate::config::MergeConfig;
use crate::retry::{self, FetchError, RetryPolicy};

pub use http::get_once;

/// Anything that can produce the raw text of the remote sitemap.
pub trait SitemapSource {
    /// Where the sitemap comes from, for log lines.
    fn describe(&self) -> &str;

    fn fetch(&self) -> Result<String>;
}

/// Fetches a sitemap over HTTP with bounded retries and exponential backoff.
#[derive(Debug, Clone)]
pub struct HttpSource {
    pub url: String,
    pub timeout: Duration,
    pub policy: RetryPolicy,
}

impl HttpSource {
    pub fn new(url: impl Into<String>, timeout: Duration, policy: RetryPolicy) -> Self {
        Self {
            url: url.into(),
            timeout,
            policy,
        }
    }

    pub fn from_config(cfg: &MergeConfig) -> Self {
        Self::new(cfg.remote_url.clone(), cfg.request_timeout(), cfg.retry_policy())
    }
}

impl SitemapSource for HttpSource {
    fn describe(&self) -> &str {
        &self.url
    }

    fn fetch(&self) -> Result<String> {
        let max = self.policy.max_attempts;
        let result = retry::run_with_retry(&self.policy, |attempt| {
            tracing::info!(
                "downloading sitemap from {} (attempt {}/{})",
                self.url,
                attempt,
                max
            );
            let outcome = get_once(&self.url, self.timeout);
            match &outcome {
                Ok(body) => tracing::info!("sitemap downloaded ({} characters)", body.chars().count()),
                Err(e) => log_attempt_failure(&self.url, attempt, e),
            }
            outcome
        });

        result.map_err(|e| {
            tracing::error!("giving up on {} after error: {}", self.url, e);
            anyhow::Error::new(e).context(format!("fetch remote sitemap {}", self.url))
        })
    }
}

fn log_attempt_failure(url: &str, attempt: u32, e: &FetchError) {
    if e.is_timeout() {
        tracing::warn!("timeout on attempt {} for {}", attempt, url);
    } else {
        tracing::error!("error on attempt {} for {}: {}", attempt, url, e);
    }
}
