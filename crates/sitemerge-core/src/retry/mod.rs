//! Retry and backoff policy for the remote sitemap fetch.
//!
//! Error classification (timeouts, connection failures, bad status) and the
//! exponential backoff decision live here; the fetcher only supplies a closure
//! for a single attempt.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use error::FetchError;
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
