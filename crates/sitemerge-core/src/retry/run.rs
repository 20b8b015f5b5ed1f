//! Retry loop: run a closure until success or policy says stop.

use super::classify;
use super::error::FetchError;
use super::policy::{RetryDecision, RetryPolicy};

/// Runs `f` until it succeeds or the retry policy says to stop.
///
/// `f` receives the 1-based attempt number. On retryable failure, sleeps for the
/// backoff duration then tries again. Returns the last error when giving up.
pub fn run_with_retry<T, F>(policy: &RetryPolicy, mut f: F) -> Result<T, FetchError>
where
    F: FnMut(u32) -> Result<T, FetchError>,
{
    let mut attempt = 1u32;
    loop {
        match f(attempt) {
            Ok(v) => return Ok(v),
            Err(e) => {
                let kind = classify::classify(&e);
                match policy.decide(attempt, kind) {
                    RetryDecision::NoRetry => return Err(e),
                    RetryDecision::RetryAfter(d) => {
                        tracing::info!("waiting {:?} before attempt {}", d, attempt + 1);
                        std::thread::sleep(d);
                        attempt += 1;
                    }
                }
            }
        }
    }
}
