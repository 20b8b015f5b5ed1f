//! Error for a single fetch attempt, kept typed so it can be classified before conversion to anyhow.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    /// Curl reported an error (timeout, connection, DNS, etc.).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// Response status other than 200.
    #[error("HTTP {0}")]
    Http(u32),
    /// Body was not valid UTF-8.
    #[error("response body is not valid UTF-8: {0}")]
    Decode(#[from] std::string::FromUtf8Error),
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Curl(e) if e.is_operation_timedout())
    }
}
