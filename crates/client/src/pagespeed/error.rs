//! PageSpeed client error types.
//!
//! These never leave the performance source: each one becomes a degraded
//! score with its message recorded as `pageSpeedError`.

use std::sync::Arc;

/// Errors from the PageSpeed Insights API client.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PageSpeedError {
    /// Non-2xx response from the API.
    #[error("API returned {status}")]
    HttpError { status: u16 },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response parse error.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for PageSpeedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { PageSpeedError::Timeout } else { PageSpeedError::Network(Arc::new(err)) }
    }
}
