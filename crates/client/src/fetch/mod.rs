//! HTTP fetch client for audited pages.
//!
//! ### URL Normalization
//! - Trim whitespace, ensure scheme (default: `https`)
//! - Lowercase host, remove fragments
//! - Preserve query string
//!
//! ### Limits
//! - Bounded request timeout (15s for page audits)
//! - Max redirects: 10
//! - Max body bytes: 5MB (configurable)
//!
//! Unlike an API client, a page fetch does not treat non-2xx statuses as
//! failures: an error page is still a page whose HTML can be judged.

pub mod url;

use bytes::{Bytes, BytesMut};
use reqwest::Url;
use reqwest::{Client, StatusCode, header};
use std::time::{Duration, Instant};

pub use url::{UrlError, normalize};

use sitescout_core::{AppConfig, Error};

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string sent with every request
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 15s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 10)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        let app = AppConfig::default();
        Self { user_agent: app.user_agent.clone(), max_bytes: app.max_bytes, timeout: app.fetch_timeout(), max_redirects: 10 }
    }
}

impl FetchConfig {
    /// Page-fetch settings taken from the application config.
    pub fn from_app(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.fetch_timeout(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Response from a fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: StatusCode,
    /// Response body bytes, at most `max_bytes`
    pub bytes: Bytes,
}

impl FetchResponse {
    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// HTTP client for fetching business websites.
#[derive(Debug, Clone)]
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::HttpError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Fetch a URL, returning the body and metadata for any HTTP status.
    ///
    /// The body is read chunk by chunk and abandoned once it passes
    /// `max_bytes`, whether or not the server declared a length.
    pub async fn fetch(&self, url: &Url) -> Result<FetchResponse, Error> {
        let start = Instant::now();
        let max_bytes = self.config.max_bytes;

        let mut response = self
            .http
            .get(url.as_str())
            .header(header::ACCEPT, "text/html,application/xhtml+xml")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::FetchTimeout(format!("{url} did not respond within {:?}", self.config.timeout))
                } else {
                    Error::HttpError(format!("network error: {e}"))
                }
            })?;

        let status = response.status();

        if let Some(len) = response.content_length()
            && len as usize > max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{len} bytes exceeds {max_bytes}")));
        }

        let final_url = response.url().clone();

        let mut body = BytesMut::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| {
            if e.is_timeout() {
                Error::FetchTimeout(format!("reading {url} timed out"))
            } else {
                Error::HttpError(format!("failed to read response: {e}"))
            }
        })? {
            if body.len() + chunk.len() > max_bytes {
                return Err(Error::FetchTooLarge(format!("body exceeds {max_bytes} bytes")));
            }
            body.extend_from_slice(&chunk);
        }
        let bytes = body.freeze();

        tracing::debug!(
            status = status.as_u16(),
            fetch_ms = start.elapsed().as_millis() as u64,
            bytes = bytes.len(),
            "fetched {} -> {}",
            url,
            final_url
        );

        Ok(FetchResponse { final_url, status, bytes })
    }
}
