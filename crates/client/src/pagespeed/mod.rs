//! PageSpeed Insights API client.
//!
//! The performance signal source. One GET per audited URL against
//! `runPagespeed` with the mobile strategy.
//!
//! ### API
//!
//! - **Endpoint**: `https://www.googleapis.com/pagespeedonline/v5/runPagespeed`
//! - **Authentication**: `key` query parameter. Without one no request is
//!   made and both scores are a neutral 50.
//! - **Timeout**: 60s. No retries; a non-2xx, timeout or unreadable body
//!   degrades both scores to 30.
//! - **Normalization**: see [`response`] for how the two scores are derived.

pub mod error;
pub mod response;

pub use error::PageSpeedError;
pub use response::PageSpeedApiResponse;

use async_trait::async_trait;
use reqwest::header;
use sitescout_core::AppConfig;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

use crate::signals::{PerformanceSignals, PerformanceSource};

/// Default endpoint for PageSpeed Insights v5.
const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/pagespeedonline/v5/runPagespeed";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// PageSpeed client configuration.
#[derive(Debug, Clone)]
pub struct PageSpeedConfig {
    /// API key; `None` or empty disables the API entirely.
    pub api_key: Option<String>,
    /// Full endpoint URL.
    pub base_url: String,
    /// Request timeout (default: 60s).
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for PageSpeedConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: AppConfig::default().user_agent,
        }
    }
}

impl PageSpeedConfig {
    pub fn from_app(config: &AppConfig) -> Self {
        Self {
            api_key: config.pagespeed_api_key.clone(),
            base_url: config.pagespeed_url.clone(),
            timeout: config.pagespeed_timeout(),
            user_agent: config.user_agent.clone(),
        }
    }

    fn key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }
}

/// PageSpeed Insights API client.
#[derive(Debug, Clone)]
pub struct PageSpeedClient {
    http: reqwest::Client,
    config: PageSpeedConfig,
}

impl PageSpeedClient {
    /// Create a new PageSpeed client with the given configuration.
    pub fn new(config: PageSpeedConfig) -> Result<Self, PageSpeedError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| PageSpeedError::Network(Arc::new(e)))?;

        Ok(Self { http, config })
    }

    pub fn is_configured(&self) -> bool {
        self.config.key().is_some()
    }

    /// Run one mobile-strategy analysis of `url` with the given key.
    pub async fn run(&self, url: &Url, key: &str) -> Result<PerformanceSignals, PageSpeedError> {
        let start = Instant::now();

        tracing::debug!("requesting PageSpeed analysis for {}", url);

        let http_response = self
            .http
            .get(&self.config.base_url)
            .header(header::ACCEPT, "application/json")
            .query(&[
                ("url", url.as_str()),
                ("key", key),
                ("strategy", "mobile"),
                ("category", "performance"),
                ("category", "accessibility"),
            ])
            .send()
            .await?;

        let status = http_response.status();
        tracing::debug!("PageSpeed API response status: {}", status);

        if !status.is_success() {
            return Err(PageSpeedError::HttpError { status: status.as_u16() });
        }

        let bytes = http_response.bytes().await?;
        let api_response: PageSpeedApiResponse =
            serde_json::from_slice(&bytes).map_err(|e| PageSpeedError::Parse(e.to_string()))?;

        let signals = PerformanceSignals::from(api_response);

        tracing::debug!(
            performance = signals.performance_score,
            mobile = signals.mobile_score,
            "PageSpeed analysis completed in {:?}",
            start.elapsed()
        );

        Ok(signals)
    }
}

#[async_trait]
impl PerformanceSource for PageSpeedClient {
    async fn measure(&self, url: &Url) -> PerformanceSignals {
        let Some(key) = self.config.key() else {
            return PerformanceSignals::unconfigured();
        };

        match self.run(url, key).await {
            Ok(signals) => signals,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "PageSpeed unavailable, using degraded scores");
                PerformanceSignals::degraded(e.to_string())
            }
        }
    }
}
