//! Seams between the orchestrator and the things that measure a site.
//!
//! Every source returns a value, never an error: a failed lookup is turned
//! into fixed fallback scores plus a note in the details, so one unreachable
//! site or API outage cannot stop an audit.

use async_trait::async_trait;
use sitescout_core::audit::{ContactInfo, PageDetails, PerformanceDetails};
use url::Url;

/// Scores used when the performance API cannot be reached or errors.
pub const DEGRADED_PERFORMANCE_SCORE: u8 = 30;

/// Scores used when no API key is configured.
pub const NEUTRAL_PERFORMANCE_SCORE: u8 = 50;

/// Output of a [`PerformanceSource`].
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceSignals {
    pub performance_score: u8,
    pub mobile_score: u8,
    pub details: PerformanceDetails,
}

impl PerformanceSignals {
    /// Fallback after a failed or timed-out API call.
    pub fn degraded(reason: impl Into<String>) -> Self {
        Self {
            performance_score: DEGRADED_PERFORMANCE_SCORE,
            mobile_score: DEGRADED_PERFORMANCE_SCORE,
            details: PerformanceDetails::degraded(reason),
        }
    }

    /// Neutral scores for a deployment without an API key.
    pub fn unconfigured() -> Self {
        Self {
            performance_score: NEUTRAL_PERFORMANCE_SCORE,
            mobile_score: NEUTRAL_PERFORMANCE_SCORE,
            details: PerformanceDetails::degraded("API key not configured, using defaults"),
        }
    }
}

/// Output of a [`PageSource`].
#[derive(Debug, Clone, PartialEq)]
pub struct PageSignals {
    pub ssl: u8,
    pub broken_resources: u8,
    pub key_pages: u8,
    pub modern_design: u8,
    pub seo: u8,
    pub details: PageDetails,
}

impl PageSignals {
    /// Fallback when the page could not be fetched at all.
    ///
    /// SSL gets half credit if the requested URL was at least https.
    pub fn unreachable(url: &Url, reason: impl Into<String>) -> Self {
        Self {
            ssl: if url.scheme() == "https" { 50 } else { 0 },
            broken_resources: 50,
            key_pages: 30,
            modern_design: 30,
            seo: 30,
            details: PageDetails::unreachable(reason),
        }
    }
}

/// Lab performance measurement for a URL.
#[async_trait]
pub trait PerformanceSource: Send + Sync {
    async fn measure(&self, url: &Url) -> PerformanceSignals;
}

/// Direct fetch and static analysis of a URL.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn inspect(&self, url: &Url) -> PageSignals;
}

/// Best-effort scrape of contact details from a business website.
#[async_trait]
pub trait ContactSource: Send + Sync {
    async fn extract(&self, url: &Url) -> ContactInfo;
}
