//! Audit data model shared by the engine, the cache, and the HTTP boundary.
//!
//! An [`AuditResult`] is produced once per cache miss and then handed out as
//! a copy on every cache hit. The `details` bag is kept typed per signal
//! source and only merged into a flat JSON object at the wire boundary
//! (see [`AuditDetails::to_wire`]).

pub mod details;
pub mod score;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use details::{
    AuditDetails, ContactInfo, DesignSignals, KeyPages, LighthouseMetrics, PageDetails, PageEvidence,
    PerformanceDetails, SeoChecks,
};
pub use score::{Category, SubScore};

/// One unit of work for the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRequest {
    /// Website of the business, if it has one. Blank strings count as absent.
    #[serde(default)]
    pub url: Option<String>,
    /// Caller-supplied identifier echoed back on the result.
    #[serde(default)]
    pub correlation_id: String,
}

impl AuditRequest {
    pub fn new(url: Option<impl Into<String>>, correlation_id: impl Into<String>) -> Self {
        Self { url: url.map(Into::into), correlation_id: correlation_id.into() }
    }

    /// The trimmed URL, or `None` when missing or blank.
    pub fn target(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }
}

/// Outcome of one audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    /// The business has no website; nothing was fetched.
    NoUrl,
    /// Both signal sources returned, possibly degraded.
    Audited,
    /// Orchestration failed before any sub-score existed.
    Error,
}

/// Display tier of a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    NoWebsite,
    Poor,
    Fair,
    Good,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResult {
    pub correlation_id: String,
    pub site_score: u8,
    pub status: AuditStatus,
    #[serde(default)]
    pub sub_scores: BTreeMap<String, SubScore>,
    #[serde(default)]
    pub details: AuditDetails,
    #[serde(default)]
    pub normalized_url: Option<String>,
}

impl AuditResult {
    /// Result for a business without a website.
    pub fn no_url(correlation_id: impl Into<String>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            site_score: 0,
            status: AuditStatus::NoUrl,
            sub_scores: BTreeMap::new(),
            details: AuditDetails { message: Some("No website found".into()), ..Default::default() },
            normalized_url: None,
        }
    }

    /// Result for an audit that could not produce any sub-score.
    pub fn failed(correlation_id: impl Into<String>, normalized_url: Option<String>, error: impl Into<String>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            site_score: 0,
            status: AuditStatus::Error,
            sub_scores: BTreeMap::new(),
            details: AuditDetails { error: Some(error.into()), ..Default::default() },
            normalized_url,
        }
    }

    pub fn is_audited(&self) -> bool {
        self.status == AuditStatus::Audited
    }

    /// Re-key a (possibly cached) result for another caller.
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = correlation_id.into();
        self
    }

    pub fn rating(&self) -> Rating {
        match (self.status, self.site_score) {
            (AuditStatus::NoUrl, _) => Rating::NoWebsite,
            (_, 0..=40) => Rating::Poor,
            (_, 41..=70) => Rating::Fair,
            _ => Rating::Good,
        }
    }

    /// Whether this business is worth a sales call at the given cutoff.
    ///
    /// A business without a website always is. A failed audit never is,
    /// since its zero score says nothing about the site.
    pub fn is_lead(&self, threshold: u8) -> bool {
        match self.status {
            AuditStatus::NoUrl => true,
            AuditStatus::Audited => self.site_score < threshold,
            AuditStatus::Error => false,
        }
    }
}

/// Where an emitted result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    /// Resolved without any lookup (no website).
    Immediate,
    Cache,
    Live,
}

/// Progress of one stream invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineProgress {
    pub completed: usize,
    pub total: usize,
}

impl PipelineProgress {
    pub fn is_complete(&self) -> bool {
        self.completed == self.total
    }
}
