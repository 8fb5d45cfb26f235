//! Route handlers and the JSON shape they share.

pub mod audit;
pub mod cache;
pub mod health;
pub mod stream;

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use sitescout_core::audit::SubScore;
use sitescout_core::{AuditResult, AuditStatus, PipelineProgress, ResultSource};

/// An [`AuditResult`] as consumers see it: details flattened into one
/// object, plus where the result came from and, on streams, progress.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditPayload {
    pub correlation_id: String,
    pub site_score: u8,
    pub status: AuditStatus,
    pub sub_scores: BTreeMap<String, SubScore>,
    pub details: Map<String, Value>,
    pub normalized_url: Option<String>,
    pub source: ResultSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<PipelineProgress>,
}

impl AuditPayload {
    pub fn new(result: AuditResult, source: ResultSource) -> Self {
        Self {
            details: result.details.to_wire(),
            correlation_id: result.correlation_id,
            site_score: result.site_score,
            status: result.status,
            sub_scores: result.sub_scores,
            normalized_url: result.normalized_url,
            source,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: PipelineProgress) -> Self {
        self.progress = Some(progress);
        self
    }
}
