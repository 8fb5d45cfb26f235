//! The audit engine: scorer, single-URL orchestrator and stream pipeline.

pub mod orchestrator;
pub mod pipeline;
pub mod scorer;

pub use orchestrator::Auditor;
pub use pipeline::{AuditEngine, PipelineEvent};
pub use scorer::{score, site_score};
