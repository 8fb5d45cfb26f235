//! Client code for sitescout.
//!
//! This crate provides the outbound side of the audit engine: the page fetch
//! pipeline, the two signal sources, the optional contact scraper, and the
//! scorer, orchestrator and stream pipeline that tie them together. It is
//! shared by the server and CLI.

pub mod audit;
pub mod contact;
pub mod fetch;
pub mod inspect;
pub mod pagespeed;
pub mod signals;

pub use audit::{AuditEngine, Auditor, PipelineEvent, score};
pub use contact::ContactExtractor;
pub use fetch::{FetchClient, FetchConfig, FetchResponse, UrlError, normalize};
pub use inspect::{PageInspector, analyze};
pub use pagespeed::{PageSpeedClient, PageSpeedConfig, PageSpeedError};
pub use signals::{ContactSource, PageSignals, PageSource, PerformanceSignals, PerformanceSource};
