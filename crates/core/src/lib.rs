//! Core types and shared functionality for sitescout.
//!
//! This crate provides:
//! - The audit data model (requests, sub-scores, results, progress)
//! - The audit cache with SQLite and in-memory backends
//! - Unified error types
//! - Configuration structures

pub mod audit;
pub mod cache;
pub mod config;
pub mod error;

pub use audit::{AuditRequest, AuditResult, AuditStatus, PipelineProgress, Rating, ResultSource};
pub use cache::{AuditStore, CacheDb, CacheStats, MemoryStore};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
