//! TTL-bounded cache of audit results keyed by normalized URL.
//!
//! Two backends implement [`AuditStore`]:
//!
//! - [`CacheDb`]: SQLite via tokio-rusqlite, WAL mode, versioned migrations.
//!   Survives restarts.
//! - [`MemoryStore`]: a `HashMap` behind an `RwLock`, for tests and for
//!   running without a database.
//!
//! Both take their notion of "now" from a [`Clock`] so expiry can be tested
//! without sleeping. An entry older than the TTL is dead for `get` even if it
//! is still physically stored; only [`AuditStore::sweep`] deletes it.

pub mod audits;
pub mod clock;
pub mod connection;
pub mod memory;
pub mod migrations;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub use crate::Error;
use crate::audit::AuditResult;

pub use clock::{Clock, ManualClock, SystemClock};
pub use connection::CacheDb;
pub use memory::MemoryStore;

/// Default freshness window for cached audits.
pub const DEFAULT_TTL_DAYS: i64 = 7;

/// Entry counts reported by [`AuditStore::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Entries physically stored, fresh or not.
    pub audits: u64,
    /// Entries that would still be served by `get`.
    pub fresh: u64,
}

/// Keyed store of audit results with TTL expiry.
///
/// Only `audited` results are ever persisted; `put` silently skips
/// `no_url` and `error` results so a transient failure cannot poison later
/// lookups. Writes replace a whole entry at once.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Fetch a fresh entry, or `None` when absent or expired.
    async fn get(&self, url: &str) -> Result<Option<AuditResult>, Error>;

    /// Insert or replace the entry for `url`, resetting its age.
    async fn put(&self, url: &str, result: &AuditResult) -> Result<(), Error>;

    /// Delete expired entries. Returns the number removed.
    async fn sweep(&self) -> Result<u64, Error>;

    async fn stats(&self) -> Result<CacheStats, Error>;
}

/// Oldest creation time that still counts as fresh.
pub(crate) fn fresh_after(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    now - ttl
}
