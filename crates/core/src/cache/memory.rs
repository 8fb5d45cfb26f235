//! In-process audit store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use super::clock::{Clock, SystemClock};
use super::{AuditStore, CacheStats, DEFAULT_TTL_DAYS, fresh_after};
use crate::Error;
use crate::audit::AuditResult;

#[derive(Debug, Clone)]
struct CacheEntry {
    result: AuditResult,
    created_at: DateTime<Utc>,
}

/// `HashMap`-backed [`AuditStore`]. Entries are replaced whole under the write
/// lock, so readers never observe a partial write.
#[derive(Debug)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self { entries: RwLock::new(HashMap::new()), ttl: Duration::days(DEFAULT_TTL_DAYS), clock: Arc::new(SystemClock) }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn cutoff(&self) -> DateTime<Utc> {
        fresh_after(self.clock.now(), self.ttl)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn get(&self, url: &str) -> Result<Option<AuditResult>, Error> {
        let cutoff = self.cutoff();
        let entries = self.entries.read().await;
        Ok(entries
            .get(url)
            .filter(|entry| entry.created_at > cutoff)
            .map(|entry| entry.result.clone()))
    }

    async fn put(&self, url: &str, result: &AuditResult) -> Result<(), Error> {
        if !result.is_audited() {
            return Ok(());
        }
        let entry = CacheEntry { result: result.clone(), created_at: self.clock.now() };
        self.entries.write().await.insert(url.to_string(), entry);
        Ok(())
    }

    async fn sweep(&self) -> Result<u64, Error> {
        let cutoff = self.cutoff();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.created_at > cutoff);
        Ok((before - entries.len()) as u64)
    }

    async fn stats(&self) -> Result<CacheStats, Error> {
        let cutoff = self.cutoff();
        let entries = self.entries.read().await;
        let fresh = entries.values().filter(|entry| entry.created_at > cutoff).count();
        Ok(CacheStats { audits: entries.len() as u64, fresh: fresh as u64 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::clock::ManualClock;
    use crate::cache::testing::audited;

    #[tokio::test]
    async fn test_round_trip_and_expiry() {
        let clock = Arc::new(ManualClock::default());
        let store = MemoryStore::new().with_clock(clock.clone());
        let result = audited("https://example.com/", 42);

        store.put("https://example.com/", &result).await.unwrap();
        assert_eq!(store.get("https://example.com/").await.unwrap(), Some(result));

        clock.advance(Duration::days(7) + Duration::milliseconds(1));
        assert_eq!(store.get("https://example.com/").await.unwrap(), None);
        assert_eq!(store.stats().await.unwrap(), CacheStats { audits: 1, fresh: 0 });

        assert_eq!(store.sweep().await.unwrap(), 1);
        assert_eq!(store.stats().await.unwrap(), CacheStats::default());
    }

    #[tokio::test]
    async fn test_skips_error_results() {
        let store = MemoryStore::new();
        store
            .put("https://example.com/", &AuditResult::failed("x", None, "boom"))
            .await
            .unwrap();
        assert_eq!(store.stats().await.unwrap().audits, 0);
    }

    #[tokio::test]
    async fn test_concurrent_readers_and_writer() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for score in 0..20u8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.put("https://example.com/", &audited("https://example.com/", score)).await.unwrap();
                store.get("https://example.com/").await.unwrap()
            }));
        }
        for handle in handles {
            let seen = handle.await.unwrap().unwrap();
            // Whole entries only: every category carries the entry's own score.
            assert!(seen.sub_scores.values().all(|sub| sub.score == seen.site_score));
        }
    }
}
