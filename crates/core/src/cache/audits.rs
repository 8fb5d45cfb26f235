//! Audit cache operations on the SQLite backend.

use async_trait::async_trait;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

use super::connection::CacheDb;
use super::{AuditStore, CacheStats, fresh_after};
use crate::Error;
use crate::audit::AuditResult;

impl CacheDb {
    fn cutoff_millis(&self) -> i64 {
        fresh_after(self.clock.now(), self.ttl).timestamp_millis()
    }
}

#[async_trait]
impl AuditStore for CacheDb {
    async fn get(&self, url: &str) -> Result<Option<AuditResult>, Error> {
        let url = url.to_string();
        let cutoff = self.cutoff_millis();
        let json = self
            .conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let mut stmt = conn.prepare("SELECT audit_json FROM audit_cache WHERE url = ?1 AND created_at > ?2")?;

                match stmt.query_row(params![url, cutoff], |row| row.get(0)) {
                    Ok(json) => Ok(Some(json)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        json.map(|json| serde_json::from_str(&json).map_err(Error::from))
            .transpose()
    }

    async fn put(&self, url: &str, result: &AuditResult) -> Result<(), Error> {
        if !result.is_audited() {
            tracing::debug!(url, status = ?result.status, "not caching unaudited result");
            return Ok(());
        }

        let url = url.to_string();
        let json = serde_json::to_string(result)?;
        let site_score = i64::from(result.site_score);
        let created_at = self.clock.now().timestamp_millis();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO audit_cache (url, audit_json, site_score, created_at)
                    VALUES (?1, ?2, ?3, ?4)
                    ON CONFLICT(url) DO UPDATE SET
                        audit_json = excluded.audit_json,
                        site_score = excluded.site_score,
                        created_at = excluded.created_at",
                    params![url, json, site_score, created_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn sweep(&self) -> Result<u64, Error> {
        let cutoff = self.cutoff_millis();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM audit_cache WHERE created_at <= ?1", params![cutoff])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    async fn stats(&self) -> Result<CacheStats, Error> {
        let cutoff = self.cutoff_millis();
        self.conn
            .call(move |conn| -> Result<CacheStats, Error> {
                let (audits, fresh): (i64, i64) = conn.query_row(
                    "SELECT COUNT(*), COALESCE(SUM(created_at > ?1), 0) FROM audit_cache",
                    params![cutoff],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )?;
                Ok(CacheStats { audits: audits as u64, fresh: fresh as u64 })
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;

    use super::*;
    use crate::audit::AuditResult;
    use crate::cache::clock::ManualClock;
    use crate::cache::testing::audited;

    async fn db_with_clock() -> (CacheDb, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let db = CacheDb::open_in_memory().await.unwrap().with_clock(clock.clone());
        (db, clock)
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let (db, _) = db_with_clock().await;
        let result = audited("https://example.com/", 64);

        db.put("https://example.com/", &result).await.unwrap();

        let cached = db.get("https://example.com/").await.unwrap().unwrap();
        assert_eq!(cached, result);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let (db, _) = db_with_clock().await;
        assert!(db.get("https://nowhere.example/").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let (db, clock) = db_with_clock().await;
        db.put("https://example.com/", &audited("https://example.com/", 50)).await.unwrap();

        clock.advance(Duration::days(6));
        assert!(db.get("https://example.com/").await.unwrap().is_some());

        clock.advance(Duration::days(1) + Duration::seconds(1));
        assert!(db.get("https://example.com/").await.unwrap().is_none());

        // Still physically present until swept.
        assert_eq!(db.stats().await.unwrap(), CacheStats { audits: 1, fresh: 0 });
    }

    #[tokio::test]
    async fn test_upsert_resets_age() {
        let (db, clock) = db_with_clock().await;
        db.put("https://example.com/", &audited("https://example.com/", 10)).await.unwrap();

        clock.advance(Duration::days(5));
        db.put("https://example.com/", &audited("https://example.com/", 90)).await.unwrap();

        clock.advance(Duration::days(5));
        let cached = db.get("https://example.com/").await.unwrap().unwrap();
        assert_eq!(cached.site_score, 90);
    }

    #[tokio::test]
    async fn test_unaudited_results_not_stored() {
        let (db, _) = db_with_clock().await;
        db.put("https://example.com/", &AuditResult::failed("x", None, "boom")).await.unwrap();
        db.put("https://example.com/", &AuditResult::no_url("y")).await.unwrap();

        assert!(db.get("https://example.com/").await.unwrap().is_none());
        assert_eq!(db.stats().await.unwrap().audits, 0);
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired() {
        let (db, clock) = db_with_clock().await;
        db.put("https://old.example/", &audited("https://old.example/", 20)).await.unwrap();
        clock.advance(Duration::days(4));
        db.put("https://new.example/", &audited("https://new.example/", 80)).await.unwrap();
        clock.advance(Duration::days(4));

        assert_eq!(db.stats().await.unwrap(), CacheStats { audits: 2, fresh: 1 });

        let removed = db.sweep().await.unwrap();
        assert_eq!(removed, 1);
        assert!(db.get("https://new.example/").await.unwrap().is_some());
        assert_eq!(db.stats().await.unwrap(), CacheStats { audits: 1, fresh: 1 });
    }

    #[tokio::test]
    async fn test_custom_ttl() {
        let clock = Arc::new(ManualClock::default());
        let db = CacheDb::open_in_memory()
            .await
            .unwrap()
            .with_ttl(Duration::days(1))
            .with_clock(clock.clone());

        db.put("https://example.com/", &audited("https://example.com/", 50)).await.unwrap();
        clock.advance(Duration::hours(25));
        assert!(db.get("https://example.com/").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.sqlite");

        {
            let db = CacheDb::open(&path).await.unwrap();
            db.put("https://example.com/", &audited("https://example.com/", 71)).await.unwrap();
        }

        let db = CacheDb::open(&path).await.unwrap();
        let cached = db.get("https://example.com/").await.unwrap().unwrap();
        assert_eq!(cached.site_score, 71);
    }
}
