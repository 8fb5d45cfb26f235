//! Cached, paced, cancellable audit of many businesses.
//!
//! ### Ordering
//! Requests without a URL are answered first, before any network activity.
//! The rest are audited strictly one at a time in input order; there is
//! never more than one live audit outstanding.
//!
//! ### Pacing
//! After every live audit (including one that produced an `error` result)
//! the pipeline waits the configured delay before starting the next one. Cache
//! hits are emitted immediately and impose no delay. No delay follows the
//! final item.
//!
//! ### Cancellation
//! The token is checked before every item and raced against the in-flight audit
//! and the pacing delay. Once it fires the in-flight audit is dropped, a
//! single `Complete { cancelled: true }` is emitted and the stream ends.
//!
//! ### Cache
//! Keys are normalized URLs. Only `audited` results are written. A failing
//! store is logged and treated as a miss; it never stops the stream.

use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use futures_util::Stream;
use sitescout_core::audit::{AuditRequest, AuditResult, PipelineProgress, ResultSource};
use sitescout_core::{AppConfig, AuditStore, Error};
use tokio_util::sync::CancellationToken;

use super::orchestrator::Auditor;
use crate::fetch::normalize;

/// Default pause between live audits.
pub const DEFAULT_AUDIT_DELAY: Duration = Duration::from_millis(1_200);

/// One observable step of a stream.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    Item { result: AuditResult, progress: PipelineProgress, source: ResultSource },
    /// Emitted exactly once, last.
    Complete { cancelled: bool },
}

/// Audit engine: an [`Auditor`] behind an optional cache.
#[derive(Clone)]
pub struct AuditEngine {
    auditor: Auditor,
    store: Option<Arc<dyn AuditStore>>,
    delay: Duration,
}

impl std::fmt::Debug for AuditEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditEngine")
            .field("auditor", &self.auditor)
            .field("cached", &self.store.is_some())
            .field("delay", &self.delay)
            .finish()
    }
}

impl AuditEngine {
    pub fn new(auditor: Auditor) -> Self {
        Self { auditor, store: None, delay: DEFAULT_AUDIT_DELAY }
    }

    pub fn with_store(mut self, store: Arc<dyn AuditStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Production engine: real sources, configured delay, optional store.
    pub fn from_config(config: &AppConfig, store: Option<Arc<dyn AuditStore>>) -> Result<Self, Error> {
        let engine = Self::new(Auditor::from_config(config)?).with_delay(config.audit_delay());
        Ok(match store {
            Some(store) => engine.with_store(store),
            None => engine,
        })
    }

    pub fn store(&self) -> Option<&Arc<dyn AuditStore>> {
        self.store.as_ref()
    }

    async fn lookup(&self, key: &str) -> Option<AuditResult> {
        let store = self.store.as_ref()?;
        match store.get(key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(url = key, error = %e, "cache lookup failed, auditing anyway");
                None
            }
        }
    }

    async fn remember(&self, key: &str, result: &AuditResult) {
        let Some(store) = &self.store else { return };
        if let Err(e) = store.put(key, result).await {
            tracing::warn!(url = key, error = %e, "failed to cache audit");
        }
    }

    /// Resolve one request through the cache, auditing on a miss.
    pub async fn audit(&self, request: &AuditRequest) -> (AuditResult, ResultSource) {
        let Some(target) = request.target() else {
            return (AuditResult::no_url(&request.correlation_id), ResultSource::Immediate);
        };

        // Malformed URLs fall through to the auditor, which reports them.
        let Ok(url) = normalize(target) else {
            return (self.auditor.audit(request).await, ResultSource::Live);
        };

        if let Some(cached) = self.lookup(url.as_str()).await {
            tracing::debug!(url = %url, "cache hit");
            return (cached.with_correlation_id(&request.correlation_id), ResultSource::Cache);
        }

        let result = self.auditor.audit_url(&url, &request.correlation_id).await;
        if result.is_audited() {
            self.remember(url.as_str(), &result).await;
        }
        (result, ResultSource::Live)
    }

    /// [`AuditEngine::audit`], abandoned as soon as `cancel` fires.
    ///
    /// Cancellation wins over a result that is ready at the same time.
    pub async fn audit_with_cancel(
        &self, request: &AuditRequest, cancel: &CancellationToken,
    ) -> Result<(AuditResult, ResultSource), Error> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            outcome = self.audit(request) => Ok(outcome),
        }
    }

    /// Audit `requests` as a stream of [`PipelineEvent`]s.
    ///
    /// The stream owns a clone of the engine, so it can outlive `self`.
    pub fn stream(
        &self, requests: Vec<AuditRequest>, cancel: CancellationToken,
    ) -> impl Stream<Item = PipelineEvent> + Send + use<> {
        let engine = self.clone();

        stream! {
            let total = requests.len();
            let (immediate, pending): (Vec<_>, Vec<_>) =
                requests.into_iter().partition(|request| request.target().is_none());
            let mut completed = 0;

            tracing::info!(total, live = pending.len(), "audit stream started");

            for request in immediate {
                if cancel.is_cancelled() {
                    break;
                }
                completed += 1;
                yield PipelineEvent::Item {
                    result: AuditResult::no_url(request.correlation_id),
                    progress: PipelineProgress { completed, total },
                    source: ResultSource::Immediate,
                };
            }

            let last = pending.len();
            for (index, request) in pending.iter().enumerate() {
                if cancel.is_cancelled() {
                    break;
                }

                let Ok((result, source)) = engine.audit_with_cancel(request, &cancel).await else {
                    break;
                };

                completed += 1;
                yield PipelineEvent::Item { result, progress: PipelineProgress { completed, total }, source };

                if source != ResultSource::Cache && index + 1 < last {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {}
                        _ = tokio::time::sleep(engine.delay) => {}
                    }
                }
            }

            let cancelled = cancel.is_cancelled() && completed < total;
            if cancelled {
                tracing::info!(completed, total, "audit stream cancelled");
            } else {
                tracing::info!(total, "audit stream finished");
            }
            yield PipelineEvent::Complete { cancelled };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::testing::{FakePage, FakePerformance};
    use async_trait::async_trait;
    use futures_util::StreamExt;
    use futures_util::pin_mut;
    use sitescout_core::audit::AuditStatus;
    use sitescout_core::{CacheStats, MemoryStore};

    fn engine() -> (AuditEngine, Arc<FakePerformance>, Arc<MemoryStore>) {
        let perf = Arc::new(FakePerformance::default());
        let store = Arc::new(MemoryStore::new());
        let engine = AuditEngine::new(Auditor::new(perf.clone(), Arc::new(FakePage::default()))).with_store(store.clone());
        (engine, perf, store)
    }

    fn req(url: Option<&str>, id: &str) -> AuditRequest {
        AuditRequest::new(url, id)
    }

    async fn collect(engine: &AuditEngine, requests: Vec<AuditRequest>) -> Vec<PipelineEvent> {
        engine.stream(requests, CancellationToken::new()).collect().await
    }

    fn item(event: &PipelineEvent) -> (&AuditResult, PipelineProgress, ResultSource) {
        match event {
            PipelineEvent::Item { result, progress, source } => (result, *progress, *source),
            PipelineEvent::Complete { .. } => panic!("expected an item, got {event:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_url_items_first_without_network() {
        let (engine, perf, _) = engine();
        let stream = engine.stream(vec![req(Some("http://x.example"), "B"), req(None, "A")], CancellationToken::new());
        pin_mut!(stream);

        let first = stream.next().await.unwrap();
        let (result, progress, source) = item(&first);
        assert_eq!(result.correlation_id, "A");
        assert_eq!(result.status, AuditStatus::NoUrl);
        assert_eq!(progress, PipelineProgress { completed: 1, total: 2 });
        assert_eq!(source, ResultSource::Immediate);
        assert_eq!(perf.calls(), 0);

        let second = stream.next().await.unwrap();
        let (result, progress, source) = item(&second);
        assert_eq!(result.correlation_id, "B");
        assert!(progress.is_complete());
        assert_eq!(source, ResultSource::Live);

        assert_eq!(stream.next().await, Some(PipelineEvent::Complete { cancelled: false }));
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_input_order_and_monotonic_progress() {
        let (engine, perf, _) = engine();
        let events = collect(
            &engine,
            vec![req(Some("a.example"), "1"), req(Some("b.example"), "2"), req(Some("c.example"), "3")],
        )
        .await;

        assert_eq!(events.len(), 4);
        let ids: Vec<_> = events[..3].iter().map(|e| item(e).0.correlation_id.clone()).collect();
        assert_eq!(ids, ["1", "2", "3"]);
        let completed: Vec<_> = events[..3].iter().map(|e| item(e).1.completed).collect();
        assert_eq!(completed, [1, 2, 3]);
        assert_eq!(perf.seen(), ["https://a.example/", "https://b.example/", "https://c.example/"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_between_live_audits_only() {
        let (engine, _, _) = engine();
        let start = tokio::time::Instant::now();
        collect(&engine, vec![req(Some("a.example"), "1"), req(Some("b.example"), "2"), req(Some("c.example"), "3")])
            .await;

        // two gaps, none after the last item
        let elapsed = start.elapsed();
        assert!(elapsed >= DEFAULT_AUDIT_DELAY * 2);
        assert!(elapsed < DEFAULT_AUDIT_DELAY * 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_hits_skip_audit_and_delay() {
        let (engine, perf, store) = engine();
        collect(&engine, vec![req(Some("a.example"), "first")]).await;
        assert_eq!(perf.calls(), 1);
        assert_eq!(store.stats().await.unwrap(), CacheStats { audits: 1, fresh: 1 });

        let start = tokio::time::Instant::now();
        let events =
            collect(&engine, vec![req(Some("https://a.example"), "again"), req(Some("a.example/#top"), "third")]).await;

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(perf.calls(), 1);
        let (result, _, source) = item(&events[0]);
        assert_eq!(source, ResultSource::Cache);
        assert_eq!(result.correlation_id, "again");
        assert_eq!(item(&events[1]).2, ResultSource::Cache);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_url_does_not_stop_stream() {
        let (engine, _, store) = engine();
        let start = tokio::time::Instant::now();
        let events = collect(&engine, vec![req(Some("ftp://bad.example"), "bad"), req(Some("ok.example"), "ok")]).await;

        assert_eq!(item(&events[0]).0.status, AuditStatus::Error);
        assert_eq!(item(&events[1]).0.status, AuditStatus::Audited);
        assert_eq!(events[2], PipelineEvent::Complete { cancelled: false });
        // the failed item still paces the next one
        let elapsed = start.elapsed();
        assert!(elapsed >= DEFAULT_AUDIT_DELAY);
        assert!(elapsed < DEFAULT_AUDIT_DELAY * 2);
        assert_eq!(store.stats().await.unwrap().audits, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_first_item() {
        let (engine, perf, _) = engine();
        let cancel = CancellationToken::new();
        let stream = engine.stream(
            vec![req(Some("a.example"), "1"), req(Some("b.example"), "2"), req(Some("c.example"), "3")],
            cancel.clone(),
        );
        pin_mut!(stream);

        let first = stream.next().await.unwrap();
        assert_eq!(item(&first).1.completed, 1);

        cancel.cancel();

        assert_eq!(stream.next().await, Some(PipelineEvent::Complete { cancelled: true }));
        assert_eq!(stream.next().await, None);
        assert_eq!(perf.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_in_flight_audit() {
        let perf = Arc::new(FakePerformance::default().with_delay(Duration::from_secs(60)));
        let engine = AuditEngine::new(Auditor::new(perf.clone(), Arc::new(FakePage::default())));
        let cancel = CancellationToken::new();
        let stream = engine.stream(vec![req(Some("slow.example"), "1"), req(Some("b.example"), "2")], cancel.clone());
        pin_mut!(stream);

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            trigger.cancel();
        });

        let start = tokio::time::Instant::now();
        assert_eq!(stream.next().await, Some(PipelineEvent::Complete { cancelled: true }));
        assert!(start.elapsed() < Duration::from_secs(60));
        assert_eq!(stream.next().await, None);
        assert_eq!(perf.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_start_emits_only_marker() {
        let (engine, perf, _) = engine();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let events: Vec<_> = engine.stream(vec![req(None, "A"), req(Some("a.example"), "B")], cancel).collect().await;

        assert_eq!(events, vec![PipelineEvent::Complete { cancelled: true }]);
        assert_eq!(perf.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_last_item_is_not_reported() {
        let (engine, _, _) = engine();
        let cancel = CancellationToken::new();
        let stream = engine.stream(vec![req(Some("a.example"), "1")], cancel.clone());
        pin_mut!(stream);

        assert!(matches!(stream.next().await, Some(PipelineEvent::Item { .. })));
        cancel.cancel();
        assert_eq!(stream.next().await, Some(PipelineEvent::Complete { cancelled: false }));
    }

    #[tokio::test]
    async fn test_empty_input_completes() {
        let (engine, _, _) = engine();
        assert_eq!(collect(&engine, vec![]).await, vec![PipelineEvent::Complete { cancelled: false }]);
    }

    struct BrokenStore;

    #[async_trait]
    impl AuditStore for BrokenStore {
        async fn get(&self, _url: &str) -> Result<Option<AuditResult>, Error> {
            Err(Error::HttpError("disk on fire".into()))
        }
        async fn put(&self, _url: &str, _result: &AuditResult) -> Result<(), Error> {
            Err(Error::HttpError("disk on fire".into()))
        }
        async fn sweep(&self) -> Result<u64, Error> {
            Ok(0)
        }
        async fn stats(&self) -> Result<CacheStats, Error> {
            Ok(CacheStats::default())
        }
    }

    #[tokio::test]
    async fn test_cache_errors_are_misses() {
        let perf = Arc::new(FakePerformance::default());
        let engine =
            AuditEngine::new(Auditor::new(perf.clone(), Arc::new(FakePage::default()))).with_store(Arc::new(BrokenStore));

        let (result, source) = engine.audit(&req(Some("a.example"), "1")).await;
        assert_eq!(result.status, AuditStatus::Audited);
        assert_eq!(source, ResultSource::Live);

        engine.audit(&req(Some("a.example"), "2")).await;
        assert_eq!(perf.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_audit_with_cancel() {
        let perf = Arc::new(FakePerformance::default().with_delay(Duration::from_secs(30)));
        let engine = AuditEngine::new(Auditor::new(perf, Arc::new(FakePage::default())));
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let outcome = engine.audit_with_cancel(&req(Some("slow.example"), "1"), &cancel).await;
        assert!(matches!(outcome, Err(Error::Cancelled)));

        let fresh = CancellationToken::new();
        let outcome = engine.audit_with_cancel(&req(None, "2"), &fresh).await;
        assert!(matches!(outcome, Ok((_, ResultSource::Immediate))));
    }

    #[tokio::test]
    async fn test_single_audit_without_url() {
        let (engine, perf, _) = engine();
        let (result, source) = engine.audit(&req(Some(""), "x")).await;
        assert_eq!(result.status, AuditStatus::NoUrl);
        assert_eq!(source, ResultSource::Immediate);
        assert_eq!(perf.calls(), 0);
    }
}
