//! Single-URL audit: both signal sources concurrently, then the scorer.

use std::sync::Arc;

use sitescout_core::audit::{AuditRequest, AuditResult};
use sitescout_core::{AppConfig, Error};
use url::Url;

use super::scorer::score;
use crate::contact::ContactExtractor;
use crate::fetch::{FetchConfig, normalize};
use crate::inspect::PageInspector;
use crate::pagespeed::{PageSpeedClient, PageSpeedConfig};
use crate::signals::{ContactSource, PageSource, PerformanceSource};

/// Runs one audit. Cheap to clone; the sources are shared.
#[derive(Clone)]
pub struct Auditor {
    performance: Arc<dyn PerformanceSource>,
    page: Arc<dyn PageSource>,
    contact: Option<Arc<dyn ContactSource>>,
}

impl std::fmt::Debug for Auditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auditor")
            .field("contact", &self.contact.is_some())
            .finish_non_exhaustive()
    }
}

impl Auditor {
    pub fn new(performance: Arc<dyn PerformanceSource>, page: Arc<dyn PageSource>) -> Self {
        Self { performance, page, contact: None }
    }

    /// Also scrape contact details on every audit.
    pub fn with_contact(mut self, contact: Arc<dyn ContactSource>) -> Self {
        self.contact = Some(contact);
        self
    }

    /// Wire the production sources from configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let pagespeed = PageSpeedClient::new(PageSpeedConfig::from_app(config))
            .map_err(|e| Error::HttpError(format!("failed to build PageSpeed client: {e}")))?;
        if !pagespeed.is_configured() {
            tracing::debug!("no PageSpeed key, performance sources will report neutral scores");
        }
        let inspector = PageInspector::from_config(FetchConfig::from_app(config))?;

        let auditor = Self::new(Arc::new(pagespeed), Arc::new(inspector));
        if config.contact_extraction {
            Ok(auditor.with_contact(Arc::new(ContactExtractor::from_app(config)?)))
        } else {
            Ok(auditor)
        }
    }

    /// Audit one request.
    ///
    /// Never fails: a missing URL yields `no_url` without touching the
    /// network, and a URL that cannot be normalized yields `error`.
    pub async fn audit(&self, request: &AuditRequest) -> AuditResult {
        let Some(target) = request.target() else {
            return AuditResult::no_url(&request.correlation_id);
        };

        match normalize(target) {
            Ok(url) => self.audit_url(&url, &request.correlation_id).await,
            Err(e) => {
                let err = Error::InvalidUrl(format!("{target}: {e}"));
                tracing::warn!(correlation_id = %request.correlation_id, error = %err, "audit failed");
                AuditResult::failed(&request.correlation_id, None, err.to_string())
            }
        }
    }

    /// Audit an already-normalized URL.
    pub async fn audit_url(&self, url: &Url, correlation_id: &str) -> AuditResult {
        let contact = async {
            match &self.contact {
                Some(source) => Some(source.extract(url).await),
                None => None,
            }
        };

        let (perf, page, contact) = tokio::join!(self.performance.measure(url), self.page.inspect(url), contact);

        let mut result = score(correlation_id, url, perf, page);
        result.details.contact = contact;

        tracing::debug!(
            url = %url,
            site_score = result.site_score,
            degraded = result.details.is_degraded(),
            "audit complete"
        );

        result
    }

}
