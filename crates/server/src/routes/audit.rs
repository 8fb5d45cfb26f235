//! Single audit: `POST /api/audit`.

use axum::Json;
use axum::extract::State;
use sitescout_core::AuditRequest;

use super::AuditPayload;
use crate::handler::AppState;

/// Audit one business. A missing or blank `url` answers `no_url` without
/// any network call; everything else goes through the cache.
pub async fn audit_handler(State(state): State<AppState>, Json(request): Json<AuditRequest>) -> Json<AuditPayload> {
    let (result, source) = state.engine.audit(&request).await;
    tracing::info!(
        correlation_id = %result.correlation_id,
        site_score = result.site_score,
        status = ?result.status,
        source = ?source,
        "audit served"
    );
    Json(AuditPayload::new(result, source))
}
