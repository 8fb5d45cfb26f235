//! SSE streaming audit.
//!
//! `POST /api/audit/stream` with `{ "items": [{ "url", "correlationId" }] }`, or
//! `GET /api/audit/stream?urls=a,b,,c&ids=1,2,3,4` for `EventSource` clients.
//!
//! Each audited item is one `data:` frame carrying the result, its source and
//! progress. A final `{ "done": true }` frame closes the stream. Dropping the
//! connection cancels the pipeline, so no further audits start.

use std::convert::Infallible;

use async_stream::stream;
use axum::Json;
use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use sitescout_client::PipelineEvent;
use sitescout_core::AuditRequest;
use tokio_util::sync::CancellationToken;

use super::AuditPayload;
use crate::error::ApiError;
use crate::handler::AppState;

#[derive(Debug, Deserialize)]
pub struct StreamBody {
    #[serde(default)]
    pub items: Vec<AuditRequest>,
}

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    /// Comma-separated URLs; empty entries are businesses without a site.
    pub urls: Option<String>,
    /// Comma-separated correlation IDs, positionally matched to `urls`.
    pub ids: Option<String>,
}

impl StreamQuery {
    /// Zip the two lists. Missing IDs default to the item's index.
    pub fn into_requests(self) -> Result<Vec<AuditRequest>, ApiError> {
        let urls = self
            .urls
            .ok_or_else(|| ApiError::InvalidInput("urls query parameter is required".into()))?;
        let ids: Vec<&str> = self.ids.as_deref().map(|ids| ids.split(',').collect()).unwrap_or_default();

        Ok(urls
            .split(',')
            .enumerate()
            .map(|(index, url)| {
                let url = Some(url.trim()).filter(|u| !u.is_empty());
                let id = ids
                    .get(index)
                    .map(|id| id.trim())
                    .filter(|id| !id.is_empty())
                    .map_or_else(|| index.to_string(), str::to_string);
                AuditRequest::new(url, id)
            })
            .collect())
    }
}

fn to_event(event: PipelineEvent) -> Option<Event> {
    let frame = match event {
        PipelineEvent::Item { result, progress, source } => {
            serde_json::to_value(AuditPayload::new(result, source).with_progress(progress))
        }
        PipelineEvent::Complete { cancelled: false } => Ok(serde_json::json!({ "done": true })),
        PipelineEvent::Complete { cancelled: true } => Ok(serde_json::json!({ "done": true, "cancelled": true })),
    };

    let encoded = match frame {
        Ok(value) => Event::default().json_data(value),
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize SSE frame");
            return None;
        }
    };

    encoded
        .inspect_err(|e| tracing::error!(error = %e, "failed to encode SSE frame"))
        .ok()
}

/// Run the pipeline and adapt it to SSE frames.
///
/// The cancellation token's drop guard lives inside the response stream, so
/// axum dropping the body on disconnect cancels the pipeline.
fn audit_stream(
    state: &AppState, requests: Vec<AuditRequest>,
) -> impl Stream<Item = Result<Event, Infallible>> + Send + use<> {
    let cancel = CancellationToken::new();
    let mut events = Box::pin(state.engine.stream(requests, cancel.clone()));
    let guard = cancel.drop_guard();

    stream! {
        let _guard = guard;
        while let Some(event) = events.next().await {
            if let Some(frame) = to_event(event) {
                yield Ok(frame);
            }
        }
    }
}

pub async fn stream_body_handler(
    State(state): State<AppState>, Json(body): Json<StreamBody>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::info!(items = body.items.len(), "streaming audit requested");
    Sse::new(audit_stream(&state, body.items)).keep_alive(KeepAlive::default())
}

pub async fn stream_query_handler(
    State(state): State<AppState>, Query(query): Query<StreamQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let requests = query.into_requests()?;
    tracing::info!(items = requests.len(), "streaming audit requested");
    Ok(Sse::new(audit_stream(&state, requests)).keep_alive(KeepAlive::default()))
}
