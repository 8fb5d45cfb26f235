//! Router and shared state for the HTTP API.
//!
//! Routes map one-to-one onto engine operations:
//!
//! | route                      | operation                               |
//! |----------------------------|-----------------------------------------|
//! | `GET  /api/health`         | liveness                                |
//! | `POST /api/audit`          | one audit, through the cache            |
//! | `POST /api/audit/stream`   | SSE stream over a JSON list of requests |
//! | `GET  /api/audit/stream`   | SSE stream over comma-separated lists   |
//! | `GET  /api/cache/stats`    | entry counts                            |
//! | `POST /api/cache/clear`    | sweep expired entries                   |

use axum::Router;
use axum::http::Method;
use axum::http::header::CONTENT_TYPE;
use axum::routing::{get, post};
use sitescout_client::AuditEngine;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::routes;

/// State shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub engine: AuditEngine,
}

impl AppState {
    pub fn new(engine: AuditEngine) -> Self {
        Self { engine }
    }
}

/// Build the application router with CORS and request tracing.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/api/health", get(routes::health::health_handler))
        .route("/api/audit", post(routes::audit::audit_handler))
        .route(
            "/api/audit/stream",
            get(routes::stream::stream_query_handler).post(routes::stream::stream_body_handler),
        )
        .route("/api/cache/stats", get(routes::cache::stats_handler))
        .route("/api/cache/clear", post(routes::cache::clear_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
