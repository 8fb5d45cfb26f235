use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    timestamp: String,
}

/// Liveness probe; never touches the network or the cache.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok", timestamp: chrono::Utc::now().to_rfc3339() })
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::routes::testing::{app, body_json};

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app(false);
        let response = app
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert!(body["timestamp"].is_string());
    }
}
