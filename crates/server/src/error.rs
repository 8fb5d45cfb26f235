//! Structured errors for the sitescout HTTP API.
//!
//! Every error renders as `{ "error": "<CODE>: message" }` with a matching
//! status code.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sitescout_core::Error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request itself is unusable (e.g., missing `urls`).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Anything the engine or cache reported.
    #[error(transparent)]
    Engine(#[from] Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Engine(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::InvalidInput("urls".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::from(Error::InvalidUrl("x".into())).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::from(Error::MigrationFailed("v1".into())).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::from(Error::HttpError("closed".into())).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_message_keeps_code() {
        let err = ApiError::InvalidInput("missing urls".into());
        assert_eq!(err.to_string(), "INVALID_INPUT: missing urls");
        let err = ApiError::from(Error::Cancelled);
        assert_eq!(err.to_string(), "CANCELLED");
    }
}
