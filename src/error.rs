use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::any::Any;
use thiserror::Error;
use tracing::error;

use crate::types::SearchResponse;

pub const INVALID_BODY_MESSAGE: &str = "Invalid request body. Send JSON with 'query' and 'mode'.";
pub const MISSING_QUERY_MESSAGE: &str = "Please provide a search query.";
pub const INTERNAL_ERROR_MESSAGE: &str = "Server crashed internally.";

/// Failures that surface as an HTTP error status. Everything else is
/// reported in-band with a 200.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request body: {0}")]
    InvalidBody(String),
    #[error("missing or non-string query")]
    MissingQuery,
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, answer) = match &self {
            ApiError::InvalidBody(_) => (StatusCode::BAD_REQUEST, INVALID_BODY_MESSAGE),
            ApiError::MissingQuery => (StatusCode::BAD_REQUEST, MISSING_QUERY_MESSAGE),
            ApiError::Internal(detail) => {
                error!("Search handler failed: {}", detail);
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
            }
        };
        (status, Json(SearchResponse::answer(answer))).into_response()
    }
}

/// Last-resort handler for panics escaping a request.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    ApiError::Internal(detail).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn panic_renders_generic_server_error() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "answer": "Server crashed internally." }));
    }

    #[test]
    fn validation_errors_are_bad_requests() {
        assert_eq!(
            ApiError::MissingQuery.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::InvalidBody("eof".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }
}
