use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Failures of the retrieval-and-generation core.
///
/// Every variant carries the operation and the key it was applied to so the
/// caller can log it without extra context.
#[derive(Debug, Error)]
pub enum RagError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("query failed: {0}")]
    QueryFailed(String),
    #[error("{operation} failed: {message}")]
    UpstreamUnavailable { operation: String, message: String },
    #[error("validation failed: {0}")]
    ValidationFailed(String),
}

impl RagError {
    pub fn upstream<E: std::fmt::Display>(operation: impl Into<String>, err: E) -> Self {
        RagError::UpstreamUnavailable {
            operation: operation.into(),
            message: err.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RagError::NotFound(_))
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("bad gateway: {0}")]
    BadGateway(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        match err {
            RagError::NotFound(msg) => ApiError::NotFound(msg),
            RagError::AlreadyExists(msg) => ApiError::Conflict(msg),
            RagError::ValidationFailed(msg) => ApiError::BadRequest(msg),
            RagError::QueryFailed(msg) => ApiError::BadGateway(msg),
            err @ RagError::UpstreamUnavailable { .. } => {
                ApiError::ServiceUnavailable(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::BadGateway(msg) => {
                tracing::error!("upstream returned a malformed response: {}", msg);
                (StatusCode::BAD_GATEWAY, msg.clone())
            }
            ApiError::ServiceUnavailable(msg) => {
                tracing::error!("upstream unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Service unavailable".to_string(),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!("internal server error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "server encountered a problem".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
