//! API error types and response formatting.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use seismo_core::ALLOWED_FILTERS;
use serde::Serialize;

/// API error type that converts to appropriate HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Filter set the planner cannot route.
    #[error("invalid filters: {0}")]
    InvalidFilters(String),

    /// Continuation token could not be decoded or belongs to another query.
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),

    /// Malformed request parameter.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Ingestion run already active.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The upstream feed failed.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Internal server error (store, serialization, etc.).
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<seismo_core::Error> for ApiError {
    fn from(err: seismo_core::Error) -> Self {
        use seismo_core::Error;
        match err {
            Error::InvalidFilterCombination(msg) => Self::InvalidFilters(msg),
            Error::InvalidCursor(msg) => Self::InvalidCursor(msg),
            Error::NotFound(msg) => Self::NotFound(msg),
            Error::UpstreamFetch(msg) => Self::Upstream(msg),
            other => Self::Internal(other.into()),
        }
    }
}

impl From<seismo_ingest::Error> for ApiError {
    fn from(err: seismo_ingest::Error) -> Self {
        use seismo_ingest::Error;
        match err {
            Error::Core(core) => core.into(),
            Error::Http(e) => Self::Upstream(e.to_string()),
            Error::IngestInProgress => {
                Self::Conflict("An ingestion run is already in progress".to_string())
            }
        }
    }
}

/// JSON error response body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    allowed_filters: Option<&'static [&'static str]>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut allowed_filters = None;
        let (status, error, message) = match &self {
            Self::InvalidFilters(msg) => {
                allowed_filters = Some(ALLOWED_FILTERS);
                (StatusCode::BAD_REQUEST, "invalid_filters", Some(msg.clone()))
            }
            Self::InvalidCursor(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_cursor", Some(msg.clone()))
            }
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone())),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", Some(msg.clone())),
            Self::Upstream(msg) => {
                tracing::error!(error = %msg, "upstream feed error");
                (
                    StatusCode::BAD_GATEWAY,
                    "upstream_error",
                    Some("The earthquake feed is unavailable".to_string()),
                )
            }
            Self::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    Some("An internal error occurred".to_string()),
                )
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            message,
            allowed_filters,
        };

        (status, Json(body)).into_response()
    }
}
