//! HTTP error type for the task service.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Fixed body of every 401 response.
pub const UNAUTHORIZED_MESSAGE: &str = "unauthorized";

/// Body of a 401 response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human-readable message.
    pub message: String,
}

/// Structured error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
    /// Machine-readable error code.
    pub code: String,
    /// Additional error details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    /// Create a new error response with code and message.
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            details: None,
        }
    }

    /// Add details to the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Errors returned by route handlers and middleware.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing, invalid or expired token, or an access gate denial.
    #[error("unauthorized")]
    Unauthorized,
    /// Request could not be processed as sent.
    #[error("Bad request: {0}")]
    BadRequest(String),
    /// Request body exceeds the buffering limit.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),
    /// Path identifier is not a valid task id.
    #[error("Invalid task id: {0}")]
    InvalidTaskId(String),
    /// The store failed.
    #[error("Store error: {0}")]
    Store(String),
}

impl ApiError {
    /// Wrap a store error.
    pub fn store(err: impl std::error::Error) -> Self {
        Self::Store(err.to_string())
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) | Self::InvalidTaskId(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::Unauthorized => (
                status,
                Json(MessageResponse {
                    message: UNAUTHORIZED_MESSAGE.to_string(),
                }),
            )
                .into_response(),
            Self::BadRequest(reason) => {
                tracing::warn!(error = %reason, "Bad request");
                (status, Json(ErrorResponse::new("BAD_REQUEST", reason))).into_response()
            }
            Self::PayloadTooLarge(reason) => {
                tracing::warn!(error = %reason, "Request body too large");
                (status, Json(ErrorResponse::new("PAYLOAD_TOO_LARGE", reason))).into_response()
            }
            Self::InvalidTaskId(raw) => {
                tracing::warn!(task_id = %raw, "Invalid task id");
                (
                    status,
                    Json(ErrorResponse::new("INVALID_TASK_ID", "Invalid task id").with_details(raw)),
                )
                    .into_response()
            }
            Self::Store(cause) => {
                // Cause stays in the logs
                tracing::error!(error = %cause, "Store operation failed");
                (
                    status,
                    Json(ErrorResponse::new("STORE_ERROR", "Internal server error")),
                )
                    .into_response()
            }
        }
    }
}
