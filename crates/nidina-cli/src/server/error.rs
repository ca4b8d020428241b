//! API error handling.
//!
//! Every failure leaves the server as `{"code": "...", "message": "..."}`
//! with a matching status code.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use nidina_core::domain::StoreError;

/// API error structure for JSON responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// API error response containing status code and error details.
#[derive(Debug, Clone)]
pub struct ApiErrorResponse {
    pub status: StatusCode,
    pub error: ApiError,
}

impl ApiErrorResponse {
    #[must_use]
    pub const fn new(status: StatusCode, error: ApiError) -> Self {
        Self { status, error }
    }

    #[must_use]
    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ApiError::new(code, message))
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", message))
    }

    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::CONFLICT,
            ApiError::new("VERSION_CONFLICT", message),
        )
    }

    #[must_use]
    pub fn unprocessable(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::new(code, message),
        )
    }

    #[must_use]
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::new("INTERNAL_ERROR", message),
        )
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<StoreError> for ApiErrorResponse {
    fn from(error: StoreError) -> Self {
        let response = match &error {
            // file paths and io details stay in the server log
            StoreError::Read { .. } | StoreError::Write { .. } | StoreError::Corrupt { .. } => {
                tracing::error!(%error, "task storage failed");
                return Self::internal_error("task storage is unavailable");
            }
            StoreError::Transport(_) => {
                tracing::error!(%error, "upstream store unreachable");
                return Self::new(
                    StatusCode::BAD_GATEWAY,
                    ApiError::new("UPSTREAM_UNAVAILABLE", "upstream task store is unreachable"),
                );
            }
            StoreError::NotFound(_) => Self::not_found(error.to_string()),
            StoreError::IndexOutOfRange { .. } => Self::new(
                StatusCode::NOT_FOUND,
                ApiError::new("INDEX_OUT_OF_RANGE", error.to_string()),
            ),
            StoreError::VersionConflict { .. } => Self::conflict(error.to_string()),
            StoreError::InvalidTransition { .. } => {
                Self::unprocessable("INVALID_TRANSITION", error.to_string())
            }
            StoreError::InvalidKey(_) => Self::bad_request("INVALID_KEY", error.to_string()),
            StoreError::Remote {
                status,
                code,
                message,
            } => Self::new(
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
                ApiError::new(code.clone(), message.clone()),
            ),
        };
        tracing::warn!(status = %response.status, code = %response.error.code, "request rejected");
        response
    }
}

impl From<JsonRejection> for ApiErrorResponse {
    fn from(rejection: JsonRejection) -> Self {
        tracing::warn!(%rejection, "malformed request body");
        Self::new(
            rejection.status(),
            ApiError::new("INVALID_BODY", rejection.body_text()),
        )
    }
}
