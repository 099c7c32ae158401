//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the gateway. Each variant
//! maps to a stable error code and HTTP status. Storage and identity
//! failures are logged at the boundary and never leak their details to
//! the caller.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::AuthError;
use crate::persistence::StoreError;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": "not_found",
///     "message": "league not found"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with a stable code and a human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Stable machine-readable code (`validation_error`, `not_found`, ...).
    pub code: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// Server-side error enum with HTTP status code mapping.
///
/// | Code               | HTTP Status               | Retry?                 |
/// |--------------------|---------------------------|------------------------|
/// | `validation_error` | 400 Bad Request           | no                     |
/// | `unauthorized`     | 401 Unauthorized          | with credentials       |
/// | `forbidden`        | 403 Forbidden             | no                     |
/// | `not_found`        | 404 Not Found             | no                     |
/// | `conflict`         | 409 Conflict              | yes (re-read first)    |
/// | `internal_error`   | 500 Internal Server Error | maybe                  |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Request shape or bounds are invalid.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The operation needs an authenticated caller.
    #[error("authentication required")]
    Unauthorized,

    /// The caller is known but not allowed to perform the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The named resource does not exist (or is concealed from the caller).
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Idempotency or race violation; the caller may retry.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Failure reported by the entity store.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Failure reported by the identity layer.
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the stable error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Store(err) if err.is_condition_failure() => "conflict",
            Self::Auth(err) if err.is_rejection() => "unauthorized",
            Self::Store(_) | Self::Auth(_) | Self::Internal(_) => "internal_error",
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Store(err) if err.is_condition_failure() => StatusCode::CONFLICT,
            Self::Auth(err) if err.is_rejection() => StatusCode::UNAUTHORIZED,
            Self::Store(_) | Self::Auth(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message returned to the caller. Internal failures get a generic text.
    fn public_message(&self) -> String {
        match self.status_code() {
            StatusCode::INTERNAL_SERVER_ERROR => "internal error".to_string(),
            StatusCode::UNAUTHORIZED => "authentication required".to_string(),
            StatusCode::CONFLICT if matches!(self, Self::Store(_)) => {
                "concurrent modification, retry".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl From<JsonRejection> for GatewayError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for GatewayError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match status {
            StatusCode::INTERNAL_SERVER_ERROR => tracing::error!(error = %self, "request failed"),
            StatusCode::CONFLICT => tracing::warn!(error = %self, "request conflicted"),
            _ => tracing::debug!(error = %self, "request rejected"),
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.public_message(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
