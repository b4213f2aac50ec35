//! Auth service error types.
//!
//! All errors map to HTTP status codes via the `IntoResponse` impl.
//! Messages returned to clients are intentionally generic; the internal
//! cause is logged server-side.

use crate::credentials::{CredentialError, StoreError};
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Value of the `WWW-Authenticate` header on 401 responses.
pub const WWW_AUTHENTICATE_VALUE: &str = "Bearer realm=\"auth-service\", error=\"invalid_token\"";

/// Auth service error type.
///
/// Maps to HTTP status codes:
/// - Unauthenticated, InvalidCredentials: 401 Unauthorized
/// - BadRequest: 400 Bad Request
/// - Forbidden: 403 Forbidden
/// - Conflict: 409 Conflict
/// - Internal: 500 Internal Server Error
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (code, message) = match &self {
            ApiError::Unauthenticated => (
                "UNAUTHENTICATED",
                "The access token is missing, invalid or expired".to_string(),
            ),
            ApiError::InvalidCredentials => (
                "INVALID_CREDENTIALS",
                "Invalid username or password".to_string(),
            ),
            ApiError::BadRequest(reason) => ("BAD_REQUEST", reason.clone()),
            ApiError::Forbidden(reason) => ("FORBIDDEN", reason.clone()),
            ApiError::Conflict(reason) => ("CONFLICT", reason.clone()),
            ApiError::Internal(detail) => {
                // Log actual error server-side, return generic message to client
                tracing::error!(target: "auth.handlers", error = %detail, "Internal error");
                ("INTERNAL_ERROR", "An internal error occurred".to_string())
            }
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        let mut response = (status, Json(error_response)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(WWW_AUTHENTICATE_VALUE),
            );
        }

        response
    }
}

/// Collapse credential failures to one external outcome.
impl From<CredentialError> for ApiError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::NotFound | CredentialError::BadPassword => {
                ApiError::InvalidCredentials
            }
            CredentialError::Store(StoreError::Duplicate) => {
                ApiError::Conflict("Username already exists".to_string())
            }
            CredentialError::Hashing(detail) => ApiError::Internal(detail),
            CredentialError::Store(e) => ApiError::Internal(e.to_string()),
        }
    }
}
