//! `/login` and `/join` handlers.
//!
//! Both accept JSON only. Form posts and HTTP Basic credentials are never
//! read.

use crate::credentials::rules;
use crate::errors::ApiError;
use crate::models::{JoinResponse, TokenResponse, DEFAULT_ROLE};
use crate::observability::hash_for_correlation;
use crate::observability::metrics::{record_login_attempt, record_token_issuance};
use crate::routes::AppState;
use crate::token::Claims;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};
use common::secret::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: SecretString,
}

#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    pub username: String,
    pub password: SecretString,
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        tracing::debug!(target: "auth.handlers", error = %rejection, "Rejected request body");
        ApiError::BadRequest("Request body must be a JSON object with username and password".to_string())
    })
}

/// Handle a login request.
///
/// POST /login
///
/// Verifies the password and returns a signed bearer token in the body and
/// in the `Authorization` response header.
#[instrument(skip_all, name = "auth.handlers.login")]
pub async fn handle_login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = json_body(payload)?;

    let principal = match state
        .verifier
        .verify(&request.username, &request.password)
        .await
    {
        Ok(principal) => principal,
        Err(e) => {
            let api_error = ApiError::from(e);
            let outcome = match api_error {
                ApiError::InvalidCredentials => "invalid_credentials",
                _ => "error",
            };
            record_login_attempt(outcome);
            return Err(api_error);
        }
    };

    let now = chrono::Utc::now().timestamp();
    let claims = Claims::new(
        principal.subject,
        principal.role,
        now,
        state.config.token_ttl(),
    );

    let token = state.codec.issue(&claims).map_err(|e| {
        record_token_issuance("error");
        record_login_attempt("error");
        ApiError::Internal(format!("Token issuance failed: {e}"))
    })?;
    record_token_issuance("success");
    record_login_attempt("success");

    tracing::info!(
        target: "auth.handlers",
        username_hash = %hash_for_correlation(&request.username),
        "Login succeeded"
    );

    let bearer = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|e| ApiError::Internal(format!("Invalid token header: {e}")))?;

    let body = TokenResponse {
        access_token: token.into_string(),
        token_type: "Bearer".to_string(),
        expires_in: state.config.token_ttl_seconds,
    };

    Ok(([(header::AUTHORIZATION, bearer)], Json(body)))
}

/// Handle an account registration request.
///
/// POST /join
///
/// New accounts always get the `user` role.
#[instrument(skip_all, name = "auth.handlers.join")]
pub async fn handle_join(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<JoinRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = json_body(payload)?;
    validate_join(&request)?;

    let record = state
        .verifier
        .register(&request.username, &request.password, DEFAULT_ROLE)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(JoinResponse {
            username: record.username,
            role: record.role,
        }),
    ))
}

fn validate_join(request: &JoinRequest) -> Result<(), ApiError> {
    rules::check_username(&request.username)
        .and_then(|()| rules::check_password(request.password.expose_secret()))
        .map_err(|violation| ApiError::BadRequest(violation.to_string()))
}
