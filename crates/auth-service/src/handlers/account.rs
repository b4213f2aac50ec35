//! Current account handler.

use crate::errors::ApiError;
use crate::middleware::PrincipalExt;
use crate::models::AccountResponse;
use axum::{extract::Request, Json};
use tracing::instrument;

/// Handler for GET /account
///
/// Returns the principal the auth gate attached to the request.
///
/// ```json
/// { "subject": "alice", "role": "user" }
/// ```
///
/// Answers 401 if no principal is attached, which happens only when
/// `/account` has been configured as a public path.
#[instrument(skip_all, name = "auth.handlers.account")]
pub async fn get_account(req: Request) -> Result<Json<AccountResponse>, ApiError> {
    let principal = req.principal().cloned().ok_or(ApiError::Unauthenticated)?;
    tracing::debug!(target: "auth.handlers", role = %principal.role, "Returning account");
    Ok(Json(AccountResponse::from(principal)))
}
