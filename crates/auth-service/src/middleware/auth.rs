//! Authentication middleware.
//!
//! `require_auth` wraps the whole router. It runs every request through the
//! [`AuthGate`]: public paths pass untouched, authenticated requests get a
//! [`Principal`] in their extensions, everything else is answered with a
//! single generic 401.

use crate::errors::ApiError;
use crate::gate::{AuthGate, GateOutcome};
use crate::models::Principal;
use crate::observability::metrics::record_token_validation;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::instrument;

/// State for the authentication middleware.
#[derive(Clone)]
pub struct AuthState {
    pub gate: Arc<AuthGate>,
}

/// Gate every request before it reaches a handler.
///
/// # Response
///
/// - Returns 401 Unauthorized with `WWW-Authenticate` if the gate rejects
/// - Continues to the next handler otherwise, with `Principal` in extensions
///   for authenticated requests
#[instrument(skip_all, name = "auth.middleware.gate")]
pub async fn require_auth(
    State(state): State<Arc<AuthState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let now = chrono::Utc::now().timestamp();
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let outcome = state.gate.authorize(req.uri().path(), authorization, now);

    match outcome {
        Ok(GateOutcome::Public) => {}
        Ok(GateOutcome::Authenticated(principal)) => {
            record_token_validation("success", None);
            req.extensions_mut().insert(principal);
        }
        Err(rejection) => {
            tracing::debug!(
                target: "auth.gate",
                path = %req.uri().path(),
                stage = %rejection.stage,
                reason = %rejection.reason,
                "Request rejected"
            );
            record_token_validation("error", Some(rejection.reason.as_label()));
            return Err(ApiError::Unauthenticated);
        }
    }

    Ok(next.run(req).await)
}

/// Extension trait for reading the authenticated principal from a request.
pub trait PrincipalExt {
    /// Returns `None` on public paths or if the middleware was not applied.
    fn principal(&self) -> Option<&Principal>;
}

impl<B> PrincipalExt for axum::extract::Request<B> {
    fn principal(&self) -> Option<&Principal> {
        self.extensions().get::<Principal>()
    }
}
