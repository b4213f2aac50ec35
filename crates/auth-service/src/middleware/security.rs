//! Stateless security switches applied ahead of the auth gate.
//!
//! - CSRF: with `disable_csrf = false`, unsafe methods must carry an
//!   `X-Requested-With` header. Browsers cannot add it cross-origin without
//!   a CORS preflight, so no server-side token store is needed.
//! - Sessions: with `stateless_sessions = true`, `Set-Cookie` is removed from
//!   every response so no client session can be established.

use crate::config::SecurityFlags;
use crate::errors::ApiError;
use axum::{
    extract::{Request, State},
    http::{header, Method},
    middleware::Next,
    response::Response,
};

/// Header required on unsafe requests when CSRF protection is on.
pub const CSRF_HEADER: &str = "x-requested-with";

fn is_unsafe_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

pub async fn apply_security_flags(
    State(flags): State<SecurityFlags>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !flags.disable_csrf
        && is_unsafe_method(req.method())
        && !req.headers().contains_key(CSRF_HEADER)
    {
        tracing::debug!(
            target: "auth.gate",
            method = %req.method(),
            path = %req.uri().path(),
            "Request rejected: missing CSRF header"
        );
        return Err(ApiError::Forbidden(
            "Missing X-Requested-With header".to_string(),
        ));
    }

    let mut response = next.run(req).await;

    if flags.stateless_sessions {
        response.headers_mut().remove(header::SET_COOKIE);
    }

    Ok(response)
}
