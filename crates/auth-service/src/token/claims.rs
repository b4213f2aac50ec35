//! Token claims and the policy that validates them.
//!
//! Claims are produced by [`TokenCodec::verify`](super::codec::TokenCodec::verify)
//! with only structural and signature checks applied. [`ClaimsPolicy`] adds the
//! semantic checks: required claims present and the current time inside the
//! validity window `[iat, exp)`.

use crate::models::Principal;
use common::jwt::{DEFAULT_CLOCK_SKEW, MAX_CLOCK_SKEW};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Claims carried in every token this service issues.
///
/// Field order is the serialization order (`sub`, `role`, `iat`, `exp`), so
/// the same claims always produce the same payload bytes.
///
/// `sub` and `role` default to empty strings when absent from a payload so
/// that a missing claim surfaces as [`ClaimsError::MissingClaim`] rather than
/// a decode failure.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username) - redacted in Debug output.
    #[serde(default)]
    pub sub: String,

    /// Role granted to the subject.
    #[serde(default)]
    pub role: String,

    /// Issued-at timestamp (Unix epoch seconds).
    pub iat: i64,

    /// Expiration timestamp (Unix epoch seconds), exclusive.
    pub exp: i64,
}

/// Custom Debug implementation that redacts the `sub` field.
impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("sub", &"[REDACTED]")
            .field("role", &self.role)
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .finish()
    }
}

impl Claims {
    /// Claims for `sub`/`role` issued at `iat` and valid for `lifetime`.
    pub fn new(sub: impl Into<String>, role: impl Into<String>, iat: i64, lifetime: Duration) -> Self {
        #[allow(clippy::cast_possible_wrap)] // lifetime is bounded by config (max one day)
        let lifetime_secs = lifetime.as_secs() as i64;
        Self {
            sub: sub.into(),
            role: role.into(),
            iat,
            exp: iat.saturating_add(lifetime_secs),
        }
    }

    /// Seconds from `iat` until expiry.
    pub fn lifetime_seconds(&self) -> i64 {
        self.exp - self.iat
    }

    /// The authenticated identity these claims describe.
    pub fn principal(&self) -> Principal {
        Principal {
            subject: self.sub.clone(),
            role: self.role.clone(),
        }
    }
}

/// Claim validation failures.
///
/// These never reach a client; the gate collapses them into a single
/// unauthenticated response and keeps the variant for logs and metrics.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClaimsError {
    #[error("Token has expired")]
    Expired,

    #[error("Token is not yet valid")]
    NotYetValid,

    #[error("Missing required claim: {0}")]
    MissingClaim(&'static str),
}

impl ClaimsError {
    /// Bounded label for metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ClaimsError::Expired => "expired",
            ClaimsError::NotYetValid => "not_yet_valid",
            ClaimsError::MissingClaim(_) => "missing_claim",
        }
    }
}

/// Validates decoded claims against the current time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimsPolicy {
    clock_skew_seconds: i64,
}

impl Default for ClaimsPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_CLOCK_SKEW)
    }
}

impl ClaimsPolicy {
    /// Create a policy tolerating `clock_skew` on the `iat` lower bound.
    ///
    /// The skew is clamped to [`MAX_CLOCK_SKEW`]. It never extends `exp`.
    pub fn new(clock_skew: Duration) -> Self {
        #[allow(clippy::cast_possible_wrap)] // clamped to MAX_CLOCK_SKEW (600 seconds)
        let clock_skew_seconds = clock_skew.min(MAX_CLOCK_SKEW).as_secs() as i64;
        Self { clock_skew_seconds }
    }

    /// Configured `iat` tolerance in seconds.
    pub fn clock_skew_seconds(&self) -> i64 {
        self.clock_skew_seconds
    }

    /// Check required claims and that `now` falls inside `[iat, exp)`.
    ///
    /// # Errors
    ///
    /// - `MissingClaim` - `sub` or `role` is empty
    /// - `Expired` - `now >= exp`
    /// - `NotYetValid` - `now < iat` (less any configured skew)
    pub fn validate(&self, claims: &Claims, now: i64) -> Result<(), ClaimsError> {
        if claims.sub.trim().is_empty() {
            return Err(ClaimsError::MissingClaim("sub"));
        }
        if claims.role.trim().is_empty() {
            return Err(ClaimsError::MissingClaim("role"));
        }

        if now >= claims.exp {
            tracing::debug!(
                target: "auth.token",
                exp = claims.exp,
                now = now,
                "Token rejected: expired"
            );
            return Err(ClaimsError::Expired);
        }

        let earliest = claims.iat.saturating_sub(self.clock_skew_seconds);
        if now < earliest {
            tracing::debug!(
                target: "auth.token",
                iat = claims.iat,
                now = now,
                clock_skew_seconds = self.clock_skew_seconds,
                "Token rejected: iat in the future"
            );
            return Err(ClaimsError::NotYetValid);
        }

        Ok(())
    }
}
