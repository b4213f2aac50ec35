//! Per-request authorization decision.
//!
//! Each request walks a fixed sequence of stages:
//!
//! ```text
//! NoToken -> Extracted -> Decoded -> Validated -> Authorized
//! ```
//!
//! and is rejected at the first stage whose check fails. Requests for a
//! public path are authorized immediately and any token they carry is
//! ignored.
//!
//! The gate is pure: it takes the current time as an argument and holds only
//! immutable state, so one instance is shared by every request.

use crate::models::Principal;
use crate::token::{ClaimsError, ClaimsPolicy, TokenCodec, TokenError};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Progress of a request through the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateStage {
    /// No bearer token found yet.
    NoToken,
    /// Bearer token extracted from the `Authorization` header.
    Extracted,
    /// Signature verified and claims decoded.
    Decoded,
    /// Claims passed the time-window policy.
    Validated,
    /// Request may proceed.
    Authorized,
}

impl GateStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateStage::NoToken => "no_token",
            GateStage::Extracted => "extracted",
            GateStage::Decoded => "decoded",
            GateStage::Validated => "validated",
            GateStage::Authorized => "authorized",
        }
    }
}

impl fmt::Display for GateStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the gate refused a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    MissingToken,
    Token(TokenError),
    Claims(ClaimsError),
}

impl RejectReason {
    /// Bounded label for metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RejectReason::MissingToken => "missing_token",
            RejectReason::Token(e) => e.as_label(),
            RejectReason::Claims(e) => e.as_label(),
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::MissingToken => f.write_str("missing bearer token"),
            RejectReason::Token(e) => write!(f, "{e}"),
            RejectReason::Claims(e) => write!(f, "{e}"),
        }
    }
}

/// Internal rejection record. Never sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("rejected at stage {stage}: {reason}")]
pub struct GateRejection {
    pub stage: GateStage,
    pub reason: RejectReason,
}

/// Successful gate decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Path is on the public allow-list; no identity attached.
    Public,
    /// Token verified; the principal is attached to the request.
    Authenticated(Principal),
}

/// Extract the token from an `Authorization: Bearer <token>` value.
///
/// The scheme name is case-insensitive.
pub fn extract_bearer(authorization: Option<&str>) -> Option<&str> {
    let (scheme, token) = authorization?.trim_start().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Decides whether a request may reach its handler.
pub struct AuthGate {
    codec: Arc<TokenCodec>,
    policy: ClaimsPolicy,
    public_paths: HashSet<String>,
}

impl fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthGate")
            .field("codec", &self.codec)
            .field("policy", &self.policy)
            .field("public_paths", &self.public_paths)
            .finish()
    }
}

impl AuthGate {
    pub fn new<I, S>(codec: Arc<TokenCodec>, policy: ClaimsPolicy, public_paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            codec,
            policy,
            public_paths: public_paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Exact-match check against the public allow-list.
    pub fn is_public(&self, path: &str) -> bool {
        self.public_paths.contains(path)
    }

    /// Run a request through the gate.
    ///
    /// `authorization` is the raw `Authorization` header value, `now` the
    /// current Unix time in seconds.
    ///
    /// # Errors
    ///
    /// Returns the stage that failed and the reason:
    /// - `NoToken` / `MissingToken` - header absent or not a Bearer token
    /// - `Extracted` / `Token(_)` - structure, algorithm or signature failure
    /// - `Decoded` / `Claims(_)` - missing claim or outside `[iat, exp)`
    pub fn authorize(
        &self,
        path: &str,
        authorization: Option<&str>,
        now: i64,
    ) -> Result<GateOutcome, GateRejection> {
        if self.is_public(path) {
            return Ok(GateOutcome::Public);
        }

        let mut stage = GateStage::NoToken;

        let token = extract_bearer(authorization).ok_or(GateRejection {
            stage,
            reason: RejectReason::MissingToken,
        })?;
        stage = GateStage::Extracted;

        let claims = self.codec.verify(token).map_err(|e| GateRejection {
            stage,
            reason: RejectReason::Token(e),
        })?;
        stage = GateStage::Decoded;

        self.policy
            .validate(&claims, now)
            .map_err(|e| GateRejection {
                stage,
                reason: RejectReason::Claims(e),
            })?;
        stage = GateStage::Validated;

        let principal = claims.principal();
        tracing::trace!(target: "auth.gate", from = %stage, to = %GateStage::Authorized, "Gate passed");

        Ok(GateOutcome::Authenticated(principal))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::token::Claims;
    use common::jwt::JwtAlgorithm;
    use common::secret::SecretBox;
    use std::time::Duration;

    const T: i64 = 1_700_000_000;

    fn codec() -> Arc<TokenCodec> {
        let key = SecretBox::new(Box::new(vec![0x24; 32]));
        Arc::new(TokenCodec::new(JwtAlgorithm::Hs256, &key).unwrap())
    }

    fn gate() -> AuthGate {
        AuthGate::new(codec(), ClaimsPolicy::default(), ["/login", "/", "/join"])
    }

    fn bearer_for_alice() -> String {
        let claims = Claims::new("alice", "user", T, Duration::from_secs(3600));
        format!("Bearer {}", codec().issue(&claims).unwrap())
    }

    #[test]
    fn test_alice_authorized_inside_window() {
        let header = bearer_for_alice();
        let outcome = gate().authorize("/account", Some(&header), T + 10).unwrap();

        assert_eq!(
            outcome,
            GateOutcome::Authenticated(Principal {
                subject: "alice".to_string(),
                role: "user".to_string(),
            })
        );
    }

    #[test]
    fn test_alice_rejected_after_expiry() {
        let header = bearer_for_alice();
        let rejection = gate()
            .authorize("/account", Some(&header), T + 3601)
            .unwrap_err();

        assert_eq!(rejection.stage, GateStage::Decoded);
        assert_eq!(rejection.reason, RejectReason::Claims(ClaimsError::Expired));
    }

    #[test]
    fn test_public_path_without_token() {
        assert_eq!(gate().authorize("/login", None, T), Ok(GateOutcome::Public));
        assert_eq!(gate().authorize("/", None, T), Ok(GateOutcome::Public));
        assert_eq!(gate().authorize("/join", None, T), Ok(GateOutcome::Public));
    }

    #[test]
    fn test_public_path_ignores_invalid_token() {
        let outcome = gate().authorize("/login", Some("Bearer garbage"), T);
        assert_eq!(outcome, Ok(GateOutcome::Public));
    }

    #[test]
    fn test_public_match_is_exact() {
        for path in ["/login/", "/LOGIN", "/join/extra", "/loginx"] {
            let rejection = gate().authorize(path, None, T).unwrap_err();
            assert_eq!(rejection.reason, RejectReason::MissingToken, "{path}");
        }
    }

    #[test]
    fn test_protected_path_without_token() {
        let rejection = gate().authorize("/account", None, T).unwrap_err();
        assert_eq!(rejection.stage, GateStage::NoToken);
        assert_eq!(rejection.reason, RejectReason::MissingToken);
    }

    #[test]
    fn test_non_bearer_scheme_is_missing_token() {
        for header in ["Basic YWxpY2U6cGFzcw==", "Bearerabc", "Bearer ", "Token abc"] {
            let rejection = gate().authorize("/account", Some(header), T).unwrap_err();
            assert_eq!(rejection.reason, RejectReason::MissingToken, "{header}");
        }
    }

    #[test]
    fn test_malformed_token_rejected_at_extracted() {
        let rejection = gate()
            .authorize("/account", Some("Bearer not.a.jwt"), T)
            .unwrap_err();
        assert_eq!(rejection.stage, GateStage::Extracted);
        assert_eq!(rejection.reason, RejectReason::Token(TokenError::MalformedToken));
    }

    #[test]
    fn test_token_from_other_key_rejected_at_extracted() {
        let other_key = SecretBox::new(Box::new(vec![0x99; 32]));
        let other = TokenCodec::new(JwtAlgorithm::Hs256, &other_key).unwrap();
        let claims = Claims::new("alice", "user", T, Duration::from_secs(3600));
        let header = format!("Bearer {}", other.issue(&claims).unwrap());

        let rejection = gate().authorize("/account", Some(&header), T + 1).unwrap_err();
        assert_eq!(rejection.stage, GateStage::Extracted);
        assert_eq!(
            rejection.reason,
            RejectReason::Token(TokenError::SignatureMismatch)
        );
    }

    #[test]
    fn test_token_used_before_iat_rejected() {
        let header = bearer_for_alice();
        let rejection = gate().authorize("/account", Some(&header), T - 5).unwrap_err();
        assert_eq!(
            rejection.reason,
            RejectReason::Claims(ClaimsError::NotYetValid)
        );
    }

    #[test]
    fn test_token_missing_role_rejected() {
        let claims = Claims::new("alice", "", T, Duration::from_secs(3600));
        let header = format!("Bearer {}", codec().issue(&claims).unwrap());

        let rejection = gate().authorize("/account", Some(&header), T + 1).unwrap_err();
        assert_eq!(
            rejection.reason,
            RejectReason::Claims(ClaimsError::MissingClaim("role"))
        );
    }

    #[test]
    fn test_bearer_scheme_is_case_insensitive() {
        let header = bearer_for_alice();
        let token = header.trim_start_matches("Bearer ");

        for scheme in ["bearer", "BEARER", "bEaReR"] {
            let value = format!("{scheme} {token}");
            assert_eq!(extract_bearer(Some(&value)), Some(token), "{scheme}");
            assert!(
                gate().authorize("/account", Some(&value), T + 10).is_ok(),
                "{scheme} should authenticate"
            );
        }
    }

    #[test]
    fn test_unsigned_token_rejected_as_unsupported_algorithm() {
        let token = format!(
            "{}.{}.",
            common::jwt::encode_segment(br#"{"alg":"none","typ":"JWT"}"#),
            common::jwt::encode_segment(br#"{"sub":"alice","role":"admin","iat":1,"exp":9999999999}"#)
        );
        let header = format!("Bearer {token}");

        let rejection = gate().authorize("/account", Some(&header), T).unwrap_err();
        assert_eq!(rejection.stage, GateStage::Extracted);
        assert_eq!(
            rejection.reason,
            RejectReason::Token(TokenError::UnsupportedAlgorithm("none".to_string()))
        );
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer(Some("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(extract_bearer(Some("Bearer   padded  ")), Some("padded"));
        assert_eq!(extract_bearer(Some("Bearer")), None);
        assert_eq!(extract_bearer(None), None);
    }

    #[test]
    fn test_rejection_labels() {
        assert_eq!(RejectReason::MissingToken.as_label(), "missing_token");
        assert_eq!(
            RejectReason::Token(TokenError::SignatureMismatch).as_label(),
            "signature_mismatch"
        );
        assert_eq!(RejectReason::Claims(ClaimsError::Expired).as_label(), "expired");
    }

    #[test]
    fn test_rejection_display_names_stage() {
        let rejection = GateRejection {
            stage: GateStage::Decoded,
            reason: RejectReason::Claims(ClaimsError::Expired),
        };
        assert_eq!(rejection.to_string(), "rejected at stage decoded: Token has expired");
    }
}
