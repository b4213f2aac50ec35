//! Custom test assertions for expressive tests
//!
//! Provides trait-based assertions for issued tokens.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;

/// JWT header structure
#[derive(Debug, Deserialize)]
struct JwtHeader {
    pub alg: String,
    #[serde(default)]
    pub typ: Option<String>,
}

/// JWT claims structure
#[derive(Debug, Deserialize)]
struct JwtClaims {
    pub sub: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

fn segment(token: &str, index: usize) -> Vec<u8> {
    let part = token
        .split('.')
        .nth(index)
        .unwrap_or_else(|| panic!("JWT has no segment {index}"));
    URL_SAFE_NO_PAD
        .decode(part)
        .unwrap_or_else(|e| panic!("Failed to base64 decode JWT segment {index}: {e}"))
}

fn header(token: &str) -> JwtHeader {
    serde_json::from_slice(&segment(token, 0)).expect("Failed to parse JWT header JSON")
}

fn claims(token: &str) -> JwtClaims {
    serde_json::from_slice(&segment(token, 1)).expect("Failed to parse JWT claims JSON")
}

/// Custom assertions for issued tokens
///
/// # Example
/// ```rust,ignore
/// token
///     .assert_valid_jwt()
///     .assert_for_subject("alice")
///     .assert_has_role("user")
///     .assert_expires_in(3600);
/// ```
pub trait TokenAssertions {
    /// Assert that the token is a well-formed HMAC-signed JWT
    fn assert_valid_jwt(&self) -> &Self;

    /// Assert the header names the given algorithm
    fn assert_algorithm(&self, alg: &str) -> &Self;

    /// Assert that the token is for the specified subject
    fn assert_for_subject(&self, subject: &str) -> &Self;

    /// Assert that the token carries the specified role
    fn assert_has_role(&self, role: &str) -> &Self;

    /// Assert that `exp - iat` equals the given lifetime
    fn assert_expires_in(&self, seconds: u64) -> &Self;
}

impl TokenAssertions for str {
    fn assert_valid_jwt(&self) -> &Self {
        let parts: Vec<_> = self.split('.').collect();
        assert_eq!(
            parts.len(),
            3,
            "JWT must have 3 parts (header.payload.signature), got {}",
            parts.len()
        );

        let header = header(self);
        assert!(
            header.alg.starts_with("HS"),
            "Expected an HMAC algorithm, got {}",
            header.alg
        );
        assert_eq!(header.typ.as_deref(), Some("JWT"), "Expected JWT type");

        let claims = claims(self);
        assert!(
            claims.exp > claims.iat,
            "Token expires ({}) before it is issued ({})",
            claims.exp,
            claims.iat
        );
        assert!(!segment(self, 2).is_empty(), "JWT signature is empty");

        self
    }

    fn assert_algorithm(&self, alg: &str) -> &Self {
        let header = header(self);
        assert_eq!(header.alg, alg, "Unexpected JWT algorithm");
        self
    }

    fn assert_for_subject(&self, subject: &str) -> &Self {
        let claims = claims(self);
        assert_eq!(claims.sub, subject, "Token subject mismatch");
        self
    }

    fn assert_has_role(&self, role: &str) -> &Self {
        let claims = claims(self);
        assert_eq!(claims.role, role, "Token role mismatch");
        self
    }

    fn assert_expires_in(&self, seconds: u64) -> &Self {
        let claims = claims(self);
        let lifetime = claims.exp - claims.iat;
        assert_eq!(
            lifetime, seconds as i64,
            "Token lifetime is {lifetime}s, expected {seconds}s"
        );
        self
    }
}

impl TokenAssertions for String {
    fn assert_valid_jwt(&self) -> &Self {
        self.as_str().assert_valid_jwt();
        self
    }

    fn assert_algorithm(&self, alg: &str) -> &Self {
        self.as_str().assert_algorithm(alg);
        self
    }

    fn assert_for_subject(&self, subject: &str) -> &Self {
        self.as_str().assert_for_subject(subject);
        self
    }

    fn assert_has_role(&self, role: &str) -> &Self {
        self.as_str().assert_has_role(role);
        self
    }

    fn assert_expires_in(&self, seconds: u64) -> &Self {
        self.as_str().assert_expires_in(seconds);
        self
    }
}
