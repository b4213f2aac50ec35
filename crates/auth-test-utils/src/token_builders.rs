//! Builder patterns for test tokens
//!
//! Tokens are signed with `jsonwebtoken`, independently of the service's own
//! codec, so tests can also forge tokens the service must refuse.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{json, Map, Value};

/// Builder for creating test JWTs
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::new()
///     .for_user("alice")
///     .with_role("admin")
///     .expires_in(3600)
///     .sign(&test_signing_key(1));
/// ```
pub struct TestTokenBuilder {
    sub: Option<String>,
    role: Option<String>,
    exp: i64,
    iat: i64,
}

impl TestTokenBuilder {
    /// Create a new token builder with defaults
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            sub: Some("test-subject".to_string()),
            role: Some("user".to_string()),
            exp: (now + Duration::seconds(3600)).timestamp(),
            iat: now.timestamp(),
        }
    }

    /// Set the subject
    pub fn for_user(mut self, subject: &str) -> Self {
        self.sub = Some(subject.to_string());
        self
    }

    /// Set the role
    pub fn with_role(mut self, role: &str) -> Self {
        self.role = Some(role.to_string());
        self
    }

    /// Leave `sub` out of the payload
    pub fn without_subject(mut self) -> Self {
        self.sub = None;
        self
    }

    /// Leave `role` out of the payload
    pub fn without_role(mut self) -> Self {
        self.role = None;
        self
    }

    /// Set expiration in seconds from now (negative for already expired)
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self
    }

    /// Set issued-at timestamp
    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.iat = timestamp;
        self
    }

    /// Set expiration timestamp
    pub fn expires_at(mut self, timestamp: i64) -> Self {
        self.exp = timestamp;
        self
    }

    /// Build the claims as a JSON value
    pub fn build(self) -> Value {
        let mut claims = Map::new();
        if let Some(sub) = self.sub {
            claims.insert("sub".to_string(), json!(sub));
        }
        if let Some(role) = self.role {
            claims.insert("role".to_string(), json!(role));
        }
        claims.insert("iat".to_string(), json!(self.iat));
        claims.insert("exp".to_string(), json!(self.exp));
        Value::Object(claims)
    }

    /// Sign as HS256 with `key`
    pub fn sign(self, key: &[u8]) -> String {
        self.sign_with(Algorithm::HS256, key)
    }

    /// Sign with an arbitrary HMAC algorithm
    pub fn sign_with(self, algorithm: Algorithm, key: &[u8]) -> String {
        jsonwebtoken::encode(
            &Header::new(algorithm),
            &self.build(),
            &EncodingKey::from_secret(key),
        )
        .expect("Failed to sign test token")
    }

    /// Produce an unsigned `alg: none` token with an empty signature segment
    pub fn sign_unsecured(self) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD
            .encode(serde_json::to_vec(&self.build()).expect("Failed to serialize claims"));
        format!("{header}.{payload}.")
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}
