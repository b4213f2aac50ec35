//! Compact JWT issuance and signature verification.
//!
//! [`TokenCodec`] holds the one algorithm and key a deployment signs with.
//! It is built once at startup and shared read-only by every request.
//!
//! # Security
//!
//! - The `alg` header must equal the configured algorithm, checked BEFORE
//!   any MAC is computed (`none` and algorithm-confusion tokens never reach
//!   signature verification)
//! - Signature comparison is constant time (`ring::hmac::verify`)
//! - The payload is only parsed after the signature has been verified
//! - `verify` performs no time checks; see [`ClaimsPolicy`](super::claims::ClaimsPolicy)

use super::claims::Claims;
use common::jwt::{encode_segment, split_compact, JwtAlgorithm, JwtHeader, JwtValidationError};
use common::secret::{ExposeSecret, SecretBox};
use ring::hmac;
use std::fmt;
use thiserror::Error;

/// Errors from issuing or verifying a token.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Not three base64url segments of valid JSON, or over the size limit.
    #[error("Malformed token")]
    MalformedToken,

    /// Header `alg` differs from the configured algorithm.
    #[error("Unsupported token algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// MAC over `header.payload` does not match.
    #[error("Token signature mismatch")]
    SignatureMismatch,

    /// Claims with `exp <= iat` cannot be issued.
    #[error("Token lifetime must be positive")]
    InvalidLifetime,

    /// Signing key shorter than the algorithm's digest size.
    #[error("Signing key too short: expected at least {expected} bytes, got {actual}")]
    WeakKey { expected: usize, actual: usize },

    /// Header or claims failed to serialize.
    #[error("Token signing failed: {0}")]
    Signing(String),
}

impl TokenError {
    /// Bounded label for metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TokenError::MalformedToken => "malformed",
            TokenError::UnsupportedAlgorithm(_) => "unsupported_algorithm",
            TokenError::SignatureMismatch => "signature_mismatch",
            TokenError::InvalidLifetime => "invalid_lifetime",
            TokenError::WeakKey { .. } => "weak_key",
            TokenError::Signing(_) => "signing",
        }
    }
}

impl From<JwtValidationError> for TokenError {
    fn from(_: JwtValidationError) -> Self {
        // Oversized and structurally broken tokens are indistinguishable to callers
        TokenError::MalformedToken
    }
}

/// A signed token: header, claims and the MAC over both.
///
/// `Display` renders the compact `header.payload.signature` form.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    header: JwtHeader,
    payload: Claims,
    signature: Vec<u8>,
    compact: String,
}

impl Token {
    pub fn header(&self) -> &JwtHeader {
        &self.header
    }

    pub fn payload(&self) -> &Claims {
        &self.payload
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// The compact serialization, ready for an `Authorization: Bearer` header.
    pub fn as_str(&self) -> &str {
        &self.compact
    }

    pub fn into_string(self) -> String {
        self.compact
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.compact)
    }
}

/// The compact string is a bearer credential, so Debug omits it.
impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("header", &self.header)
            .field("payload", &self.payload)
            .field("signature", &"[REDACTED]")
            .finish()
    }
}

/// Signs and verifies compact JWTs with a single HMAC algorithm and key.
pub struct TokenCodec {
    algorithm: JwtAlgorithm,
    key: hmac::Key,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.algorithm)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

fn ring_algorithm(algorithm: JwtAlgorithm) -> hmac::Algorithm {
    match algorithm {
        JwtAlgorithm::Hs256 => hmac::HMAC_SHA256,
        JwtAlgorithm::Hs384 => hmac::HMAC_SHA384,
        JwtAlgorithm::Hs512 => hmac::HMAC_SHA512,
    }
}

impl TokenCodec {
    /// Build a codec for `algorithm` keyed with `signing_key`.
    ///
    /// # Errors
    ///
    /// Returns `WeakKey` if the key is shorter than the algorithm's digest.
    pub fn new(
        algorithm: JwtAlgorithm,
        signing_key: &SecretBox<Vec<u8>>,
    ) -> Result<Self, TokenError> {
        let key_bytes = signing_key.expose_secret();
        if key_bytes.len() < algorithm.min_key_len() {
            return Err(TokenError::WeakKey {
                expected: algorithm.min_key_len(),
                actual: key_bytes.len(),
            });
        }

        Ok(Self {
            algorithm,
            key: hmac::Key::new(ring_algorithm(algorithm), key_bytes),
        })
    }

    pub fn algorithm(&self) -> JwtAlgorithm {
        self.algorithm
    }

    /// Serialize and sign `claims`.
    ///
    /// Issuance is deterministic: the same claims and key always yield the
    /// same token.
    ///
    /// # Errors
    ///
    /// - `InvalidLifetime` - `claims.exp <= claims.iat`
    /// - `Signing` - JSON serialization failed
    pub fn issue(&self, claims: &Claims) -> Result<Token, TokenError> {
        if claims.exp <= claims.iat {
            return Err(TokenError::InvalidLifetime);
        }

        let header = JwtHeader::for_algorithm(self.algorithm);
        let header_json =
            serde_json::to_vec(&header).map_err(|e| TokenError::Signing(e.to_string()))?;
        let payload_json =
            serde_json::to_vec(claims).map_err(|e| TokenError::Signing(e.to_string()))?;

        let signing_input = format!(
            "{}.{}",
            encode_segment(&header_json),
            encode_segment(&payload_json)
        );
        let tag = hmac::sign(&self.key, signing_input.as_bytes());
        let signature = tag.as_ref().to_vec();
        let compact = format!("{signing_input}.{}", encode_segment(&signature));

        tracing::debug!(
            target: "auth.token",
            alg = %self.algorithm,
            exp = claims.exp,
            "Token issued"
        );

        Ok(Token {
            header,
            payload: claims.clone(),
            signature,
            compact,
        })
    }

    /// Check structure, algorithm and signature, then return the claims.
    ///
    /// Time-based validity is NOT checked here.
    ///
    /// # Errors
    ///
    /// - `MalformedToken` - size limit, segment count, base64 or JSON failure
    /// - `UnsupportedAlgorithm` - header `alg` is not the configured one
    /// - `SignatureMismatch` - MAC does not verify under the configured key
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let parts = split_compact(token)?;
        let header = parts.header()?;

        if header.alg != self.algorithm.as_str() {
            tracing::debug!(
                target: "auth.token",
                alg = %header.alg,
                expected = %self.algorithm,
                "Token rejected: unexpected algorithm"
            );
            return Err(TokenError::UnsupportedAlgorithm(header.alg));
        }

        let signature = parts.signature_bytes()?;
        hmac::verify(&self.key, parts.signing_input.as_bytes(), &signature).map_err(|_| {
            tracing::debug!(target: "auth.token", "Token rejected: signature mismatch");
            TokenError::SignatureMismatch
        })?;

        let payload = parts.payload_bytes()?;
        serde_json::from_slice::<Claims>(&payload).map_err(|e| {
            tracing::debug!(target: "auth.token", error = %e, "Failed to parse token claims");
            TokenError::MalformedToken
        })
    }
}
