//! JWT utilities shared by the auth service and its test tooling.
//!
//! This module provides the wire-level pieces of compact JWT handling:
//! - Size limits for DoS prevention
//! - Clock skew bounds for `iat` tolerance
//! - The set of HMAC algorithms the service can be configured with
//! - Splitting a compact token into its segments and decoding the header
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE splitting or decoding (DoS prevention)
//! - Header inspection never verifies anything; callers MUST verify the
//!   signature before trusting any claim
//! - Error messages are generic; details are logged at debug level
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::jwt::{split_compact, JwtAlgorithm};
//!
//! let parts = split_compact(token)?;
//! let header = parts.header()?;
//! if header.alg != JwtAlgorithm::Hs256.as_str() {
//!     return Err("unsupported algorithm");
//! }
//! ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// JWTs larger than this are rejected BEFORE any base64 decoding or HMAC
/// computation. Typical tokens issued by this service are under 300 bytes.
pub const MAX_JWT_SIZE_BYTES: usize = 8192; // 8KB

/// Default clock skew tolerance for the `iat` lower bound.
///
/// Zero keeps the validity window exactly `[iat, exp)`.
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::ZERO;

/// Maximum allowed clock skew tolerance (10 minutes).
///
/// Prevents misconfiguration from silently widening the validity window.
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(600);

/// Token type written into every header.
pub const TOKEN_TYPE: &str = "JWT";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while inspecting a compact JWT.
///
/// Note: Display messages are intentionally generic to prevent information
/// leakage. The variant itself is kept for logging and metrics.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token size exceeds maximum allowed.
    #[error("The access token is invalid or expired")]
    TokenTooLarge,

    /// Token format is invalid (segment count, base64, or JSON).
    #[error("The access token is invalid or expired")]
    MalformedToken,

    /// Algorithm name is not one this crate knows about.
    #[error("Unsupported JWT algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

// =============================================================================
// Algorithms
// =============================================================================

/// HMAC algorithms a deployment can sign with.
///
/// Exactly one is configured server-side; tokens declaring any other `alg`
/// (including `none`) are refused before the signature is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JwtAlgorithm {
    /// HMAC with SHA-256.
    #[default]
    Hs256,
    /// HMAC with SHA-384.
    Hs384,
    /// HMAC with SHA-512.
    Hs512,
}

impl JwtAlgorithm {
    /// The `alg` header value (RFC 7518 section 3.1).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            JwtAlgorithm::Hs256 => "HS256",
            JwtAlgorithm::Hs384 => "HS384",
            JwtAlgorithm::Hs512 => "HS512",
        }
    }

    /// Minimum key length in bytes (the hash output size, per RFC 7518 3.2).
    #[must_use]
    pub fn min_key_len(&self) -> usize {
        match self {
            JwtAlgorithm::Hs256 => 32,
            JwtAlgorithm::Hs384 => 48,
            JwtAlgorithm::Hs512 => 64,
        }
    }
}

impl fmt::Display for JwtAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JwtAlgorithm {
    type Err = JwtValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HS256" => Ok(JwtAlgorithm::Hs256),
            "HS384" => Ok(JwtAlgorithm::Hs384),
            "HS512" => Ok(JwtAlgorithm::Hs512),
            other => Err(JwtValidationError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

// =============================================================================
// Header
// =============================================================================

/// JOSE header of a compact JWT.
///
/// Field order is the serialization order, which keeps issued headers
/// byte-for-byte stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtHeader {
    /// Declared signing algorithm.
    pub alg: String,

    /// Token type, `JWT` for everything this service issues.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
}

impl JwtHeader {
    /// Header for a token signed with `algorithm`.
    #[must_use]
    pub fn for_algorithm(algorithm: JwtAlgorithm) -> Self {
        Self {
            alg: algorithm.as_str().to_string(),
            typ: Some(TOKEN_TYPE.to_string()),
        }
    }
}

// =============================================================================
// Compact serialization
// =============================================================================

/// The three segments of a compact JWT, borrowed from the original string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactParts<'a> {
    /// base64url header segment.
    pub header: &'a str,
    /// base64url payload segment.
    pub payload: &'a str,
    /// base64url signature segment.
    pub signature: &'a str,
    /// `header.payload`, the bytes covered by the signature.
    pub signing_input: &'a str,
}

impl CompactParts<'_> {
    /// Decode and parse the header segment.
    ///
    /// # Errors
    ///
    /// Returns `MalformedToken` if the segment is not base64url JSON.
    pub fn header(&self) -> Result<JwtHeader, JwtValidationError> {
        let bytes = decode_segment(self.header)?;
        serde_json::from_slice(&bytes).map_err(|e| {
            tracing::debug!(target: "common.jwt", error = %e, "Failed to parse JWT header JSON");
            JwtValidationError::MalformedToken
        })
    }

    /// Decode the signature segment into raw MAC bytes.
    ///
    /// # Errors
    ///
    /// Returns `MalformedToken` if the segment is empty or not valid base64url.
    pub fn signature_bytes(&self) -> Result<Vec<u8>, JwtValidationError> {
        if self.signature.is_empty() {
            tracing::debug!(target: "common.jwt", "Token rejected: empty signature");
            return Err(JwtValidationError::MalformedToken);
        }
        decode_segment(self.signature)
    }

    /// Decode the payload segment into raw JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns `MalformedToken` if the segment is not valid base64url.
    pub fn payload_bytes(&self) -> Result<Vec<u8>, JwtValidationError> {
        decode_segment(self.payload)
    }
}

/// Split a compact JWT into its three segments without verifying anything.
///
/// # Security
///
/// - Token size is checked BEFORE any parsing (denial-of-service prevention)
/// - Header and payload must be non-empty. The signature may be empty, as
///   unsigned (`alg: none`) tokens are, so the caller can reject them by
///   algorithm; [`CompactParts::signature_bytes`] refuses an empty segment
///
/// # Errors
///
/// - `TokenTooLarge` - Token exceeds `MAX_JWT_SIZE_BYTES`
/// - `MalformedToken` - Not exactly three `.`-separated segments, or an
///   empty header or payload
pub fn split_compact(token: &str) -> Result<CompactParts<'_>, JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }

    let mut segments = token.split('.');
    let (Some(header), Some(payload), Some(signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        tracing::debug!(target: "common.jwt", "Token rejected: invalid JWT format");
        return Err(JwtValidationError::MalformedToken);
    };

    if header.is_empty() || payload.is_empty() {
        tracing::debug!(target: "common.jwt", "Token rejected: empty JWT segment");
        return Err(JwtValidationError::MalformedToken);
    }

    let signing_input = token
        .get(..header.len() + 1 + payload.len())
        .ok_or(JwtValidationError::MalformedToken)?;

    Ok(CompactParts {
        header,
        payload,
        signature,
        signing_input,
    })
}

/// base64url-encode (no padding) a token segment.
#[must_use]
pub fn encode_segment(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// base64url-decode (no padding) a token segment.
///
/// # Errors
///
/// Returns `MalformedToken` on invalid base64url input.
pub fn decode_segment(segment: &str) -> Result<Vec<u8>, JwtValidationError> {
    URL_SAFE_NO_PAD.decode(segment).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to decode JWT segment base64");
        JwtValidationError::MalformedToken
    })
}

// =============================================================================
// Tests
// =============================================================================
