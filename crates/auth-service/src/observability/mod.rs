//! Observability helpers for the auth service.
//!
//! # Privacy by Default
//!
//! Instrumented functions use `#[instrument(skip_all)]` and log fields from an
//! explicit allow-list:
//! - **SAFE**: logged in plaintext (outcomes, stages, error kinds)
//! - **HASHED**: SHA-256 prefix for correlation (usernames)
//! - **NEVER**: passwords, bearer tokens, signing keys

pub mod metrics;

use sha2::{Digest, Sha256};

/// Hash a field value for correlation in logs (SHA-256, first 8 hex chars).
///
/// Used for usernames, which need to correlate across log entries but should
/// not be stored in plaintext. Not a substitute for hashing secrets.
pub fn hash_for_correlation(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    // 32 bits is enough for correlation and limits reversibility
    hex::encode(digest.iter().take(4).copied().collect::<Vec<u8>>())
}
