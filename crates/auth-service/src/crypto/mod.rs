//! Password hashing.
//!
//! bcrypt is deliberately slow; callers on the async runtime go through
//! [`crate::credentials::CredentialVerifier`], which moves this work onto
//! the blocking pool.

use crate::config::{MAX_BCRYPT_COST, MIN_BCRYPT_COST};
use crate::observability::metrics::record_bcrypt_duration;
use ring::rand::{SecureRandom, SystemRandom};
use std::time::Instant;
use thiserror::Error;
use tracing::instrument;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Invalid bcrypt cost: {cost} (must be {min}-{max})")]
    InvalidCost { cost: u32, min: u32, max: u32 },

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Password verification failed: {0}")]
    Verification(String),

    #[error("Random number generation failed")]
    Random,
}

/// Hash a password with bcrypt at `cost`.
#[instrument(skip_all)]
pub fn hash_password(password: &str, cost: u32) -> Result<String, CryptoError> {
    // Config validates too; direct callers must not get a weak hash either.
    if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) {
        return Err(CryptoError::InvalidCost {
            cost,
            min: MIN_BCRYPT_COST,
            max: MAX_BCRYPT_COST,
        });
    }

    let start = Instant::now();
    let result =
        bcrypt::hash(password, cost).map_err(|e| CryptoError::Hashing(e.to_string()));
    record_bcrypt_duration("hash", start.elapsed());
    result
}

/// Hash a random value nobody knows at `cost`.
///
/// Unknown usernames are verified against this so that they cost the same
/// as a wrong password. The cost must match the one real accounts use.
#[instrument(skip_all)]
pub fn generate_dummy_hash(cost: u32) -> Result<String, CryptoError> {
    let mut secret = [0u8; 32];
    SystemRandom::new()
        .fill(&mut secret)
        .map_err(|_| CryptoError::Random)?;
    hash_password(&hex::encode(secret), cost)
}

/// Verify a password against a bcrypt hash.
#[instrument(skip_all)]
pub fn verify_password(password: &str, hash: &str) -> Result<bool, CryptoError> {
    let start = Instant::now();
    let result =
        bcrypt::verify(password, hash).map_err(|e| CryptoError::Verification(e.to_string()));
    record_bcrypt_duration("verify", start.elapsed());
    result
}
