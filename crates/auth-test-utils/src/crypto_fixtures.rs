//! Deterministic signing keys for testing
//!
//! All fixtures are deterministic based on seed values.

use base64::engine::general_purpose;
use base64::Engine;

/// Length of every fixture key. Long enough for HS512.
pub const TEST_KEY_LEN: usize = 64;

/// Generate a deterministic HMAC signing key for testing.
///
/// The same seed always produces the same key, ensuring test reproducibility.
///
/// # Example
/// ```rust,ignore
/// let key = test_signing_key(1);
/// assert_eq!(key, test_signing_key(1));
/// ```
pub fn test_signing_key(seed: u8) -> Vec<u8> {
    (0..TEST_KEY_LEN)
        .map(|i| seed.wrapping_mul(i as u8).wrapping_add(i as u8) ^ 0x5c)
        .collect()
}

/// Standard base64 form of `test_signing_key`, as `JWT_SIGNING_KEY` expects.
pub fn test_signing_key_base64(seed: u8) -> String {
    general_purpose::STANDARD.encode(test_signing_key(seed))
}
