//! Bearer token issuance and validation.
//!
//! - [`codec`] - compact JWT signing and signature verification
//! - [`claims`] - claim set and time-window policy

pub mod claims;
pub mod codec;

pub use claims::{Claims, ClaimsError, ClaimsPolicy};
pub use codec::{Token, TokenCodec, TokenError};
