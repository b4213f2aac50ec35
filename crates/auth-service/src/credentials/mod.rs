//! Username/password verification.
//!
//! - [`rules`] - username, password and role constraints
//! - [`store`] - `CredentialStore` trait and the in-memory implementation
//! - [`verifier`] - timing-uniform password checks and account registration

pub mod rules;
pub mod store;
pub mod verifier;

pub use rules::RuleViolation;
pub use store::{CredentialRecord, CredentialStore, InMemoryCredentialStore, StoreError};
pub use verifier::{CredentialError, CredentialVerifier};
