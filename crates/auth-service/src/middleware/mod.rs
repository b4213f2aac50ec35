//! Middleware for the auth service.

pub mod auth;
pub mod security;

pub use auth::{require_auth, AuthState, PrincipalExt};
pub use security::apply_security_flags;
