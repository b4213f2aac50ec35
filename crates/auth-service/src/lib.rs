//! Stateless bearer-token authentication service.
//!
//! Issues HMAC-signed JWTs in exchange for a username and password, and gates
//! every other route on a valid, unexpired token. No session state is kept
//! server-side.
//!
//! # Modules
//!
//! - `config` - Service configuration
//! - `credentials` - Credential store and password verification
//! - `crypto` - bcrypt password hashing
//! - `errors` - HTTP-facing error type
//! - `gate` - Per-request authorization state machine
//! - `handlers` - HTTP request handlers
//! - `middleware` - Auth gate and security-flag middleware
//! - `models` - Principal and response bodies
//! - `observability` - Metrics and log-safe hashing
//! - `routes` - Router and application state
//! - `token` - Token codec and claims policy

pub mod config;
pub mod credentials;
pub mod crypto;
pub mod errors;
pub mod gate;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod routes;
pub mod token;
