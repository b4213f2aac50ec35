//! Wrappers for the two secrets the service handles.
//!
//! Passwords arrive in `/login` and `/join` bodies and are held as
//! [`SecretString`] from deserialization until bcrypt consumes them. The HMAC
//! signing key is decoded once at startup into a `SecretBox<Vec<u8>>`. Both
//! print as `[REDACTED]` under `Debug`, so request and config structs can
//! derive or hand-write `Debug` without leaking them, and both are zeroized
//! on drop. Reading the value takes an explicit [`ExposeSecret::expose_secret`].

pub use secrecy::{ExposeSecret, SecretBox, SecretString};
