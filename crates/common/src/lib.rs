//! Common utilities and types shared across the auth workspace.

#![warn(clippy::pedantic)]

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for JWT wire utilities (size limits, algorithms, compact segments)
pub mod jwt;
