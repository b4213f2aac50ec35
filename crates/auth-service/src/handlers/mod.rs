//! HTTP request handlers for the auth service.

pub mod account;
pub mod auth_handler;
pub mod home;
pub mod metrics;

pub use account::get_account;
pub use auth_handler::{handle_join, handle_login};
pub use home::{home, not_found};
pub use metrics::metrics_handler;
