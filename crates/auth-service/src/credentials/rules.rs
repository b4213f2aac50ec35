//! Account field rules, applied to `/join` requests and configured seed
//! accounts alike.

use thiserror::Error;

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

/// bcrypt ignores input past 72 bytes.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Maximum username length, in characters.
pub const MAX_USERNAME_LEN: usize = 64;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RuleViolation {
    #[error("Username must be 1-{} characters", MAX_USERNAME_LEN)]
    UsernameLength,

    #[error("Username must not contain whitespace, control characters or ':'")]
    UsernameCharacters,

    #[error("Password must be at least {} characters", MIN_PASSWORD_LEN)]
    PasswordTooShort,

    #[error("Password must be at most {} bytes", MAX_PASSWORD_BYTES)]
    PasswordTooLong,

    #[error("Role must be non-empty without whitespace, control characters or ':'")]
    InvalidRole,
}

fn is_plain_token(value: &str) -> bool {
    !value
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || c == ':')
}

pub fn check_username(username: &str) -> Result<(), RuleViolation> {
    let len = username.chars().count();
    if len == 0 || len > MAX_USERNAME_LEN {
        return Err(RuleViolation::UsernameLength);
    }
    if !is_plain_token(username) {
        return Err(RuleViolation::UsernameCharacters);
    }
    Ok(())
}

pub fn check_password(password: &str) -> Result<(), RuleViolation> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(RuleViolation::PasswordTooShort);
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(RuleViolation::PasswordTooLong);
    }
    Ok(())
}

pub fn check_role(role: &str) -> Result<(), RuleViolation> {
    if role.is_empty() || !is_plain_token(role) {
        return Err(RuleViolation::InvalidRole);
    }
    Ok(())
}
