use serde::{Deserialize, Serialize};

/// Authenticated identity attached to a request by the auth gate.
///
/// Handlers read it with `Extension<Principal>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub subject: String,
    pub role: String,
}

/// Role assigned to accounts created through `/join`.
pub const DEFAULT_ROLE: &str = "user";

/// Successful `/login` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Successful `/join` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinResponse {
    pub username: String,
    pub role: String,
}

/// `/account` response: the caller's principal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResponse {
    pub subject: String,
    pub role: String,
}

impl From<Principal> for AccountResponse {
    fn from(principal: Principal) -> Self {
        Self {
            subject: principal.subject,
            role: principal.role,
        }
    }
}
