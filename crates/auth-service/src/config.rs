//! Auth service configuration.
//!
//! Configuration is loaded from environment variables once at startup.
//! Missing or invalid values are fatal. The signing key and seed passwords
//! are redacted in Debug output.

use base64::{engine::general_purpose, Engine as _};
use common::jwt::{JwtAlgorithm, MAX_CLOCK_SKEW};
use common::secret::{ExposeSecret, SecretBox, SecretString};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::credentials::rules;

/// Default bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default token lifetime (1 hour).
pub const DEFAULT_TOKEN_TTL_SECONDS: u64 = 3600;

/// Maximum token lifetime (1 day).
pub const MAX_TOKEN_TTL_SECONDS: u64 = 86_400;

/// Default `iat` tolerance. Zero keeps the window exactly `[iat, exp)`.
pub const DEFAULT_JWT_CLOCK_SKEW_SECONDS: u64 = 0;

/// Default bcrypt cost factor.
pub const DEFAULT_BCRYPT_COST: u32 = 12;

/// Minimum bcrypt cost factor.
pub const MIN_BCRYPT_COST: u32 = 10;

/// Maximum bcrypt cost factor. Above this, a single login takes seconds.
pub const MAX_BCRYPT_COST: u32 = 14;

/// Paths reachable without a token.
pub const DEFAULT_PUBLIC_PATHS: [&str; 3] = ["/login", "/", "/join"];

/// Minimum decoded signing key length in bytes.
pub const MIN_SIGNING_KEY_BYTES: usize = 32;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigError::InvalidValue(format!(
                "LOG_FORMAT must be 'text' or 'json', got '{other}'"
            ))),
        }
    }
}

/// Filter-chain switches applied around every route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecurityFlags {
    /// When `false`, unsafe methods must carry `X-Requested-With`.
    pub disable_csrf: bool,
    /// When `true`, `Set-Cookie` is stripped from every response.
    pub stateless_sessions: bool,
}

impl Default for SecurityFlags {
    fn default() -> Self {
        Self {
            disable_csrf: true,
            stateless_sessions: true,
        }
    }
}

/// Account created at startup from `SEED_USERS`.
#[derive(Debug, Clone)]
pub struct SeedUser {
    pub username: String,
    pub password: SecretString,
    pub role: String,
}

/// Auth service configuration.
pub struct Config {
    /// HMAC signing key, decoded from base64.
    pub signing_key: SecretBox<Vec<u8>>,

    /// Algorithm tokens are signed and verified with (default HS256).
    pub jwt_algorithm: JwtAlgorithm,

    /// Lifetime of issued tokens in seconds (default 3600).
    pub token_ttl_seconds: u64,

    /// `iat` tolerance in seconds (default 0, max 600).
    pub jwt_clock_skew_seconds: u64,

    /// Server bind address (default "0.0.0.0:8080").
    pub bind_address: String,

    /// Exact paths that bypass the auth gate.
    pub public_paths: Vec<String>,

    pub security: SecurityFlags,

    /// bcrypt cost for new password hashes (default 12, range 10-14).
    pub bcrypt_cost: u32,

    /// Serve Prometheus metrics at `/metrics`.
    pub metrics_enabled: bool,

    pub log_format: LogFormat,

    /// Accounts to create at startup.
    pub seed_users: Vec<SeedUser>,
}

/// `SecretBox<Vec<u8>>` is not `Clone`, so the key is copied explicitly.
impl Clone for Config {
    fn clone(&self) -> Self {
        Self {
            signing_key: SecretBox::new(Box::new(self.signing_key.expose_secret().clone())),
            jwt_algorithm: self.jwt_algorithm,
            token_ttl_seconds: self.token_ttl_seconds,
            jwt_clock_skew_seconds: self.jwt_clock_skew_seconds,
            bind_address: self.bind_address.clone(),
            public_paths: self.public_paths.clone(),
            security: self.security,
            bcrypt_cost: self.bcrypt_cost,
            metrics_enabled: self.metrics_enabled,
            log_format: self.log_format,
            seed_users: self.seed_users.clone(),
        }
    }
}

/// Custom Debug implementation that redacts sensitive fields.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("signing_key", &"[REDACTED]")
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .field("jwt_clock_skew_seconds", &self.jwt_clock_skew_seconds)
            .field("bind_address", &self.bind_address)
            .field("public_paths", &self.public_paths)
            .field("security", &self.security)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("metrics_enabled", &self.metrics_enabled)
            .field("log_format", &self.log_format)
            .field("seed_users", &self.seed_users.len())
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid signing key: {0}")]
    InvalidSigningKey(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    #[error("Base64 decode error: {0}")]
    Base64Error(#[from] base64::DecodeError),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let jwt_algorithm = match vars.get("JWT_ALGORITHM") {
            Some(value) => value.parse::<JwtAlgorithm>().map_err(|_| {
                ConfigError::InvalidValue(format!(
                    "JWT_ALGORITHM must be HS256, HS384 or HS512, got '{value}'"
                ))
            })?,
            None => JwtAlgorithm::default(),
        };

        let key_base64 = vars
            .get("JWT_SIGNING_KEY")
            .ok_or_else(|| ConfigError::MissingEnvVar("JWT_SIGNING_KEY".to_string()))?;
        let key_bytes = general_purpose::STANDARD
            .decode(key_base64.trim())
            .map_err(ConfigError::Base64Error)?;

        let min_key_len = jwt_algorithm.min_key_len().max(MIN_SIGNING_KEY_BYTES);
        if key_bytes.len() < min_key_len {
            return Err(ConfigError::InvalidSigningKey(format!(
                "Expected at least {} bytes for {}, got {}",
                min_key_len,
                jwt_algorithm,
                key_bytes.len()
            )));
        }
        let signing_key = SecretBox::new(Box::new(key_bytes));

        let token_ttl_seconds = parse_ranged(
            vars,
            "TOKEN_TTL_SECONDS",
            DEFAULT_TOKEN_TTL_SECONDS,
            1..=MAX_TOKEN_TTL_SECONDS,
        )?;

        let jwt_clock_skew_seconds = parse_ranged(
            vars,
            "JWT_CLOCK_SKEW_SECONDS",
            DEFAULT_JWT_CLOCK_SKEW_SECONDS,
            0..=MAX_CLOCK_SKEW.as_secs(),
        )?;

        let bcrypt_cost = parse_ranged(
            vars,
            "BCRYPT_COST",
            DEFAULT_BCRYPT_COST,
            MIN_BCRYPT_COST..=MAX_BCRYPT_COST,
        )?;

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let metrics_enabled = parse_bool(vars, "METRICS_ENABLED", false)?;

        let mut public_paths = match vars.get("PUBLIC_PATHS") {
            Some(value) => parse_public_paths(value)?,
            None => DEFAULT_PUBLIC_PATHS.iter().map(|p| (*p).to_string()).collect(),
        };
        if metrics_enabled && !public_paths.iter().any(|p| p == "/metrics") {
            public_paths.push("/metrics".to_string());
        }

        let security = SecurityFlags {
            disable_csrf: parse_bool(vars, "DISABLE_CSRF", true)?,
            stateless_sessions: parse_bool(vars, "STATELESS_SESSIONS", true)?,
        };

        let log_format = match vars.get("LOG_FORMAT") {
            Some(value) => value.parse()?,
            None => LogFormat::default(),
        };

        let seed_users = match vars.get("SEED_USERS") {
            Some(value) => parse_seed_users(value)?,
            None => Vec::new(),
        };

        Ok(Config {
            signing_key,
            jwt_algorithm,
            token_ttl_seconds,
            jwt_clock_skew_seconds,
            bind_address,
            public_paths,
            security,
            bcrypt_cost,
            metrics_enabled,
            log_format,
            seed_users,
        })
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_seconds)
    }

    pub fn jwt_clock_skew(&self) -> Duration {
        Duration::from_secs(self.jwt_clock_skew_seconds)
    }
}

fn parse_ranged<T>(
    vars: &HashMap<String, String>,
    name: &str,
    default: T,
    range: std::ops::RangeInclusive<T>,
) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + fmt::Display + Copy,
{
    let Some(raw) = vars.get(name) else {
        return Ok(default);
    };

    let value = raw.trim().parse::<T>().map_err(|_| {
        ConfigError::InvalidValue(format!("{name} must be a number, got '{raw}'"))
    })?;

    if !range.contains(&value) {
        return Err(ConfigError::InvalidValue(format!(
            "{name} must be between {} and {}, got {value}",
            range.start(),
            range.end()
        )));
    }

    Ok(value)
}

fn parse_bool(
    vars: &HashMap<String, String>,
    name: &str,
    default: bool,
) -> Result<bool, ConfigError> {
    match vars.get(name).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) if matches!(v.as_str(), "true" | "1" | "yes") => Ok(true),
        Some(v) if matches!(v.as_str(), "false" | "0" | "no") => Ok(false),
        Some(v) => Err(ConfigError::InvalidValue(format!(
            "{name} must be a boolean, got '{v}'"
        ))),
    }
}

fn parse_public_paths(value: &str) -> Result<Vec<String>, ConfigError> {
    let mut paths = Vec::new();
    for path in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if !path.starts_with('/') {
            return Err(ConfigError::InvalidValue(format!(
                "PUBLIC_PATHS entries must start with '/', got '{path}'"
            )));
        }
        if !paths.iter().any(|p: &String| p == path) {
            paths.push(path.to_string());
        }
    }
    Ok(paths)
}

/// Parse `username:password:role` entries separated by `;`.
///
/// The username ends at the first `:` and the role starts after the last, so
/// passwords may contain `:`. Each entry must satisfy the same rules as a
/// `/join` request, and roles must be a single token.
fn parse_seed_users(value: &str) -> Result<Vec<SeedUser>, ConfigError> {
    value
        .split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .enumerate()
        .map(|(index, entry)| {
            // Never echo the entry back; it contains a password
            let fields = entry
                .split_once(':')
                .and_then(|(username, rest)| {
                    rest.rsplit_once(':')
                        .map(|(password, role)| (username, password, role))
                });
            let Some((username, password, role)) = fields else {
                return Err(ConfigError::InvalidValue(format!(
                    "SEED_USERS entry {} must be 'username:password:role'",
                    index + 1
                )));
            };

            rules::check_username(username)
                .and_then(|()| rules::check_password(password))
                .and_then(|()| rules::check_role(role))
                .map_err(|violation| {
                    ConfigError::InvalidValue(format!(
                        "SEED_USERS entry {}: {}",
                        index + 1,
                        violation
                    ))
                })?;

            Ok(SeedUser {
                username: username.to_string(),
                password: SecretString::from(password),
                role: role.to_string(),
            })
        })
        .collect()
}
