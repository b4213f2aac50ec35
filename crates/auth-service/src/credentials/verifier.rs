use super::store::{CredentialRecord, CredentialStore, StoreError};
use crate::config::SeedUser;
use crate::crypto::{self, CryptoError};
use crate::models::Principal;
use crate::observability::hash_for_correlation;
use common::secret::{ExposeSecret, SecretString};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::instrument;

/// Why a username/password pair was not accepted.
///
/// `NotFound` and `BadPassword` are kept apart for logs only; callers must
/// present both to clients as the same failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("Invalid credentials")]
    NotFound,

    #[error("Invalid credentials")]
    BadPassword,

    #[error("Password hashing error: {0}")]
    Hashing(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<CryptoError> for CredentialError {
    fn from(err: CryptoError) -> Self {
        CredentialError::Hashing(err.to_string())
    }
}

/// Checks passwords against stored bcrypt hashes and registers new accounts.
pub struct CredentialVerifier {
    store: Arc<dyn CredentialStore>,
    bcrypt_cost: u32,
    /// Stand-in hash for unknown usernames, at the same cost as real ones.
    dummy_hash: OnceCell<String>,
}

impl CredentialVerifier {
    pub fn new(store: Arc<dyn CredentialStore>, bcrypt_cost: u32) -> Self {
        Self {
            store,
            bcrypt_cost,
            dummy_hash: OnceCell::new(),
        }
    }

    /// Hash generated once per verifier at `bcrypt_cost`.
    ///
    /// [`seed`](Self::seed) runs at startup and creates it, so no request pays
    /// for the extra hash.
    pub async fn dummy_hash(&self) -> Result<&str, CredentialError> {
        let cost = self.bcrypt_cost;
        let hash = self
            .dummy_hash
            .get_or_try_init(|| async move {
                tokio::task::spawn_blocking(move || crypto::generate_dummy_hash(cost))
                    .await
                    .map_err(|e| CredentialError::Hashing(format!("bcrypt task failed: {e}")))?
                    .map_err(CredentialError::from)
            })
            .await?;
        Ok(hash.as_str())
    }

    /// Verify `password` for `username` and return the account's principal.
    ///
    /// Every call performs exactly one bcrypt verification, whether or not
    /// the username exists.
    ///
    /// # Errors
    ///
    /// - `NotFound` - no such username
    /// - `BadPassword` - password does not match
    /// - `Hashing` / `Store` - internal failures
    #[instrument(skip_all, name = "auth.credentials.verify")]
    pub async fn verify(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<Principal, CredentialError> {
        let record = self.store.lookup(username).await?;

        let hash = match &record {
            Some(r) => r.password_hash.clone(),
            None => self.dummy_hash().await?.to_string(),
        };
        let candidate = SecretString::from(password.expose_secret());
        let matched = tokio::task::spawn_blocking(move || {
            crypto::verify_password(candidate.expose_secret(), &hash)
        })
        .await
        .map_err(|e| CredentialError::Hashing(format!("bcrypt task failed: {e}")))?;

        let Some(record) = record else {
            // Result of the dummy comparison is irrelevant; only its cost matters
            tracing::debug!(
                target: "auth.credentials",
                username_hash = %hash_for_correlation(username),
                "Credential check failed: unknown username"
            );
            return Err(CredentialError::NotFound);
        };

        if !matched? {
            tracing::debug!(
                target: "auth.credentials",
                username_hash = %hash_for_correlation(username),
                "Credential check failed: password mismatch"
            );
            return Err(CredentialError::BadPassword);
        }

        Ok(Principal {
            subject: record.username,
            role: record.role,
        })
    }

    /// Hash `password` and store a new account.
    ///
    /// # Errors
    ///
    /// - `Store(Duplicate)` - username already taken
    /// - `Hashing` - bcrypt failure
    #[instrument(skip_all, name = "auth.credentials.register")]
    pub async fn register(
        &self,
        username: &str,
        password: &SecretString,
        role: &str,
    ) -> Result<CredentialRecord, CredentialError> {
        let cost = self.bcrypt_cost;
        let candidate = SecretString::from(password.expose_secret());
        let password_hash = tokio::task::spawn_blocking(move || {
            crypto::hash_password(candidate.expose_secret(), cost)
        })
        .await
        .map_err(|e| CredentialError::Hashing(format!("bcrypt task failed: {e}")))??;

        let record = CredentialRecord {
            username: username.to_string(),
            password_hash,
            role: role.to_string(),
        };
        self.store.insert(record.clone()).await?;

        tracing::info!(
            target: "auth.credentials",
            username_hash = %hash_for_correlation(username),
            role = %role,
            "Account registered"
        );

        Ok(record)
    }

    /// Prepare the dummy hash and register every configured seed account.
    /// Returns the number created.
    ///
    /// # Errors
    ///
    /// Fails on the first account that cannot be registered, including a
    /// duplicate username.
    pub async fn seed(&self, users: &[SeedUser]) -> Result<usize, CredentialError> {
        self.dummy_hash().await?;
        for user in users {
            self.register(&user.username, &user.password, &user.role)
                .await?;
        }
        Ok(users.len())
    }
}
