//! Credential storage.
//!
//! The verifier only depends on [`CredentialStore`]; the in-memory store is
//! what the binary runs with and what tests seed.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tokio::sync::RwLock;

/// A stored account: username, bcrypt hash and role.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub username: String,
    pub password_hash: String,
    pub role: String,
}

/// Custom Debug implementation that redacts the password hash.
impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("username", &self.username)
            .field("password_hash", &"[REDACTED]")
            .field("role", &self.role)
            .finish()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Username already exists")]
    Duplicate,

    #[error("Credential store unavailable: {0}")]
    Unavailable(String),
}

/// Lookup and insertion of credential records.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Fetch the record for `username`, if any.
    async fn lookup(&self, username: &str) -> Result<Option<CredentialRecord>, StoreError>;

    /// Store a new record. Fails with `Duplicate` if the username is taken.
    async fn insert(&self, record: CredentialRecord) -> Result<(), StoreError>;
}

/// Process-local credential store.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    records: RwLock<HashMap<String, CredentialRecord>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn lookup(&self, username: &str) -> Result<Option<CredentialRecord>, StoreError> {
        Ok(self.records.read().await.get(username).cloned())
    }

    async fn insert(&self, record: CredentialRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.username) {
            return Err(StoreError::Duplicate);
        }
        records.insert(record.username.clone(), record);
        Ok(())
    }
}
