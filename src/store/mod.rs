//! Credential lookup used by the login endpoint.
//!
//! The store is an external collaborator: the core only needs to find a user
//! by identity and ask the store whether a password matches. [`MemoryStore`]
//! is the bundled implementation for development and tests.

mod memory;

pub use memory::{MemoryStore, hash_password};

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

/// User role for authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

/// A user record as returned by the credential store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredUser {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub role: UserRole,
    /// Argon2 PHC string (`$argon2id$...`)
    pub password_hash: String,
}

/// Error raised by a credential store backend.
#[derive(Debug)]
pub struct StoreError(pub String);

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Credential store error: {}", self.0)
    }
}

impl std::error::Error for StoreError {}

/// Lookup interface for user credentials.
pub trait CredentialStore: Send + Sync {
    /// Find a user by login identity (email or username).
    fn find_user<'a>(
        &'a self,
        identity: &'a str,
    ) -> BoxFuture<'a, Result<Option<StoredUser>, StoreError>>;

    /// Check a plaintext password against the stored hash.
    fn verify_password(&self, user: &StoredUser, password: &str) -> bool;
}
