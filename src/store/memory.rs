//! In-memory credential store.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

use super::{CredentialStore, StoreError, StoredUser, UserRole};

/// Hash a password with Argon2id and a random salt, returning a PHC string.
pub fn hash_password(password: &str) -> Result<String, StoreError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| StoreError(e.to_string()))?;
    Ok(hash.to_string())
}

/// Credential store backed by a map keyed on lowercased email.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    users: HashMap<String, StoredUser>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user with a plaintext password (hashed before storing).
    pub fn with_user(
        mut self,
        id: &str,
        email: &str,
        password: &str,
        role: UserRole,
    ) -> Result<Self, StoreError> {
        self.insert(StoredUser {
            id: id.to_string(),
            email: email.to_string(),
            role,
            password_hash: hash_password(password)?,
        });
        Ok(self)
    }

    pub fn insert(&mut self, user: StoredUser) {
        self.users.insert(user.email.to_lowercase(), user);
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Load users from a JSON array of [`StoredUser`] records.
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let users: Vec<StoredUser> =
            serde_json::from_str(json).map_err(|e| StoreError(e.to_string()))?;
        let mut store = Self::new();
        for user in users {
            store.insert(user);
        }
        Ok(store)
    }

    pub fn from_file(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path).map_err(|e| StoreError(e.to_string()))?;
        Self::from_json(&content)
    }
}

impl CredentialStore for MemoryStore {
    fn find_user<'a>(
        &'a self,
        identity: &'a str,
    ) -> BoxFuture<'a, Result<Option<StoredUser>, StoreError>> {
        let user = self.users.get(&identity.trim().to_lowercase()).cloned();
        async move { Ok(user) }.boxed()
    }

    fn verify_password(&self, user: &StoredUser, password: &str) -> bool {
        let parsed = match PasswordHash::new(&user.password_hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(sub = %user.id, error = %e, "Stored password hash is not a PHC string");
                return false;
            }
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}
