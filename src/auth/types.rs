//! Authentication user types.

use super::issuer::{AccessClaims, Subject};

/// Authenticated user information extracted from the access token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// Verified access token claims
    pub claims: AccessClaims,
}

impl AuthenticatedUser {
    pub fn subject(&self) -> Subject {
        self.claims.subject()
    }
}
