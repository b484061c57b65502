//! Axum extractors for authentication.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::errors::AuthError;
use super::middleware::authenticate;
use super::state::HasAuthBackend;
use super::types::AuthenticatedUser;

/// Extractor for handlers that require an authenticated user.
///
/// Uses the user attached by [`require_access_token`](super::require_access_token)
/// when present, otherwise verifies the Authorization header itself.
pub struct Auth(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for Auth
where
    S: HasAuthBackend + Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>() {
            return Ok(Auth(user.clone()));
        }
        authenticate(&parts.headers, state.issuer())
            .map(Auth)
            .map_err(AuthError::from)
    }
}
