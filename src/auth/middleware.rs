//! Access token verification in front of protected routes.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use super::errors::{AuthError, AuthErrorKind};
use super::issuer::TokenIssuer;
use super::state::HasAuthBackend;
use super::types::AuthenticatedUser;

/// Authorization scheme prefix, including the separating space.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Extract the bearer value from the Authorization header.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthErrorKind> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthErrorKind::MissingToken)?;
    let value = value.to_str().map_err(|_| AuthErrorKind::MalformedToken)?;
    let token = value
        .strip_prefix(BEARER_PREFIX)
        .ok_or(AuthErrorKind::MalformedToken)?;

    if token.is_empty() || token.contains(char::is_whitespace) {
        return Err(AuthErrorKind::MalformedToken);
    }
    Ok(token)
}

/// Verify the request's access token and return the authenticated user.
/// Expired and forged tokens are rejected identically.
pub fn authenticate(
    headers: &HeaderMap,
    issuer: &TokenIssuer,
) -> Result<AuthenticatedUser, AuthErrorKind> {
    let token = extract_bearer(headers)?;
    let claims = issuer.verify_access(token).map_err(|e| {
        debug!(error = %e, "Access token rejected");
        AuthErrorKind::InvalidToken
    })?;
    Ok(AuthenticatedUser { claims })
}

/// Middleware that admits only requests with a valid access token and
/// attaches the [`AuthenticatedUser`] to the request extensions.
pub async fn require_access_token<S>(
    State(state): State<S>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError>
where
    S: HasAuthBackend + Clone + Send + Sync + 'static,
{
    let user = authenticate(request.headers(), state.issuer()).map_err(|kind| {
        debug!(reason = kind.as_str(), path = %request.uri().path(), "Unauthorized request");
        AuthError::from(kind)
    })?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
