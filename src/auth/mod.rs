//! Stateless token authentication.
//!
//! Dual-token system: short-lived access tokens sent as `Authorization:
//! Bearer` headers, and long-lived refresh tokens carried in an HttpOnly
//! cookie scoped to the refresh endpoint. The two are signed with distinct
//! secrets.

mod cookie;
mod errors;
mod extractors;
mod issuer;
mod middleware;
mod rotation;
mod state;
mod types;

pub use cookie::{REFRESH_COOKIE_NAME, REFRESH_PATH, RefreshCookie, get_cookie};
pub use errors::{AuthError, AuthErrorKind};
pub use extractors::Auth;
pub use issuer::{
    ACCESS_TOKEN_TTL_SECS, AccessClaims, AccessPayload, MAX_TOKEN_TTL_SECS,
    REFRESH_TOKEN_TTL_SECS, RefreshClaims, RefreshPayload, Subject, TokenIssuer,
};
pub use middleware::{BEARER_PREFIX, authenticate, extract_bearer, require_access_token};
pub use state::HasAuthBackend;
pub use types::AuthenticatedUser;
