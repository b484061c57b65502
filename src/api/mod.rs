mod error;
mod me;
mod session;

use axum::{Router, middleware};
use std::sync::Arc;

use crate::auth::{HasAuthBackend, RefreshCookie, TokenIssuer, require_access_token};
use crate::store::CredentialStore;

pub use error::ApiError;
pub use session::UserInfo;

/// Shared state for all endpoints.
#[derive(Clone)]
pub struct AppState {
    pub issuer: Arc<TokenIssuer>,
    pub store: Arc<dyn CredentialStore>,
    pub cookie: RefreshCookie,
}

impl HasAuthBackend for AppState {
    fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }
}

/// Public session routes: `/login`, `/refresh`, `/logout`.
pub fn create_session_router(state: AppState) -> Router {
    session::router(state)
}

/// Routes that require `Authorization: Bearer <access token>`.
pub fn create_protected_router(state: AppState) -> Router {
    me::router(state.clone()).layer(middleware::from_fn_with_state(
        state,
        require_access_token::<AppState>,
    ))
}
