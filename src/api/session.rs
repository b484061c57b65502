//! Session endpoints.
//!
//! - POST `/login` - Verify credentials, return an access token and set the refresh cookie
//! - POST `/refresh` - Exchange the refresh cookie for a new access token
//! - POST `/logout` - Clear the refresh cookie

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse},
    routing::post,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::AppState;
use super::error::{ApiError, ResultExt};
use crate::auth::{REFRESH_COOKIE_NAME, REFRESH_PATH, Subject, get_cookie};
use crate::store::UserRole;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/login", post(login))
        .route(REFRESH_PATH, post(refresh))
        .route("/logout", post(logout))
        .with_state(state)
}

#[derive(Deserialize)]
struct LoginRequest {
    #[serde(alias = "username")]
    email: String,
    password: String,
}

/// Public view of a user, returned by login and `/api/me`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub role: UserRole,
}

impl From<Subject> for UserInfo {
    fn from(subject: Subject) -> Self {
        Self {
            id: subject.id,
            email: subject.email,
            role: subject.role,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    access_token: String,
    expires_in: u64,
    user: UserInfo,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let identity = payload.email.trim();
    if identity.is_empty() || payload.password.is_empty() {
        return Err(ApiError::invalid_credentials());
    }

    let user = state
        .store
        .find_user(identity)
        .await
        .store_err("Failed to look up user")?;

    let Some(user) = user.filter(|u| state.store.verify_password(u, &payload.password)) else {
        warn!(identity = %identity, "Login rejected");
        return Err(ApiError::invalid_credentials());
    };

    let subject = Subject::from(&user);
    let access = state
        .issuer
        .issue_access(&subject)
        .sign_err("Failed to generate access token")?;
    let refresh = state
        .issuer
        .issue_refresh(&subject)
        .sign_err("Failed to generate refresh token")?;

    info!(sub = %subject.id, "Login succeeded");

    Ok((
        StatusCode::OK,
        [(SET_COOKIE, state.cookie.set(&refresh.token, refresh.ttl))],
        Json(LoginResponse {
            access_token: access.token,
            expires_in: access.ttl,
            user: subject.into(),
        }),
    ))
}

/// Reachable without an access token; the refresh cookie is the only credential.
async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = get_cookie(&headers, REFRESH_COOKIE_NAME).ok_or_else(ApiError::unauthorized)?;

    let claims = state.issuer.verify_refresh(token).map_err(|e| {
        warn!(error = %e, "Refresh token rejected");
        ApiError::unauthorized()
    })?;

    if !state.issuer.is_current(&claims) {
        warn!(sub = %claims.payload.sub, jti = %claims.payload.jti, "Superseded refresh token presented");
        return Err(ApiError::unauthorized());
    }

    let mut cookies = Vec::new();
    if state.issuer.rotation_enabled() {
        let Some(next) = state
            .issuer
            .rotate(&claims)
            .sign_err("Failed to generate refresh token")?
        else {
            warn!(sub = %claims.payload.sub, jti = %claims.payload.jti, "Refresh token already rotated");
            return Err(ApiError::unauthorized());
        };
        cookies.push((SET_COOKIE, state.cookie.set(&next.token, next.ttl)));
    }

    let access = state
        .issuer
        .issue_access(&claims.subject())
        .sign_err("Failed to generate access token")?;

    info!(sub = %claims.payload.sub, jti = %claims.payload.jti, rotated = !cookies.is_empty(), "Access token refreshed");

    Ok((
        StatusCode::OK,
        AppendHeaders(cookies),
        Json(RefreshResponse {
            access_token: access.token,
            expires_in: access.ttl,
        }),
    ))
}

async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(SET_COOKIE, state.cookie.clear())],
        Json(MessageResponse {
            message: "Logged out",
        }),
    )
}
