//! Protected profile endpoint.

use axum::{Json, Router, response::IntoResponse, routing::get};
use serde::Serialize;

use super::AppState;
use super::session::UserInfo;
use crate::auth::Auth;

pub fn router(state: AppState) -> Router {
    Router::new().route("/me", get(me)).with_state(state)
}

#[derive(Serialize)]
struct MeResponse {
    message: &'static str,
    user: UserInfo,
}

async fn me(Auth(user): Auth) -> impl IntoResponse {
    Json(MeResponse {
        message: "Authorized",
        user: user.subject().into(),
    })
}
