//! Authentication error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Why a request failed authentication. Logged, never sent to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    /// No Authorization header
    MissingToken,
    /// Header present but not `Bearer <token>`
    MalformedToken,
    /// Bad signature, wrong type, bad claims or expired
    InvalidToken,
}

impl AuthErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthErrorKind::MissingToken => "missing_token",
            AuthErrorKind::MalformedToken => "malformed_token",
            AuthErrorKind::InvalidToken => "invalid_token",
        }
    }
}

/// Authentication rejection. Every kind renders the same 401 response.
#[derive(Debug)]
pub struct AuthError {
    pub kind: AuthErrorKind,
}

impl From<AuthErrorKind> for AuthError {
    fn from(kind: AuthErrorKind) -> Self {
        Self { kind }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            message: &'static str,
        }

        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                message: "Unauthorized",
            }),
        )
            .into_response()
    }
}
