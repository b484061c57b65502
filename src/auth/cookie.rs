//! Refresh cookie parsing and Set-Cookie construction.

use axum::http::header;

/// Cookie name for the refresh token.
pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

/// Path of the refresh endpoint; the refresh cookie is scoped to it.
pub const REFRESH_PATH: &str = "/refresh";

/// Attributes of the refresh cookie. `HttpOnly` and `SameSite=Lax` are fixed.
#[derive(Debug, Clone)]
pub struct RefreshCookie {
    /// Path the cookie is restricted to
    pub path: String,
    /// Whether to set the Secure flag (true outside local development)
    pub secure: bool,
}

impl RefreshCookie {
    pub fn new(path: impl Into<String>, secure: bool) -> Self {
        Self {
            path: path.into(),
            secure,
        }
    }

    /// Set-Cookie value carrying a refresh token.
    pub fn set(&self, token: &str, max_age: u64) -> String {
        format!(
            "{}={}; HttpOnly; SameSite=Lax; Path={}; Max-Age={}{}",
            REFRESH_COOKIE_NAME,
            token,
            self.path,
            max_age,
            self.secure_suffix()
        )
    }

    /// Set-Cookie value deleting the refresh cookie at the same path.
    pub fn clear(&self) -> String {
        format!(
            "{}=; HttpOnly; SameSite=Lax; Path={}; Max-Age=0{}",
            REFRESH_COOKIE_NAME,
            self.path,
            self.secure_suffix()
        )
    }

    fn secure_suffix(&self) -> &'static str {
        if self.secure { "; Secure" } else { "" }
    }
}

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a axum::http::HeaderMap, name: &str) -> Option<&'a str> {
    for value in headers.get_all(header::COOKIE) {
        let Ok(cookie_header) = value.to_str() else {
            continue;
        };
        for part in cookie_header.split(';') {
            let part = part.trim();
            if let Some((key, value)) = part.split_once('=') {
                if key.trim() == name {
                    return Some(value.trim());
                }
            }
        }
    }
    None
}
