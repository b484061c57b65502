#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::Response;
use tokenrelay::jwt::{Claims, TokenType};
use tokenrelay::store::{MemoryStore, UserRole};
use tokenrelay::{ServerConfig, start_server};
use url::Url;

pub const ACCESS_SECRET: &[u8] = b"test-access-secret-0123456789abcdef";
pub const REFRESH_SECRET: &[u8] = b"test-refresh-secret-0123456789abcdef";

pub const USER_EMAIL: &str = "user@example.com";
pub const USER_PASSWORD: &str = "password123";

pub fn test_store() -> MemoryStore {
    MemoryStore::new()
        .with_user("1", USER_EMAIL, USER_PASSWORD, UserRole::User)
        .unwrap()
        .with_user("2", "admin@example.com", "admin-password", UserRole::Admin)
        .unwrap()
}

/// Builder for test server configurations.
pub struct TestSetup {
    access_ttl: u64,
    refresh_ttl: u64,
    rotate: bool,
    secure_cookies: bool,
}

impl TestSetup {
    pub fn new() -> Self {
        Self {
            access_ttl: 900,
            refresh_ttl: 7 * 24 * 60 * 60,
            rotate: false,
            secure_cookies: false,
        }
    }

    pub fn with_access_ttl(mut self, secs: u64) -> Self {
        self.access_ttl = secs;
        self
    }

    pub fn with_refresh_ttl(mut self, secs: u64) -> Self {
        self.refresh_ttl = secs;
        self
    }

    pub fn with_rotation(mut self) -> Self {
        self.rotate = true;
        self
    }

    pub fn with_secure_cookies(mut self) -> Self {
        self.secure_cookies = true;
        self
    }

    pub fn config(&self) -> ServerConfig {
        ServerConfig {
            store: Arc::new(test_store()),
            access_secret: ACCESS_SECRET.to_vec(),
            refresh_secret: REFRESH_SECRET.to_vec(),
            access_ttl: self.access_ttl,
            refresh_ttl: self.refresh_ttl,
            rotate_refresh_tokens: self.rotate,
            secure_cookies: self.secure_cookies,
        }
    }

    pub fn app(&self) -> axum::Router {
        tokenrelay::create_app(&self.config())
    }

    pub async fn start(&self) -> TestServer {
        let (handle, addr) = start_server(self.config(), 0)
            .await
            .expect("Failed to start server");
        TestServer { handle, addr }
    }
}

pub struct TestServer {
    handle: tokio::task::JoinHandle<()>,
    pub addr: SocketAddr,
}

impl TestServer {
    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}", self.addr)).expect("Invalid URL")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Sign claims directly with a chosen expiry, bypassing the issuer.
pub fn forge_token(secret: &[u8], token_type: TokenType, exp_offset: i64) -> String {
    let now = tokenrelay::jwt::now_secs().unwrap() as i64;
    let payload = serde_json::json!({
        "jti": "forged",
        "sub": "1",
        "email": USER_EMAIL,
        "role": "user",
    });
    let claims = Claims {
        payload,
        token_type,
        iat: (now - 60) as u64,
        exp: (now + exp_offset) as u64,
    };
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(secret),
    )
    .unwrap()
}

/// Extract Set-Cookie headers from response
pub fn extract_set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .collect()
}

/// Value of the refresh_token cookie set by a response, if any.
pub fn refresh_cookie_value(cookies: &[String]) -> Option<String> {
    cookies.iter().find_map(|c| {
        let value = c.strip_prefix("refresh_token=")?.split(';').next()?;
        (!value.is_empty()).then(|| value.to_string())
    })
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
