pub mod api;
pub mod auth;
pub mod cli;
pub mod client;
pub mod jwt;
pub mod store;

use api::{AppState, create_protected_router, create_session_router};
use auth::{REFRESH_PATH, RefreshCookie, TokenIssuer};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use store::CredentialStore;
use tokio::net::TcpListener;

pub struct ServerConfig {
    /// Credential lookup used by `/login`
    pub store: Arc<dyn CredentialStore>,
    /// Secret for signing access tokens
    pub access_secret: Vec<u8>,
    /// Secret for signing refresh tokens (must differ from the access secret)
    pub refresh_secret: Vec<u8>,
    /// Access token lifetime in seconds
    pub access_ttl: u64,
    /// Refresh token lifetime in seconds (also the refresh cookie's Max-Age)
    pub refresh_ttl: u64,
    /// Issue a new refresh token on every refresh and reject the old one
    pub rotate_refresh_tokens: bool,
    /// Whether to set Secure flag on cookies (should be true in production with HTTPS)
    pub secure_cookies: bool,
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    let issuer = TokenIssuer::new(&config.access_secret, &config.refresh_secret)
        .with_ttls(config.access_ttl, config.refresh_ttl)
        .with_rotation(config.rotate_refresh_tokens);

    let state = AppState {
        issuer: Arc::new(issuer),
        store: config.store.clone(),
        cookie: RefreshCookie::new(REFRESH_PATH, config.secure_cookies),
    };

    Router::new()
        .merge(create_session_router(state.clone()))
        .nest("/api", create_protected_router(state))
}

/// Run the server on the given listener. This function blocks until the server exits.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, make_service).await
}

/// Start the server on the given port in a background task. Use port 0 to let the OS choose a random port.
/// Returns the actual address the server is listening on.
pub async fn start_server(
    config: ServerConfig,
    port: u16,
) -> Result<(tokio::task::JoinHandle<()>, SocketAddr), std::io::Error> {
    let addr = format!("127.0.0.1:{}", port);
    let listener = TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = run_server(config, listener).await {
            tracing::error!(error = %e, "Server error");
        }
    });

    Ok((handle, local_addr))
}
