//! End-to-end tests driving the session controller against a live server.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{TestSetup, USER_EMAIL, USER_PASSWORD};
use reqwest::StatusCode;
use serde::Deserialize;
use tokenrelay::api::UserInfo;
use tokenrelay::client::{
    ApiRequest, ClientError, ReqwestTransport, Session, SessionController,
};

/// Short access lifetime for expiry tests. Expiry is checked in whole
/// seconds, so a token issued right after a refresh still has more than one
/// second left when the retry goes out.
const SHORT_TTL: u64 = 2;

/// Long enough for a token issued with [`SHORT_TTL`] to be expired.
const PAST_SHORT_TTL: Duration = Duration::from_millis(2100);

#[derive(Debug, Deserialize)]
struct MeResponse {
    message: String,
    user: UserInfo,
}

fn controller(base_url: url::Url) -> SessionController<ReqwestTransport> {
    SessionController::new(ReqwestTransport::new(base_url).unwrap())
}

#[tokio::test]
async fn test_login_and_fetch_profile() {
    let server = TestSetup::new().start().await;
    let client = controller(server.base_url());

    let user = client.login(USER_EMAIL, USER_PASSWORD).await.unwrap();
    assert_eq!(user.email, USER_EMAIL);
    assert!(client.is_authenticated());

    let me: MeResponse = client.get_json("/api/me").await.unwrap();
    assert_eq!(me.message, "Authorized");
    assert_eq!(me.user, user);
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let server = TestSetup::new().start().await;
    let client = controller(server.base_url());

    let result = client.login(USER_EMAIL, "wrong-password").await;

    assert!(matches!(
        result,
        Err(ClientError::Status(StatusCode::UNAUTHORIZED))
    ));
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_expired_access_token_refreshed_silently() {
    let server = TestSetup::new().with_access_ttl(SHORT_TTL).start().await;
    let client = controller(server.base_url());
    client.login(USER_EMAIL, USER_PASSWORD).await.unwrap();
    let first = client.session().token().unwrap();

    tokio::time::sleep(PAST_SHORT_TTL).await;

    let response = client.send(ApiRequest::get("/api/me")).await.unwrap();
    assert_eq!(response.status, StatusCode::OK);
    assert_ne!(client.session().token().unwrap(), first);
}

#[tokio::test]
async fn test_expired_refresh_token_ends_session() {
    let server = TestSetup::new()
        .with_access_ttl(SHORT_TTL)
        .with_refresh_ttl(SHORT_TTL)
        .start()
        .await;
    let client = controller(server.base_url());
    client.login(USER_EMAIL, USER_PASSWORD).await.unwrap();

    tokio::time::sleep(PAST_SHORT_TTL).await;

    let response = client.send(ApiRequest::get("/api/me")).await.unwrap();
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(!client.is_authenticated());
    assert!(client.current_user().is_none());
}

#[tokio::test]
async fn test_bootstrap_restores_session_from_cookie() {
    let server = TestSetup::new().start().await;
    let transport = Arc::new(ReqwestTransport::new(server.base_url()).unwrap());

    let first = SessionController::with_session(transport.clone(), Arc::new(Session::new()));
    first.login(USER_EMAIL, USER_PASSWORD).await.unwrap();

    // A fresh session sharing the same cookie jar, as after a page reload
    let second = SessionController::with_session(transport, Arc::new(Session::new()));
    assert!(!second.is_authenticated());

    assert!(second.bootstrap().await);
    assert!(second.is_authenticated());
    assert_eq!(second.current_user().unwrap().email, USER_EMAIL);
}

#[tokio::test]
async fn test_bootstrap_without_cookie() {
    let server = TestSetup::new().start().await;
    let client = controller(server.base_url());

    assert!(!client.bootstrap().await);
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_logout_prevents_bootstrap() {
    let server = TestSetup::new().start().await;
    let client = controller(server.base_url());
    client.login(USER_EMAIL, USER_PASSWORD).await.unwrap();

    client.logout().await;
    assert!(!client.is_authenticated());

    assert!(!client.bootstrap().await);
}

#[tokio::test]
async fn test_concurrent_requests_with_rotation() {
    let server = TestSetup::new()
        .with_access_ttl(SHORT_TTL)
        .with_rotation()
        .start()
        .await;
    let client = controller(server.base_url());
    client.login(USER_EMAIL, USER_PASSWORD).await.unwrap();

    tokio::time::sleep(PAST_SHORT_TTL).await;

    // With rotation a second refresh using the consumed cookie would fail,
    // so every request succeeding means they shared one refresh.
    let tasks: Vec<_> = (0..5)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.send(ApiRequest::get("/api/me")).await })
        })
        .collect();

    for task in tasks {
        let response = task.await.unwrap().unwrap();
        assert_eq!(response.status, StatusCode::OK);
    }
    assert!(client.is_authenticated());
}
