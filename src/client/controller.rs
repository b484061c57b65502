//! Attach-then-retry-once wrapper around a [`Transport`].
//!
//! Every request goes out with the current access token. A 401 triggers one
//! silent refresh and one retry. Concurrent 401s share a single in-flight
//! refresh: the first caller starts it, everyone else awaits the same shared
//! future, and all of them observe the same outcome.

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

use super::error::{ClientError, RefreshFailed, TransportError};
use super::session::{AccessToken, Session};
use super::transport::{ApiRequest, ApiResponse, Transport};
use crate::api::UserInfo;
use crate::auth::{BEARER_PREFIX, REFRESH_PATH};

type RefreshFuture = Shared<BoxFuture<'static, Result<AccessToken, RefreshFailed>>>;

/// Server paths the controller talks to.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub login: String,
    pub refresh: String,
    pub logout: String,
    pub profile: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            login: "/login".to_string(),
            refresh: REFRESH_PATH.to_string(),
            logout: "/logout".to_string(),
            profile: "/api/me".to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenBody {
    access_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginBody {
    access_token: String,
    user: UserInfo,
}

#[derive(Deserialize)]
struct ProfileBody {
    user: UserInfo,
}

/// Client-side session controller.
pub struct SessionController<T: Transport> {
    transport: Arc<T>,
    session: Arc<Session>,
    endpoints: Arc<Endpoints>,
    pending: Arc<Mutex<Option<RefreshFuture>>>,
}

impl<T: Transport> Clone for SessionController<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            session: self.session.clone(),
            endpoints: self.endpoints.clone(),
            pending: self.pending.clone(),
        }
    }
}

impl<T: Transport> SessionController<T> {
    /// Create a controller with an empty session and default endpoints.
    pub fn new(transport: T) -> Self {
        Self::with_session(Arc::new(transport), Arc::new(Session::new()))
    }

    /// Create a controller around an existing transport and session.
    pub fn with_session(transport: Arc<T>, session: Arc<Session>) -> Self {
        Self {
            transport,
            session,
            endpoints: Arc::new(Endpoints::default()),
            pending: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = Arc::new(endpoints);
        self
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn current_user(&self) -> Option<UserInfo> {
        self.session.user()
    }

    /// Try to restore a session from an existing refresh cookie.
    ///
    /// Never fails: without a usable cookie the controller simply stays
    /// logged out. Returns whether a session was restored.
    pub async fn bootstrap(&self) -> bool {
        let token = match self.refresh().await {
            Ok(token) => token,
            Err(e) => {
                debug!(error = %e, "No session to restore");
                return false;
            }
        };

        let request = ApiRequest::get(self.endpoints.profile.as_str());
        match self.dispatch(&request, Some(&token)).await {
            Ok(response) if response.is_success() => match response.json::<ProfileBody>() {
                Ok(profile) => self.session.set_user(profile.user),
                Err(e) => warn!(error = %e, "Unreadable profile response"),
            },
            Ok(response) => warn!(status = %response.status, "Profile request failed"),
            Err(e) => warn!(error = %e, "Profile request failed"),
        }
        true
    }

    /// Log in with an email (or username) and password.
    pub async fn login(&self, identity: &str, password: &str) -> Result<UserInfo, ClientError> {
        let request = ApiRequest::post(self.endpoints.login.as_str()).json(serde_json::json!({
            "email": identity,
            "password": password,
        }));

        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(ClientError::Status(response.status));
        }

        let body: LoginBody = response.json()?;
        self.session
            .set(AccessToken::new(body.access_token), body.user.clone());
        Ok(body.user)
    }

    /// Log out. Local state is cleared even if the server call fails.
    pub async fn logout(&self) {
        let request = ApiRequest::post(self.endpoints.logout.as_str());
        match self.transport.send(request).await {
            Ok(response) if !response.is_success() => {
                warn!(status = %response.status, "Logout request failed")
            }
            Err(e) => warn!(error = %e, "Logout request failed"),
            Ok(_) => {}
        }
        self.session.clear();
    }

    /// Send a request with the current access token attached.
    ///
    /// A 401 on the first attempt triggers one refresh and, only if the
    /// refresh succeeds, exactly one retry. The retry's response is returned
    /// as-is, even if it is another 401. If the refresh fails the session is
    /// cleared and the original 401 response is returned.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        let sent_with = self.session.token();
        let response = self.dispatch(&request, sent_with.as_ref()).await?;

        if response.status != StatusCode::UNAUTHORIZED || self.is_refresh_call(&request) {
            return Ok(response);
        }

        // Past this point the request is on its one and only retry.
        let Some(token) = self.token_for_retry(sent_with.as_ref()).await else {
            return Ok(response);
        };

        debug!(path = %request.path, "Retrying request after refresh");
        Ok(self.dispatch(&request, Some(&token)).await?)
    }

    /// Send a GET and decode a successful JSON response.
    pub async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R, ClientError> {
        let response = self.send(ApiRequest::get(path)).await?;
        if !response.is_success() {
            return Err(ClientError::Status(response.status));
        }
        response.json()
    }

    /// Obtain a new access token, joining a refresh already in flight.
    pub async fn refresh(&self) -> Result<AccessToken, RefreshFailed> {
        let refresh = {
            let mut pending = lock(&self.pending);
            match pending.as_ref() {
                Some(in_flight) => {
                    debug!("Joining in-flight refresh");
                    in_flight.clone()
                }
                None => {
                    let refresh = run_refresh(
                        self.transport.clone(),
                        self.session.clone(),
                        self.endpoints.refresh.clone(),
                        self.pending.clone(),
                    )
                    .boxed()
                    .shared();
                    *pending = Some(refresh.clone());
                    refresh
                }
            }
        };
        refresh.await
    }

    /// Pick the token for the single retry. When another request already
    /// replaced the token this one was sent with, reuse that instead of
    /// refreshing again. When the session was cleared after this request
    /// went out (failed refresh or logout), there is nothing to retry with.
    async fn token_for_retry(&self, sent_with: Option<&AccessToken>) -> Option<AccessToken> {
        match (self.session.token(), sent_with) {
            (Some(current), Some(sent)) if current != *sent => Some(current),
            (None, Some(_)) => {
                debug!("Session ended while request was in flight");
                None
            }
            _ => self.refresh().await.ok(),
        }
    }

    fn is_refresh_call(&self, request: &ApiRequest) -> bool {
        request.path == self.endpoints.refresh
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        token: Option<&AccessToken>,
    ) -> Result<ApiResponse, TransportError> {
        let mut request = request.clone();
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("{}{}", BEARER_PREFIX, token.as_str()))
                .map_err(|e| TransportError(e.to_string()))?;
            request.headers.insert(AUTHORIZATION, value);
        }
        self.transport.send(request).await
    }
}

/// The body of the shared refresh future. Writes the outcome to the session
/// before releasing the in-flight slot, so a caller that finds the slot empty
/// already sees the new token.
async fn run_refresh<T: Transport>(
    transport: Arc<T>,
    session: Arc<Session>,
    path: String,
    slot: Arc<Mutex<Option<RefreshFuture>>>,
) -> Result<AccessToken, RefreshFailed> {
    let result = match transport.send(ApiRequest::post(path)).await {
        Ok(response) if response.is_success() => response
            .json::<TokenBody>()
            .map(|body| AccessToken::new(body.access_token))
            .map_err(|e| RefreshFailed::Decode(e.to_string())),
        Ok(response) => Err(RefreshFailed::Rejected(response.status)),
        Err(e) => Err(RefreshFailed::Transport(e)),
    };

    match &result {
        Ok(token) => {
            debug!("Access token refreshed");
            session.set_token(token.clone());
        }
        Err(e) => {
            debug!(error = %e, "Refresh failed, clearing session");
            session.clear();
        }
    }

    *lock(&slot) = None;
    result
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
