//! Volatile client-side session state.

use std::sync::{PoisonError, RwLock};

use crate::api::UserInfo;

/// An access token held in memory.
///
/// Not `Serialize`. `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(..)")
    }
}

#[derive(Default)]
struct SessionState {
    token: Option<AccessToken>,
    user: Option<UserInfo>,
}

/// In-memory session: the current access token and user profile.
///
/// Created empty. Only login, refresh and logout write to it; the controller
/// owns those writes, everything else reads.
#[derive(Default)]
pub struct Session {
    state: RwLock<SessionState>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self) -> Option<AccessToken> {
        self.read(|s| s.token.clone())
    }

    pub fn user(&self) -> Option<UserInfo> {
        self.read(|s| s.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.read(|s| s.token.is_some())
    }

    pub(crate) fn set(&self, token: AccessToken, user: UserInfo) {
        self.write(|s| {
            s.token = Some(token);
            s.user = Some(user);
        });
    }

    pub(crate) fn set_token(&self, token: AccessToken) {
        self.write(|s| s.token = Some(token));
    }

    pub(crate) fn set_user(&self, user: UserInfo) {
        self.write(|s| s.user = Some(user));
    }

    pub(crate) fn clear(&self) {
        self.write(|s| *s = SessionState::default());
    }

    fn read<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        f(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn write(&self, f: impl FnOnce(&mut SessionState)) {
        f(&mut self.state.write().unwrap_or_else(PoisonError::into_inner))
    }
}
