//! Minting and verifying the two token classes.
//!
//! Issuance is pure: nothing is recorded anywhere. Holding a valid refresh
//! token is the session. The only server-side state is the optional rotation
//! generation counter.

use serde::{Deserialize, Serialize};

use super::rotation::RefreshGenerations;
use crate::jwt::{Claims, JwtError, SignedToken, TokenCodec, TokenType};
use crate::store::{StoredUser, UserRole};

/// Access token lifetime: 15 minutes
pub const ACCESS_TOKEN_TTL_SECS: u64 = 15 * 60;

/// Refresh token lifetime: 7 days
pub const REFRESH_TOKEN_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Upper bound accepted for either lifetime: 10 years
pub const MAX_TOKEN_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// The authenticated principal a token is issued for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    pub email: String,
    pub role: UserRole,
}

impl From<&StoredUser> for Subject {
    fn from(user: &StoredUser) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Payload of an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPayload {
    /// Subject (user id)
    pub sub: String,
    pub email: String,
    pub role: UserRole,
}

/// Payload of a refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshPayload {
    /// JWT ID, unique per refresh token
    pub jti: String,
    /// Subject (user id)
    pub sub: String,
    pub email: String,
    pub role: UserRole,
    /// Rotation generation, only present when rotation is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<u64>,
}

pub type AccessClaims = Claims<AccessPayload>;
pub type RefreshClaims = Claims<RefreshPayload>;

impl AccessClaims {
    pub fn subject(&self) -> Subject {
        Subject {
            id: self.payload.sub.clone(),
            email: self.payload.email.clone(),
            role: self.payload.role,
        }
    }
}

impl RefreshClaims {
    pub fn subject(&self) -> Subject {
        Subject {
            id: self.payload.sub.clone(),
            email: self.payload.email.clone(),
            role: self.payload.role,
        }
    }
}

/// Issues access and refresh tokens, each signed with its own secret.
pub struct TokenIssuer {
    access: TokenCodec,
    refresh: TokenCodec,
    access_ttl: u64,
    refresh_ttl: u64,
    generations: Option<RefreshGenerations>,
}

impl TokenIssuer {
    /// Create an issuer with default lifetimes and no refresh rotation.
    pub fn new(access_secret: &[u8], refresh_secret: &[u8]) -> Self {
        Self {
            access: TokenCodec::new(TokenType::Access, access_secret),
            refresh: TokenCodec::new(TokenType::Refresh, refresh_secret),
            access_ttl: ACCESS_TOKEN_TTL_SECS,
            refresh_ttl: REFRESH_TOKEN_TTL_SECS,
            generations: None,
        }
    }

    pub fn with_ttls(mut self, access_ttl: u64, refresh_ttl: u64) -> Self {
        self.access_ttl = access_ttl;
        self.refresh_ttl = refresh_ttl;
        self
    }

    /// Enable refresh token rotation backed by a per-subject generation counter.
    pub fn with_rotation(mut self, enabled: bool) -> Self {
        self.generations = enabled.then(RefreshGenerations::new);
        self
    }

    pub fn rotation_enabled(&self) -> bool {
        self.generations.is_some()
    }

    pub fn access_ttl(&self) -> u64 {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> u64 {
        self.refresh_ttl
    }

    pub fn issue_access(&self, subject: &Subject) -> Result<SignedToken, JwtError> {
        let payload = AccessPayload {
            sub: subject.id.clone(),
            email: subject.email.clone(),
            role: subject.role,
        };
        self.access.sign(payload, self.access_ttl)
    }

    /// Issue a refresh token stamped with the subject's current generation.
    pub fn issue_refresh(&self, subject: &Subject) -> Result<SignedToken, JwtError> {
        let generation = self.generations.as_ref().map(|g| g.current(&subject.id));
        self.sign_refresh(subject, generation)
    }

    fn sign_refresh(
        &self,
        subject: &Subject,
        generation: Option<u64>,
    ) -> Result<SignedToken, JwtError> {
        let payload = RefreshPayload {
            jti: uuid::Uuid::new_v4().to_string(),
            sub: subject.id.clone(),
            email: subject.email.clone(),
            role: subject.role,
            generation,
        };
        self.refresh.sign(payload, self.refresh_ttl)
    }

    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, JwtError> {
        self.access.verify(token)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, JwtError> {
        self.refresh.verify(token)
    }

    /// Whether a verified refresh token is still the subject's live generation.
    /// Always true when rotation is disabled.
    pub fn is_current(&self, claims: &RefreshClaims) -> bool {
        match &self.generations {
            None => true,
            Some(generations) => {
                claims.payload.generation == Some(generations.current(&claims.payload.sub))
            }
        }
    }

    /// Consume a refresh token and mint its successor.
    ///
    /// Returns `Ok(None)` when rotation is disabled, or when another refresh
    /// already consumed this token's generation.
    pub fn rotate(&self, claims: &RefreshClaims) -> Result<Option<SignedToken>, JwtError> {
        let Some(generations) = &self.generations else {
            return Ok(None);
        };
        let Some(expected) = claims.payload.generation else {
            return Ok(None);
        };
        match generations.advance(&claims.payload.sub, expected) {
            Some(next) => self.sign_refresh(&claims.subject(), Some(next)).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCESS_SECRET: &[u8] = b"access-secret-for-testing-000000";
    const REFRESH_SECRET: &[u8] = b"refresh-secret-for-testing-00000";

    fn alice() -> Subject {
        Subject {
            id: "1".to_string(),
            email: "alice@example.com".to_string(),
            role: UserRole::User,
        }
    }

    #[test]
    fn test_issue_and_verify_access() {
        let issuer = TokenIssuer::new(ACCESS_SECRET, REFRESH_SECRET);

        let token = issuer.issue_access(&alice()).unwrap();
        assert_eq!(token.ttl, ACCESS_TOKEN_TTL_SECS);

        let claims = issuer.verify_access(&token.token).unwrap();
        assert_eq!(claims.subject(), alice());
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn test_issue_and_verify_refresh() {
        let issuer = TokenIssuer::new(ACCESS_SECRET, REFRESH_SECRET);

        let token = issuer.issue_refresh(&alice()).unwrap();
        assert_eq!(token.ttl, REFRESH_TOKEN_TTL_SECS);

        let claims = issuer.verify_refresh(&token.token).unwrap();
        assert_eq!(claims.subject(), alice());
        assert!(!claims.payload.jti.is_empty());
        assert_eq!(claims.payload.generation, None);
        assert!(issuer.is_current(&claims));
    }

    #[test]
    fn test_tokens_not_interchangeable() {
        let issuer = TokenIssuer::new(ACCESS_SECRET, REFRESH_SECRET);

        let access = issuer.issue_access(&alice()).unwrap();
        let refresh = issuer.issue_refresh(&alice()).unwrap();

        assert!(issuer.verify_refresh(&access.token).is_err());
        assert!(issuer.verify_access(&refresh.token).is_err());
    }

    #[test]
    fn test_custom_ttls() {
        let issuer = TokenIssuer::new(ACCESS_SECRET, REFRESH_SECRET).with_ttls(30, 600);

        let access = issuer.issue_access(&alice()).unwrap();
        let refresh = issuer.issue_refresh(&alice()).unwrap();

        assert_eq!(access.expires_at - access.issued_at, 30);
        assert_eq!(refresh.expires_at - refresh.issued_at, 600);
    }

    #[test]
    fn test_unique_jti_per_refresh_token() {
        let issuer = TokenIssuer::new(ACCESS_SECRET, REFRESH_SECRET);

        let first = issuer.issue_refresh(&alice()).unwrap();
        let second = issuer.issue_refresh(&alice()).unwrap();

        let first = issuer.verify_refresh(&first.token).unwrap();
        let second = issuer.verify_refresh(&second.token).unwrap();
        assert_ne!(first.payload.jti, second.payload.jti);
    }

    #[test]
    fn test_rotate_without_rotation_is_noop() {
        let issuer = TokenIssuer::new(ACCESS_SECRET, REFRESH_SECRET);
        let token = issuer.issue_refresh(&alice()).unwrap();
        let claims = issuer.verify_refresh(&token.token).unwrap();

        assert!(issuer.rotate(&claims).unwrap().is_none());
        assert!(issuer.is_current(&claims));
    }

    #[test]
    fn test_rotation_invalidates_previous_token() {
        let issuer = TokenIssuer::new(ACCESS_SECRET, REFRESH_SECRET).with_rotation(true);

        let first = issuer.issue_refresh(&alice()).unwrap();
        let first = issuer.verify_refresh(&first.token).unwrap();
        assert_eq!(first.payload.generation, Some(0));

        let second = issuer.rotate(&first).unwrap().expect("rotation should succeed");
        let second = issuer.verify_refresh(&second.token).unwrap();
        assert_eq!(second.payload.generation, Some(1));

        assert!(!issuer.is_current(&first));
        assert!(issuer.is_current(&second));

        // The consumed token cannot be rotated again
        assert!(issuer.rotate(&first).unwrap().is_none());
    }
}
