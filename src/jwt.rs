//! Signed, time-bounded token encoding and verification.
//!
//! A [`TokenCodec`] is bound to one secret and one [`TokenType`]. Access and
//! refresh tokens each get their own codec, so a token minted for one purpose
//! never verifies against the other.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::{SystemTime, UNIX_EPOCH};

/// Token type for distinguishing access vs refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Short-lived bearer token sent on every protected request
    Access,
    /// Long-lived token carried only in the refresh cookie
    Refresh,
}

/// Claims as they appear inside a signed token: the caller's payload plus
/// the timestamps and type stamped by the codec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims<P> {
    #[serde(flatten)]
    pub payload: P,
    /// Token type
    #[serde(rename = "typ")]
    pub token_type: TokenType,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Result of signing a payload.
#[derive(Debug, Clone)]
pub struct SignedToken {
    /// The compact JWT string
    pub token: String,
    /// Issued at timestamp (Unix seconds)
    pub issued_at: u64,
    /// Expiration timestamp (Unix seconds)
    pub expires_at: u64,
    /// Token lifetime in seconds
    pub ttl: u64,
}

/// Signs and verifies tokens of a single type with a single secret.
#[derive(Clone)]
pub struct TokenCodec {
    token_type: TokenType,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenCodec {
    /// Create a codec for the given token type and secret.
    pub fn new(token_type: TokenType, secret: &[u8]) -> Self {
        Self {
            token_type,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// Sign a payload. `iat` and `exp` are always computed here from `ttl`.
    pub fn sign<P: Serialize>(&self, payload: P, ttl: u64) -> Result<SignedToken, JwtError> {
        let now = now_secs()?;
        let exp = now.checked_add(ttl).ok_or(JwtError::InvalidTtl(ttl))?;

        let claims = Claims {
            payload,
            token_type: self.token_type,
            iat: now,
            exp,
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(JwtError::Encoding)?;

        Ok(SignedToken {
            token,
            issued_at: now,
            expires_at: exp,
            ttl,
        })
    }

    /// Verify signature, claim shape, type and expiry.
    ///
    /// Expiry uses zero leeway: a token is rejected once `now >= exp`.
    pub fn verify<P: DeserializeOwned>(&self, token: &str) -> Result<Claims<P>, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let token_data = jsonwebtoken::decode::<Claims<P>>(token, &self.decoding_key, &validation)
            .map_err(JwtError::Decoding)?;
        let claims = token_data.claims;

        if claims.token_type != self.token_type {
            return Err(JwtError::WrongTokenType);
        }

        if now_secs()? >= claims.exp {
            return Err(JwtError::Expired);
        }

        Ok(claims)
    }
}

/// Current Unix time in seconds.
pub fn now_secs() -> Result<u64, JwtError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| JwtError::TimeError)
}

/// Errors that can occur during JWT operations.
///
/// The variants are for logs only; every verification failure is reported to
/// network callers as the same `401 Unauthorized`.
#[derive(Debug)]
pub enum JwtError {
    /// Error encoding the token
    Encoding(jsonwebtoken::errors::Error),
    /// Bad signature, malformed token or unexpected claim shape
    Decoding(jsonwebtoken::errors::Error),
    /// Token is at or past its expiry
    Expired,
    /// System time error
    TimeError,
    /// Lifetime pushes the expiry past the representable range
    InvalidTtl(u64),
    /// Wrong token type (e.g., using refresh token as access token)
    WrongTokenType,
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::Encoding(e) => write!(f, "Failed to encode token: {}", e),
            JwtError::Decoding(e) => write!(f, "Failed to decode token: {}", e),
            JwtError::Expired => write!(f, "Token expired"),
            JwtError::TimeError => write!(f, "System time error"),
            JwtError::InvalidTtl(ttl) => write!(f, "Token lifetime out of range: {}s", ttl),
            JwtError::WrongTokenType => write!(f, "Wrong token type"),
        }
    }
}

impl std::error::Error for JwtError {}
