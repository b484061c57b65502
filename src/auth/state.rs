//! Authentication state trait.

use super::issuer::TokenIssuer;

/// Trait for state types that can verify tokens.
pub trait HasAuthBackend {
    fn issuer(&self) -> &TokenIssuer;
}
