//! Client error types.

use reqwest::StatusCode;

/// Failure to move a request over the wire.
#[derive(Debug, Clone)]
pub struct TransportError(pub String);

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Transport error: {}", self.0)
    }
}

impl std::error::Error for TransportError {}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        Self(e.to_string())
    }
}

/// Why a refresh attempt did not produce a new access token.
///
/// Every variant leads to the same outcome: the session is cleared.
#[derive(Debug, Clone)]
pub enum RefreshFailed {
    /// Server answered with a non-success status
    Rejected(StatusCode),
    /// Network failure, treated the same as a rejection
    Transport(TransportError),
    /// Success status but unreadable body
    Decode(String),
}

impl std::fmt::Display for RefreshFailed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshFailed::Rejected(status) => write!(f, "Refresh rejected with {}", status),
            RefreshFailed::Transport(e) => write!(f, "Refresh failed: {}", e),
            RefreshFailed::Decode(e) => write!(f, "Invalid refresh response: {}", e),
        }
    }
}

impl std::error::Error for RefreshFailed {}

/// Errors surfaced to code using the session controller.
#[derive(Debug)]
pub enum ClientError {
    Transport(TransportError),
    /// Server answered with a non-success status
    Status(StatusCode),
    /// Response body did not have the expected shape
    Decode(String),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Transport(e) => write!(f, "{}", e),
            ClientError::Status(status) => write!(f, "Request failed with {}", status),
            ClientError::Decode(e) => write!(f, "Failed to decode response: {}", e),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<TransportError> for ClientError {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}
