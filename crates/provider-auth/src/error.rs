//! Error types for the provider auth protocol

use crate::transport::TransportError;

/// Errors from URL building, token decoding and the token endpoints.
///
/// A token minted for a different client is not an error: exchange reports
/// it as `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("callback URL has no authorization code")]
    MissingCode,

    #[error("malformed token: {0}")]
    MalformedToken(String),

    #[error("code exchange failed: {0}")]
    ExchangeFailed(#[source] TransportError),

    #[error("token refresh failed: {0}")]
    RefreshFailed(#[source] TransportError),

    #[error("API request failed: {0}")]
    Transport(#[from] TransportError),
}

impl Error {
    /// HTTP status of the failed provider call, if the provider answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::ExchangeFailed(e) | Error::RefreshFailed(e) | Error::Transport(e) => e.status(),
            _ => None,
        }
    }
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;
