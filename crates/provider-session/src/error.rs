//! Error types for session operations

/// Errors from session operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Auth(#[from] provider_auth::Error),

    #[error("session store error: {0}")]
    Store(String),
}

impl Error {
    /// HTTP status of the failed provider call, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Auth(e) => e.status(),
            Error::Store(_) => None,
        }
    }

    /// The provider refused the credential outright (401/403).
    pub fn is_rejected(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }
}

/// Result alias for session operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use provider_auth::TransportError;

    #[test]
    fn rejected_refresh_is_detected() {
        let err: Error = provider_auth::Error::RefreshFailed(TransportError::Status {
            status: 403,
            body: "revoked".into(),
        })
        .into();
        assert!(err.is_rejected());
    }

    #[test]
    fn transient_failures_are_not_rejections() {
        let server: Error = provider_auth::Error::RefreshFailed(TransportError::Status {
            status: 502,
            body: "bad gateway".into(),
        })
        .into();
        assert!(!server.is_rejected());

        let store = Error::Store("disk full".into());
        assert!(!store.is_rejected());
        assert_eq!(store.status(), None);
    }

    #[test]
    fn auth_errors_display_unchanged() {
        let err: Error = provider_auth::Error::MissingCode.into();
        assert_eq!(err.to_string(), "callback URL has no authorization code");
    }
}
