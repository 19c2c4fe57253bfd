//! Session manager
//!
//! Binds the storage-free `AuthClient` to a key-value store. The token pair
//! lives under two keys namespaced by client ID:
//!
//! - `session:{client_id}:access`
//! - `session:{client_id}:refresh`
//!
//! A third key, `session:{client_id}:active`, lives in a separate
//! shorter-lived hint store and only answers "was a session started here".
//!
//! The two token writes are sequential with no atomicity: a crash between
//! them leaves one key behind. Readers treat any partial state as "no
//! session". Concurrent refreshes are not serialized; both may read the same
//! refresh token, and the later write wins.

use provider_auth::{
    ApiTransport, AuthClient, Error as AuthError, FederatedProvider, TokenPair, extract_code,
};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::metrics::{record_login, record_logout, record_refresh};
use crate::navigator::Navigator;
use crate::store::KeyValueStore;

/// Store keys for one client's session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionKeys {
    pub access: String,
    pub refresh: String,
    pub active: String,
}

impl SessionKeys {
    pub fn for_client(client_id: &str) -> Self {
        Self {
            access: format!("session:{client_id}:access"),
            refresh: format!("session:{client_id}:refresh"),
            active: format!("session:{client_id}:active"),
        }
    }
}

pub struct SessionManager<T, S, N> {
    client: AuthClient<T>,
    store: S,
    hints: S,
    navigator: N,
    keys: SessionKeys,
}

impl<T, S, N> SessionManager<T, S, N>
where
    T: ApiTransport,
    S: KeyValueStore,
    N: Navigator,
{
    /// `store` holds the token pair; `hints` holds the session indicator and
    /// is expected to be cleared sooner (per browser tab, per boot, ...).
    pub fn new(client: AuthClient<T>, store: S, hints: S, navigator: N) -> Self {
        let keys = SessionKeys::for_client(client.client_id());
        Self {
            client,
            store,
            hints,
            navigator,
            keys,
        }
    }

    pub fn client(&self) -> &AuthClient<T> {
        &self.client
    }

    fn client_id(&self) -> &str {
        self.client.client_id()
    }

    /// Send the user to the provider's login page. Returns the URL.
    pub fn login_with_redirect(&self) -> Result<String> {
        let url = self.client.authorize_url();
        self.navigator.navigate(&url)?;
        debug!(client_id = self.client_id(), "navigated to login page");
        Ok(url)
    }

    /// Send the user to a third-party provider's authorize page.
    pub fn login_with_federated(&self, provider: FederatedProvider, provider_key: &str) -> Result<String> {
        let url = self.client.federated_login_url(provider, provider_key)?;
        self.navigator.navigate(&url)?;
        debug!(client_id = self.client_id(), %provider, "navigated to federated login");
        Ok(url)
    }

    /// Finish a login from the provider's callback URL and persist the pair.
    ///
    /// Returns `Ok(None)`, with nothing written, when the token belongs to
    /// another client or its payload cannot be decoded. A callback without
    /// a code fails with `MissingCode` before any request is made.
    pub async fn complete_login(&self, callback_url: &str) -> Result<Option<TokenPair>> {
        let exchanged = match extract_code(callback_url) {
            Ok(code) => self.client.exchange_code(&code).await,
            Err(e) => Err(e),
        };

        let pair = match exchanged {
            Ok(Some(pair)) => pair,
            Ok(None) => {
                record_login("mismatch");
                return Ok(None);
            }
            Err(AuthError::MalformedToken(reason)) => {
                warn!(client_id = self.client_id(), %reason, "exchanged token is malformed, discarding");
                record_login("malformed");
                return Ok(None);
            }
            Err(e) => {
                record_login("error");
                return Err(e.into());
            }
        };

        self.persist(&pair).await?;
        record_login("success");
        info!(client_id = self.client_id(), "login completed");
        Ok(Some(pair))
    }

    /// The persisted pair, or `None` when either key is missing.
    pub async fn stored_tokens(&self) -> Result<Option<TokenPair>> {
        let access = self.store.get(&self.keys.access).await?;
        let refresh = self.store.get(&self.keys.refresh).await?;
        match (access, refresh) {
            (Some(access), Some(refresh)) => Ok(Some(TokenPair::new(access, refresh))),
            (None, None) => Ok(None),
            (access, _) => {
                warn!(
                    client_id = self.client_id(),
                    has_access = access.is_some(),
                    "partial session in store, treating as signed out"
                );
                Ok(None)
            }
        }
    }

    /// Fetch the signed-in user.
    ///
    /// `Ok(None)` without a network call when there is no session. Provider
    /// errors (such as an expired access token) are returned as-is; this
    /// does not refresh on its own.
    pub async fn current_user(&self) -> Result<Option<Value>> {
        let Some(tokens) = self.stored_tokens().await? else {
            debug!(client_id = self.client_id(), "no session, skipping user lookup");
            return Ok(None);
        };
        let user = self.client.fetch_user(&tokens.access_token).await?;
        Ok(Some(user))
    }

    /// Rotate the stored pair and overwrite both keys with the new one.
    ///
    /// `Ok(None)` without a network call when there is nothing to refresh.
    /// On failure the stored pair is left untouched; whether to log the user
    /// out is the caller's decision.
    pub async fn refresh_silently(&self) -> Result<Option<TokenPair>> {
        let Some(current) = self.stored_tokens().await? else {
            record_refresh("skipped");
            return Ok(None);
        };

        let pair = match self
            .client
            .refresh(&current.access_token, &current.refresh_token)
            .await
        {
            Ok(pair) => pair,
            Err(e) => {
                warn!(client_id = self.client_id(), error = %e, "token refresh failed");
                record_refresh("error");
                return Err(e.into());
            }
        };

        self.persist(&pair).await?;
        record_refresh("success");
        info!(client_id = self.client_id(), "tokens refreshed");
        Ok(Some(pair))
    }

    /// Cheap hint that a session was started and not logged out. It does
    /// not mean the access token is still accepted.
    pub async fn check_session(&self) -> Result<bool> {
        Ok(self.hints.get(&self.keys.active).await?.is_some())
    }

    /// Remove the stored session. Succeeds when there is none.
    pub async fn logout(&self) -> Result<()> {
        self.store.remove(&self.keys.access).await?;
        self.store.remove(&self.keys.refresh).await?;
        self.hints.remove(&self.keys.active).await?;
        record_logout();
        info!(client_id = self.client_id(), "logged out");
        Ok(())
    }

    async fn persist(&self, pair: &TokenPair) -> Result<()> {
        self.store.set(&self.keys.access, &pair.access_token).await?;
        self.store.set(&self.keys.refresh, &pair.refresh_token).await?;
        // Hint is advisory; the stored pair is authoritative.
        if let Err(e) = self.hints.set(&self.keys.active, "1").await {
            warn!(client_id = self.client_id(), error = %e, "failed to record session hint");
        }
        Ok(())
    }
}
