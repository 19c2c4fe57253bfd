//! Storage-free auth client
//!
//! `AuthClient` bundles the immutable `ClientConfig` with a transport and
//! exposes the URL builders and token endpoints as methods. It holds no
//! tokens; hosts layer persistence on top (see `provider-session`).

use serde_json::Value;

use crate::authorize::{FederatedProvider, build_authorize_url, build_federated_login_url};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::token::{self, TokenPair, extract_code};
use crate::transport::{ApiTransport, HttpTransport};

#[derive(Debug, Clone)]
pub struct AuthClient<T> {
    config: ClientConfig,
    transport: T,
}

impl AuthClient<HttpTransport> {
    /// Validate `config` and talk to its `api_url` over HTTP.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(config.api_url.clone());
        Ok(Self { config, transport })
    }
}

impl<T: ApiTransport> AuthClient<T> {
    pub fn new(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn client_id(&self) -> &str {
        &self.config.client_id
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn authorize_url(&self) -> String {
        build_authorize_url(&self.config)
    }

    pub fn federated_login_url(&self, provider: FederatedProvider, provider_key: &str) -> Result<String> {
        build_federated_login_url(&self.config, provider, provider_key)
    }

    /// Extract the code from `callback_url` and exchange it.
    ///
    /// Fails with `MissingCode` before any request when the callback has no code.
    pub async fn handle_callback(&self, callback_url: &str) -> Result<Option<TokenPair>> {
        let code = extract_code(callback_url)?;
        self.exchange_code(&code).await
    }

    pub async fn exchange_code(&self, code: &str) -> Result<Option<TokenPair>> {
        token::exchange_code(&self.transport, &self.config.client_id, code).await
    }

    pub async fn refresh(&self, access_token: &str, refresh_token: &str) -> Result<TokenPair> {
        token::refresh_token(&self.transport, access_token, refresh_token).await
    }

    pub async fn fetch_user(&self, access_token: &str) -> Result<Value> {
        token::fetch_user(&self.transport, access_token).await
    }
}
