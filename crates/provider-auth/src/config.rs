//! Client configuration
//!
//! Set once when the client is constructed and never mutated. Hosts can
//! deserialize it straight out of their own config files.

use serde::Deserialize;

use crate::constants::DEFAULT_API_BASE_URL;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// Provider base path hosting the login page (e.g. `https://x.test`)
    pub domain: String,
    /// Opaque client identifier issued by the provider
    pub client_id: String,
    /// Where the provider sends the user after login
    #[serde(default)]
    pub redirect_uri: Option<String>,
    /// Provider API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

fn default_api_url() -> String {
    DEFAULT_API_BASE_URL.to_owned()
}

impl ClientConfig {
    pub fn new(domain: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            client_id: client_id.into(),
            redirect_uri: None,
            api_url: default_api_url(),
        }
    }

    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(redirect_uri.into());
        self
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Redirect URI, with an empty string treated as unset.
    pub fn redirect_uri(&self) -> Option<&str> {
        self.redirect_uri.as_deref().filter(|uri| !uri.is_empty())
    }

    /// Reject configs that cannot produce working URLs.
    pub fn validate(&self) -> Result<()> {
        if self.domain.trim().is_empty() {
            return Err(Error::Configuration("domain must not be empty".into()));
        }
        if self.client_id.trim().is_empty() {
            return Err(Error::Configuration("client_id must not be empty".into()));
        }
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err(Error::Configuration(format!(
                "api_url must start with http:// or https://, got: {}",
                self.api_url
            )));
        }
        Ok(())
    }
}
