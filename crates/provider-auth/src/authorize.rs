//! Login redirect URLs
//!
//! Pure functions of the client configuration: the provider's hosted login
//! page, and third-party (federated) authorize endpoints whose callback lands
//! on the provider's auth host.

use std::fmt;
use std::str::FromStr;

use crate::config::ClientConfig;
use crate::constants::FEDERATED_AUTH_HOST;
use crate::error::{Error, Result};

/// Third-party identity providers the auth host accepts callbacks from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FederatedProvider {
    Kakao,
}

impl FederatedProvider {
    /// Path segment in the auth host's callback URL
    pub fn slug(self) -> &'static str {
        match self {
            FederatedProvider::Kakao => "kakao",
        }
    }

    pub fn authorize_endpoint(self) -> &'static str {
        match self {
            FederatedProvider::Kakao => "https://kauth.kakao.com/oauth/authorize",
        }
    }
}

impl fmt::Display for FederatedProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for FederatedProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "kakao" => Ok(FederatedProvider::Kakao),
            other => Err(Error::Configuration(format!(
                "unknown federated provider: {other}"
            ))),
        }
    }
}

/// `{domain}/login/{client_id}`, plus `?redirect_uri=` when one is configured.
pub fn build_authorize_url(config: &ClientConfig) -> String {
    let base = format!("{}/login/{}", config.domain, config.client_id);
    match config.redirect_uri() {
        Some(uri) => format!("{base}?redirect_uri={}", urlencoding::encode(uri)),
        None => base,
    }
}

/// Authorize URL at `provider`, calling back into the auth host for this client.
///
/// `provider_key` is the credential the third party issued to the host
/// application (for Kakao, the REST API key).
pub fn build_federated_login_url(
    config: &ClientConfig,
    provider: FederatedProvider,
    provider_key: &str,
) -> Result<String> {
    if provider_key.trim().is_empty() {
        return Err(Error::Configuration(format!(
            "{provider} API key is empty"
        )));
    }

    let callback = format!(
        "{FEDERATED_AUTH_HOST}/oauth/{}/{}",
        provider.slug(),
        config.client_id
    );
    Ok(format!(
        "{}?client_id={}&redirect_uri={}&response_type=code",
        provider.authorize_endpoint(),
        urlencoding::encode(provider_key),
        urlencoding::encode(&callback),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClientConfig {
        ClientConfig::new("https://x.test", "abc")
    }

    #[test]
    fn authorize_url_with_redirect() {
        let config = config().with_redirect_uri("https://app/cb");
        assert_eq!(
            build_authorize_url(&config),
            "https://x.test/login/abc?redirect_uri=https%3A%2F%2Fapp%2Fcb"
        );
    }

    #[test]
    fn authorize_url_without_redirect() {
        assert_eq!(build_authorize_url(&config()), "https://x.test/login/abc");
        let empty = config().with_redirect_uri("");
        assert_eq!(build_authorize_url(&empty), "https://x.test/login/abc");
    }

    #[test]
    fn redirect_uri_survives_url_decoding() {
        let uris = [
            "https://app/cb",
            "https://app.test/callback?next=/home&tab=1",
            "http://localhost:3000/auth/callback#done",
            "https://app.test/path with spaces/ü",
        ];
        for uri in uris {
            let url = build_authorize_url(&config().with_redirect_uri(uri));
            assert!(url.starts_with("https://x.test/login/abc"));
            let (_, encoded) = url.split_once("?redirect_uri=").unwrap();
            assert!(!encoded.contains('&'), "unescaped separator in {encoded}");
            assert_eq!(urlencoding::decode(encoded).unwrap(), uri);
        }
    }

    #[test]
    fn federated_url_points_back_to_auth_host() {
        let url = build_federated_login_url(&config(), FederatedProvider::Kakao, "rest-key").unwrap();
        assert_eq!(
            url,
            "https://kauth.kakao.com/oauth/authorize?client_id=rest-key\
             &redirect_uri=https%3A%2F%2Fauth.example-provider.test%2Foauth%2Fkakao%2Fabc\
             &response_type=code"
        );
    }

    #[test]
    fn federated_url_requires_key() {
        for key in ["", "   "] {
            let err = build_federated_login_url(&config(), FederatedProvider::Kakao, key).unwrap_err();
            assert!(matches!(err, Error::Configuration(_)), "got {err:?}");
        }
    }

    #[test]
    fn provider_parses_case_insensitively() {
        assert_eq!("Kakao".parse::<FederatedProvider>().unwrap(), FederatedProvider::Kakao);
        assert!("github".parse::<FederatedProvider>().is_err());
    }
}
