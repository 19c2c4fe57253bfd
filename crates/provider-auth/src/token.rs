//! Token exchange and refresh
//!
//! Handles the two token endpoint interactions:
//! 1. Authorization code exchange (`POST /sessions/code/authenticate`)
//! 2. Token rotation (`POST /sessions/token/refresh`, refresh token as bearer)
//!
//! Both take tokens in and hand tokens back. Nothing here touches storage;
//! persisting the pair is the session layer's job. Neither call retries.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::claims::{decode_claims, matches_client};
use crate::constants::{CODE_EXCHANGE_ENDPOINT, TOKEN_REFRESH_ENDPOINT, USER_ENDPOINT};
use crate::error::{Error, Result};
use crate::transport::{ApiRequest, ApiTransport, TransportError};

/// Access and refresh token, always issued and replaced together.
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

/// Pull the `code` query parameter out of a callback.
///
/// Accepts a full URL (`https://app/cb?code=XYZ#state`), a bare query
/// (`?code=XYZ`) or the query without its `?`. An empty code is missing.
pub fn extract_code(callback_url: &str) -> Result<String> {
    let query = callback_url
        .split_once('?')
        .map_or(callback_url, |(_, query)| query);
    let query = query.split_once('#').map_or(query, |(query, _)| query);

    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "code")
        .map(|(_, value)| value.into_owned())
        .filter(|code| !code.is_empty())
        .ok_or(Error::MissingCode)
}

/// Exchange an authorization code for a token pair.
///
/// Returns `Ok(None)` when the access token's `pid` claim does not name
/// `client_id`: the code was minted for another client and the tokens must
/// be discarded.
pub async fn exchange_code<T: ApiTransport + ?Sized>(
    transport: &T,
    client_id: &str,
    code: &str,
) -> Result<Option<TokenPair>> {
    let body = transport
        .request(ApiRequest::post(CODE_EXCHANGE_ENDPOINT, json!({ "code": code })))
        .await
        .map_err(Error::ExchangeFailed)?;

    let pair: TokenPair = serde_json::from_value(body).map_err(|e| {
        Error::ExchangeFailed(TransportError::Decode(format!("invalid token response: {e}")))
    })?;

    let claims = decode_claims(&pair.access_token)?;
    if !matches_client(&claims, client_id) {
        warn!(client_id, pid = ?claims.pid(), "access token minted for a different client, discarding");
        return Ok(None);
    }

    debug!(client_id, "authorization code exchanged");
    Ok(Some(pair))
}

/// Rotate a token pair.
///
/// The refresh token authenticates the call and the current (possibly
/// expired) access token goes in the body. The returned pair is taken as-is.
pub async fn refresh_token<T: ApiTransport + ?Sized>(
    transport: &T,
    access_token: &str,
    refresh_token: &str,
) -> Result<TokenPair> {
    let request = ApiRequest::post(TOKEN_REFRESH_ENDPOINT, json!({ "accessToken": access_token }))
        .with_bearer(refresh_token)
        .map_err(Error::RefreshFailed)?;

    let body = transport
        .request(request)
        .await
        .map_err(Error::RefreshFailed)?;

    serde_json::from_value(body).map_err(|e| {
        Error::RefreshFailed(TransportError::Decode(format!("invalid refresh response: {e}")))
    })
}

/// Look up the user the access token belongs to.
pub async fn fetch_user<T: ApiTransport + ?Sized>(transport: &T, access_token: &str) -> Result<Value> {
    let request = ApiRequest::get(USER_ENDPOINT).with_bearer(access_token)?;
    Ok(transport.request(request).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedTransport, unsigned_token};
    use reqwest::Method;

    fn token_response(pid: &str) -> Value {
        json!({
            "access_token": unsigned_token(&json!({ "pid": pid })),
            "refresh_token": "r1",
        })
    }

    #[test]
    fn extract_code_from_bare_query() {
        assert_eq!(extract_code("?code=XYZ").unwrap(), "XYZ");
        assert_eq!(extract_code("code=XYZ&state=s").unwrap(), "XYZ");
    }

    #[test]
    fn extract_code_from_full_url() {
        let url = "https://app.test/cb?state=s&code=a%2Bb#fragment";
        assert_eq!(extract_code(url).unwrap(), "a+b");
    }

    #[test]
    fn extract_code_missing() {
        for url in ["", "?", "?state=s", "https://app.test/cb", "?code=", "#code=XYZ"] {
            assert!(matches!(extract_code(url), Err(Error::MissingCode)), "{url:?}");
        }
    }

    #[test]
    fn token_pair_debug_is_redacted() {
        let pair = TokenPair::new("at_secret", "rt_secret");
        let debug = format!("{pair:?}");
        assert!(!debug.contains("at_secret"));
        assert!(!debug.contains("rt_secret"));
    }

    #[tokio::test]
    async fn exchange_posts_code_and_returns_pair() {
        let transport = ScriptedTransport::new();
        transport.respond(Ok(token_response("abc")));

        let pair = exchange_code(&transport, "abc", "XYZ").await.unwrap().unwrap();
        assert_eq!(pair.refresh_token, "r1");

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::POST);
        assert_eq!(requests[0].path, "/sessions/code/authenticate");
        assert_eq!(requests[0].body, Some(json!({ "code": "XYZ" })));
        assert_eq!(requests[0].bearer(), None);
    }

    #[tokio::test]
    async fn exchange_discards_token_for_other_client() {
        let transport = ScriptedTransport::new();
        transport.respond(Ok(token_response("other")));

        let result = exchange_code(&transport, "abc", "XYZ").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn exchange_rejects_undecodable_access_token() {
        let transport = ScriptedTransport::new();
        transport.respond(Ok(json!({ "access_token": "opaque", "refresh_token": "r1" })));

        let err = exchange_code(&transport, "abc", "XYZ").await.unwrap_err();
        assert!(matches!(err, Error::MalformedToken(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn exchange_transport_failure_is_exchange_failed() {
        let transport = ScriptedTransport::new();
        transport.respond(Err(TransportError::Status {
            status: 400,
            body: "invalid code".into(),
        }));

        let err = exchange_code(&transport, "abc", "XYZ").await.unwrap_err();
        assert!(matches!(err, Error::ExchangeFailed(_)), "got {err:?}");
        assert_eq!(err.status(), Some(400));
        assert_eq!(transport.request_count(), 1, "must not retry");
    }

    #[tokio::test]
    async fn exchange_response_without_refresh_token_fails() {
        let transport = ScriptedTransport::new();
        transport.respond(Ok(json!({ "access_token": unsigned_token(&json!({"pid": "abc"})) })));

        let err = exchange_code(&transport, "abc", "XYZ").await.unwrap_err();
        assert!(matches!(err, Error::ExchangeFailed(TransportError::Decode(_))), "got {err:?}");
    }

    #[tokio::test]
    async fn refresh_sends_refresh_token_as_bearer() {
        let transport = ScriptedTransport::new();
        transport.respond(Ok(json!({ "access_token": "at_2", "refresh_token": "rt_2" })));

        let pair = refresh_token(&transport, "at_1", "rt_1").await.unwrap();
        assert_eq!(pair, TokenPair::new("at_2", "rt_2"));

        let requests = transport.requests();
        assert_eq!(requests[0].path, "/sessions/token/refresh");
        assert_eq!(requests[0].body, Some(json!({ "accessToken": "at_1" })));
        assert_eq!(requests[0].bearer(), Some("rt_1"));
    }

    #[tokio::test]
    async fn refresh_transport_failure_is_refresh_failed() {
        let transport = ScriptedTransport::new();
        transport.respond(Err(TransportError::Network("connection reset".into())));

        let err = refresh_token(&transport, "at_1", "rt_1").await.unwrap_err();
        assert!(matches!(err, Error::RefreshFailed(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn fetch_user_uses_access_token() {
        let transport = ScriptedTransport::new();
        transport.respond(Ok(json!({ "id": "u1", "email": "u1@example.test" })));

        let user = fetch_user(&transport, "at_1").await.unwrap();
        assert_eq!(user["id"], "u1");

        let requests = transport.requests();
        assert_eq!(requests[0].method, Method::GET);
        assert_eq!(requests[0].path, "/users/me");
        assert_eq!(requests[0].bearer(), Some("at_1"));
    }

    #[tokio::test]
    async fn fetch_user_propagates_rejection() {
        let transport = ScriptedTransport::new();
        transport.respond(Err(TransportError::Status {
            status: 401,
            body: "expired".into(),
        }));

        let err = fetch_user(&transport, "at_1").await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)), "got {err:?}");
        assert_eq!(err.status(), Some(401));
    }
}
