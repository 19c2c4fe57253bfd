//! API transport seam
//!
//! The protocol never talks to reqwest directly. It builds an `ApiRequest`
//! (method, path relative to the API base URL, optional JSON body, headers)
//! and hands it to an `ApiTransport`. `HttpTransport` is the reqwest-backed
//! implementation; tests substitute a recording fake.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::debug;

/// Failure reported by a transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request failed: {0}")]
    Network(String),

    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("invalid request: {0}")]
    Request(String),
}

impl TransportError {
    /// HTTP status for provider rejections; `None` when no response arrived.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A single call against the provider API.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base URL, starting with `/`
    pub path: String,
    pub body: Option<Value>,
    pub headers: HeaderMap,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: None,
            headers: HeaderMap::new(),
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            body: Some(body),
            headers: HeaderMap::new(),
        }
    }

    /// Attach `Authorization: Bearer {token}`, marked sensitive so it is
    /// elided from reqwest's debug output.
    pub fn with_bearer(mut self, token: &str) -> Result<Self, TransportError> {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| TransportError::Request(format!("bearer token is not a valid header: {e}")))?;
        value.set_sensitive(true);
        self.headers.insert(AUTHORIZATION, value);
        Ok(self)
    }

    /// The bearer credential carried by this request, if any.
    pub fn bearer(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
    }
}

/// Performs provider API calls and returns the parsed JSON body.
///
/// Implementations must map any non-2xx response to `TransportError::Status`.
/// Uses `Pin<Box<dyn Future>>` so the trait stays dyn-compatible.
pub trait ApiTransport: Send + Sync {
    fn request<'a>(
        &'a self,
        request: ApiRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Value, TransportError>> + Send + 'a>>;
}

impl<T: ApiTransport + ?Sized> ApiTransport for Arc<T> {
    fn request<'a>(
        &'a self,
        request: ApiRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Value, TransportError>> + Send + 'a>> {
        (**self).request(request)
    }
}

/// reqwest-backed transport with a fixed base URL.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Reuse an existing client (connection pool, timeouts, proxies).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl ApiTransport for HttpTransport {
    fn request<'a>(
        &'a self,
        request: ApiRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Value, TransportError>> + Send + 'a>> {
        Box::pin(async move {
            let url = format!("{}{}", self.base_url, request.path);
            debug!(method = %request.method, path = %request.path, "sending provider request");

            let mut builder = self
                .client
                .request(request.method, &url)
                .headers(request.headers);
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }

            let response = builder
                .send()
                .await
                .map_err(|e| TransportError::Network(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| String::from("<no body>"));
                debug!(path = %request.path, status = status.as_u16(), "provider rejected request");
                return Err(TransportError::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| TransportError::Network(format!("reading response body: {e}")))?;
            if bytes.is_empty() {
                return Ok(Value::Null);
            }
            serde_json::from_slice(&bytes).map_err(|e| TransportError::Decode(e.to_string()))
        })
    }
}
