//! Provider OAuth client protocol
//!
//! Builds login URLs, exchanges authorization codes, rotates tokens and looks
//! up the current user against the provider API. Everything here is
//! storage-free: tokens go in, tokens come out. `provider-session` binds it
//! to a key-value store.
//!
//! Login flow:
//! 1. Host sends the user to `authorize::build_authorize_url()` (or a
//!    federated provider via `authorize::build_federated_login_url()`)
//! 2. Provider redirects back with `?code=...`
//! 3. `token::extract_code()` + `token::exchange_code()` produce a `TokenPair`,
//!    checked against the client via `claims::matches_client()`
//! 4. `token::refresh_token()` rotates the pair when the access token expires

pub mod authorize;
pub mod claims;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;
pub mod token;
pub mod transport;

pub use authorize::{FederatedProvider, build_authorize_url, build_federated_login_url};
pub use claims::{Claims, decode_claims, matches_client};
pub use client::AuthClient;
pub use config::ClientConfig;
pub use constants::*;
pub use error::{Error, Result};
pub use token::{TokenPair, exchange_code, extract_code, fetch_user, refresh_token};
pub use transport::{ApiRequest, ApiTransport, HttpTransport, TransportError};
