//! Persistent sessions for the provider OAuth client
//!
//! Wraps `provider_auth::AuthClient` with a key-value store so a host can
//! complete a login, remember the token pair, rotate it and sign out. The
//! store, the short-lived hint store and navigation are injected, so the
//! same manager runs in a CLI, a server or a test with in-memory fakes.
//!
//! Session lifecycle:
//! 1. `SessionManager::login_with_redirect()` sends the user to the provider
//! 2. `SessionManager::complete_login()` exchanges the callback code and
//!    stores the pair under `session:{client_id}:access|refresh`
//! 3. `SessionManager::current_user()` looks up the user with the access token
//! 4. `SessionManager::refresh_silently()` rotates and overwrites the pair
//! 5. `SessionManager::logout()` removes both keys

pub mod error;
pub mod manager;
pub mod metrics;
pub mod navigator;
pub mod store;

pub use error::{Error, Result};
pub use manager::{SessionKeys, SessionManager};
pub use navigator::Navigator;
pub use store::{FileStore, KeyValueStore, MemoryStore};
