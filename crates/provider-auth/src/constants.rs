//! Provider endpoints and key naming
//!
//! The API host serves the token and user endpoints. The auth host receives
//! federated callbacks from third-party identity providers and finishes the
//! login on the provider's side before bouncing back to `{domain}`.

/// API base URL used when the client config does not override it
pub const DEFAULT_API_BASE_URL: &str = "https://api.example-provider.test";

/// Host that third-party providers redirect back to after federated login
pub const FEDERATED_AUTH_HOST: &str = "https://auth.example-provider.test";

/// Current user lookup, authenticated with the access token
pub const USER_ENDPOINT: &str = "/users/me";

/// Authorization code exchange (unauthenticated)
pub const CODE_EXCHANGE_ENDPOINT: &str = "/sessions/code/authenticate";

/// Token rotation, authenticated with the refresh token
pub const TOKEN_REFRESH_ENDPOINT: &str = "/sessions/token/refresh";

/// Claim carrying the client ID the access token was minted for
pub const PROVIDER_ID_CLAIM: &str = "pid";
