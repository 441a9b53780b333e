//! Client constants
//!
//! Centralized location for persisted entry names, endpoint paths and
//! configuration defaults.

// Persisted session entries
pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const IDENTITY_KEY: &str = "user";
pub const SESSION_KEYS: [&str; 3] = [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, IDENTITY_KEY];

// Session endpoints
pub const LOGIN_PATH: &str = "/auth/login";
pub const REFRESH_PATH: &str = "/auth/refresh";
pub const LOGOUT_PATH: &str = "/auth/logout";
pub const ME_PATH: &str = "/auth/me";

// Request metadata
pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const DEFAULT_USER_AGENT: &str = concat!("assetdesk-client/", env!("CARGO_PKG_VERSION"));

// Defaults
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_REFRESH_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_MAX_ATTEMPTS: usize = 1;
pub const DEFAULT_KEYCHAIN_SERVICE: &str = "AssetDesk.session";
pub const DEFAULT_LOG_FILTER: &str = "info";
