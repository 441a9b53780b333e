//! # AssetDesk Infrastructure
//!
//! The authenticated request layer of the AssetDesk data-access client.
//!
//! This crate contains:
//! - HTTP transport and `reqwest` error mapping
//! - Session persistence (keychain, file, memory) behind [`TokenStore`]
//! - The request executor, single-flight refresh coordinator and
//!   [`SessionGateway`]
//! - Configuration loading and tracing setup
//!
//! ## Architecture
//! - Depends on `assetdesk-domain` for types and `assetdesk-common` for
//!   secret storage
//! - Contains all "impure" code (network, keychain, filesystem)

pub mod api;
pub mod config;
pub mod errors;
pub mod http;
pub mod observability;
pub mod session;

// Re-export commonly used items
pub use api::{
    ApiClient, ApiClientBuilder, ApiRequest, MultipartPayload, ReferenceList, RefreshCoordinator,
    RequestBody, RequestExecutor, SessionGateway, SessionListener, TokenRefresher,
};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use observability::init_tracing;
pub use session::{open_secret_store, FileSecretStore, TokenStore};
