//! Authenticated request layer for the AssetDesk API
//!
//! # Architecture
//!
//! - [`RequestExecutor`]: one HTTP exchange, no session state
//! - [`RefreshCoordinator`]: single-flight token refresh with waiter fan-out
//! - [`ApiClient`]: attaches the session token, resends once after a refresh
//! - [`SessionGateway`]: named session and domain operations

pub mod client;
pub mod executor;
pub mod gateway;
pub mod listener;
pub mod refresh;
pub mod request;

pub use client::{ApiClient, ApiClientBuilder};
pub use executor::RequestExecutor;
pub use gateway::{ReferenceList, SessionGateway};
pub use listener::SessionListener;
pub use refresh::{HttpTokenRefresher, RefreshCoordinator, TokenRefresher};
pub use request::{ApiRequest, MultipartPayload, RequestBody};
