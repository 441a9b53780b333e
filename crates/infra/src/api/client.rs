//! Authenticated API client
//!
//! Sends every operation with the current access token. A 401 hands control
//! to the [`RefreshCoordinator`]; the operation is then resent exactly once
//! with the renewed token.

use std::sync::Arc;

use assetdesk_domain::{ApiConfig, ClientConfig, ClientError};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{instrument, warn};
use uuid::Uuid;

use super::executor::RequestExecutor;
use super::listener::SessionListener;
use super::refresh::{HttpTokenRefresher, RefreshCoordinator, TokenRefresher};
use super::request::ApiRequest;
use crate::session::{open_secret_store, TokenStore};

/// Shared client for all operations of one session
pub struct ApiClient {
    executor: Arc<RequestExecutor>,
    store: Arc<TokenStore>,
    coordinator: Arc<RefreshCoordinator>,
}

impl ApiClient {
    /// Create a builder for fluent configuration
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Build a client (and its session storage) from full configuration.
    ///
    /// # Errors
    /// Returns `ClientError::Config` if the configuration is invalid or the
    /// storage backend cannot be opened.
    pub fn from_config(
        config: &ClientConfig,
        listener: Option<Arc<dyn SessionListener>>,
    ) -> Result<Self, ClientError> {
        config.validate()?;
        let store = Arc::new(TokenStore::open(open_secret_store(&config.storage)?));

        let mut builder = Self::builder().config(config.api.clone()).store(store);
        if let Some(listener) = listener {
            builder = builder.listener(listener);
        }
        builder.build()
    }

    pub fn store(&self) -> &Arc<TokenStore> {
        &self.store
    }

    pub fn executor(&self) -> &Arc<RequestExecutor> {
        &self.executor
    }

    pub fn coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.coordinator
    }

    /// Execute an operation and decode its body into `T`.
    ///
    /// # Errors
    /// See [`ApiClient::execute_value`]; additionally `ClientError::Parse`
    /// if the body does not match `T`.
    pub async fn execute<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T, ClientError> {
        let value = self.execute_value(request).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Execute an operation, refreshing the session at most once.
    ///
    /// # Errors
    /// - `ClientError::Network` / `Parse` / `Api` straight from the exchange
    /// - `ClientError::RefreshFailed` if the session could not be renewed
    /// - `ClientError::Unauthenticated` if there is nothing to refresh with,
    ///   or the resent operation is rejected again
    #[instrument(skip(self, request), fields(method = %request.method(), path = %request.path()))]
    pub async fn execute_value(&self, request: &ApiRequest) -> Result<Value, ClientError> {
        let request_id = Uuid::new_v4().to_string();
        let token = if request.attaches_token() { self.store.access_token() } else { None };

        match self.executor.send(request, token.as_deref(), &request_id).await {
            Err(err) if err.is_unauthorized() && request.allows_refresh() => {
                warn!(request_id = %request_id, "Access token rejected; refreshing session");
                self.resend_after_refresh(request, token.as_deref(), &request_id).await
            }
            other => other,
        }
    }

    async fn resend_after_refresh(
        &self,
        request: &ApiRequest,
        rejected: Option<&str>,
        request_id: &str,
    ) -> Result<Value, ClientError> {
        let token = self.coordinator.refreshed_token(rejected).await?;

        match self.executor.send(request, Some(&token), request_id).await {
            Err(err) if err.is_unauthorized() => {
                warn!(request_id = %request_id, "Request rejected again after token refresh");
                Err(ClientError::Unauthenticated(
                    "request rejected after token refresh".to_string(),
                ))
            }
            other => other,
        }
    }
}

/// Builder for [`ApiClient`]
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ApiConfig>,
    store: Option<Arc<TokenStore>>,
    listener: Option<Arc<dyn SessionListener>>,
    refresher: Option<Arc<dyn TokenRefresher>>,
}

impl ApiClientBuilder {
    /// Set the API configuration
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Share an existing token store (defaults to an in-memory store)
    pub fn store(mut self, store: Arc<TokenStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Observer notified when a refresh fails and the session is dropped
    pub fn listener(mut self, listener: Arc<dyn SessionListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Replace the HTTP refresh call
    pub fn refresher(mut self, refresher: Arc<dyn TokenRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    /// Build the API client
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` for an invalid base URL or zero refresh
    /// timeout.
    pub fn build(self) -> Result<ApiClient, ClientError> {
        let config = self.config.unwrap_or_default();
        if config.refresh_timeout().is_zero() {
            return Err(ClientError::Config("Refresh timeout must be greater than zero".into()));
        }

        let executor = Arc::new(RequestExecutor::from_config(&config)?);
        let store = self.store.unwrap_or_else(|| Arc::new(TokenStore::in_memory()));
        let refresher = self
            .refresher
            .unwrap_or_else(|| Arc::new(HttpTokenRefresher::new(&executor)));

        let coordinator = Arc::new(RefreshCoordinator::new(
            store.clone(),
            refresher,
            self.listener,
            config.refresh_timeout(),
        ));

        Ok(ApiClient { executor, store, coordinator })
    }
}
