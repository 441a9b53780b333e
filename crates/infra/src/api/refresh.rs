//! Single-flight access token refresh
//!
//! When several operations see a 401 at the same time only the first one
//! starts a refresh; the rest queue behind it and receive the same outcome.
//!
//! # Concurrency
//!
//! The refresh state sits behind a `parking_lot::Mutex` that is only held
//! for the `Idle -> Refreshing` transition and for draining waiters, never
//! across an `.await`. The refresh call itself runs on a spawned task, so a
//! caller that gives up (drops its future) cannot cancel it for the others.

use std::sync::Arc;
use std::time::Duration;

use assetdesk_domain::constants::REFRESH_PATH;
use assetdesk_domain::types::{RefreshRequest, RefreshResponse};
use assetdesk_domain::{error_label, ClientError};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::executor::RequestExecutor;
use super::listener::SessionListener;
use super::request::ApiRequest;
use crate::session::TokenStore;

/// Exchanges a refresh token for a new access token
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, ClientError>;
}

/// `POST /auth/refresh` against the API
///
/// The refresh call is sent once per cycle regardless of the transport
/// retry setting; a failed refresh ends the session instead.
pub struct HttpTokenRefresher {
    executor: RequestExecutor,
}

impl HttpTokenRefresher {
    pub fn new(executor: &RequestExecutor) -> Self {
        Self { executor: executor.single_attempt() }
    }
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, ClientError> {
        let body = serde_json::to_value(RefreshRequest { refresh_token })?;
        let request = ApiRequest::post(REFRESH_PATH).json(body).public();
        let value = self.executor.send(&request, None, &Uuid::new_v4().to_string()).await?;
        Ok(serde_json::from_value(value)?)
    }
}

type Waiter = oneshot::Sender<Result<String, ClientError>>;

enum RefreshState {
    Idle,
    Refreshing { waiters: Vec<Waiter> },
}

/// Coordinates token refreshes for one client
pub struct RefreshCoordinator {
    store: Arc<TokenStore>,
    refresher: Arc<dyn TokenRefresher>,
    listener: Option<Arc<dyn SessionListener>>,
    refresh_timeout: Duration,
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    pub fn new(
        store: Arc<TokenStore>,
        refresher: Arc<dyn TokenRefresher>,
        listener: Option<Arc<dyn SessionListener>>,
        refresh_timeout: Duration,
    ) -> Self {
        Self { store, refresher, listener, refresh_timeout, state: Mutex::new(RefreshState::Idle) }
    }

    /// True while a refresh is outstanding.
    pub fn is_refreshing(&self) -> bool {
        matches!(*self.state.lock(), RefreshState::Refreshing { .. })
    }

    /// Obtain an access token to replace `rejected`.
    ///
    /// Joins the in-flight refresh if there is one. If the stored token has
    /// already moved on from `rejected` it is returned without refreshing.
    ///
    /// # Errors
    /// - `ClientError::Unauthenticated` if no refresh token is stored
    /// - `ClientError::RefreshFailed` if the refresh was rejected, failed or
    ///   timed out; every waiter of that cycle receives the same error
    pub async fn refreshed_token(
        self: &Arc<Self>,
        rejected: Option<&str>,
    ) -> Result<String, ClientError> {
        let receiver = {
            let mut state = self.state.lock();
            let (sender, receiver) = oneshot::channel();

            match &mut *state {
                RefreshState::Refreshing { waiters } => {
                    waiters.retain(|waiter| !waiter.is_closed());
                    waiters.push(sender);
                    debug!(waiters = waiters.len(), "Joined in-flight token refresh");
                }
                RefreshState::Idle => {
                    let session = self.store.get();
                    if let Some(current) = session.access_token {
                        if rejected != Some(current.as_str()) {
                            debug!("Access token already renewed; skipping refresh");
                            return Ok(current);
                        }
                    }

                    let refresh_token = session.refresh_token.ok_or_else(|| {
                        ClientError::Unauthenticated("No refresh token available".to_string())
                    })?;

                    *state = RefreshState::Refreshing { waiters: vec![sender] };
                    let coordinator = Arc::clone(self);
                    tokio::spawn(async move { coordinator.run(refresh_token).await });
                    debug!("Token refresh started");
                }
            }

            receiver
        };

        receiver.await.unwrap_or_else(|_| {
            Err(ClientError::RefreshFailed("refresh task ended without a result".to_string()))
        })
    }

    async fn run(self: Arc<Self>, refresh_token: String) {
        let outcome =
            match tokio::time::timeout(self.refresh_timeout, self.refresher.refresh(&refresh_token))
                .await
            {
                Ok(Ok(response)) => {
                    let access_token = response.access_token.clone();
                    self.persist(move |store| {
                        store.apply_refresh(response.access_token, response.refresh_token);
                    })
                    .await;
                    info!("Access token refreshed");
                    Ok(access_token)
                }
                Ok(Err(err)) => Err(ClientError::RefreshFailed(err.to_string())),
                Err(_) => Err(ClientError::RefreshFailed(format!(
                    "refresh timed out after {}s",
                    self.refresh_timeout.as_secs_f32()
                ))),
            };

        if let Err(err) = &outcome {
            warn!(
                error = %err,
                error_label = error_label(err),
                category = ?err.category(),
                "Token refresh failed; clearing session"
            );
            self.persist(TokenStore::clear).await;
        }

        let waiters = {
            let mut state = self.state.lock();
            match std::mem::replace(&mut *state, RefreshState::Idle) {
                RefreshState::Refreshing { waiters } => waiters,
                RefreshState::Idle => Vec::new(),
            }
        };

        if let (Err(err), Some(listener)) = (&outcome, &self.listener) {
            listener.session_expired(err);
        }

        debug!(waiters = waiters.len(), success = outcome.is_ok(), "Resolving refresh waiters");
        for waiter in waiters {
            // A closed receiver means the caller was cancelled.
            let _ = waiter.send(outcome.clone());
        }
    }

    /// Run a session write off the async workers; backends may block on disk
    /// or keychain I/O.
    async fn persist<F>(&self, update: F)
    where
        F: FnOnce(&TokenStore) + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        if let Err(err) = tokio::task::spawn_blocking(move || update(&store)).await {
            error!(error = %err, "Session persistence task failed");
        }
    }

    #[cfg(test)]
    fn pending_waiters(&self) -> usize {
        match &*self.state.lock() {
            RefreshState::Refreshing { waiters } => waiters.len(),
            RefreshState::Idle => 0,
        }
    }
}
