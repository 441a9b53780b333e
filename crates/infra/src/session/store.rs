//! Durable session holder
//!
//! `TokenStore` keeps the authoritative copy of the session in memory and
//! mirrors every change to a [`SecretStore`] backend so the session
//! survives restarts. All mutations (including [`TokenStore::clear`]) run
//! under a single write lock, so readers observe either the state before a
//! change or the state after it, never a mix.

use std::sync::Arc;

use assetdesk_common::{MemorySecretStore, SecretStore};
use assetdesk_domain::constants::{
    ACCESS_TOKEN_KEY, IDENTITY_KEY, REFRESH_TOKEN_KEY, SESSION_KEYS,
};
use assetdesk_domain::{Session, User};
use parking_lot::RwLock;
use tracing::{debug, error, warn};

/// Session store shared by the request layer
pub struct TokenStore {
    backend: Arc<dyn SecretStore>,
    session: RwLock<Session>,
}

impl TokenStore {
    /// Open the store, loading any session persisted by a previous run.
    ///
    /// Unreadable entries are logged and treated as absent.
    pub fn open(backend: Arc<dyn SecretStore>) -> Self {
        let session = Session {
            access_token: read_entry(backend.as_ref(), ACCESS_TOKEN_KEY),
            refresh_token: read_entry(backend.as_ref(), REFRESH_TOKEN_KEY),
            identity: read_entry(backend.as_ref(), IDENTITY_KEY).and_then(|raw| {
                serde_json::from_str::<User>(&raw)
                    .map_err(|err| {
                        warn!(backend = backend.backend(), error = %err, "Discarding unreadable cached identity");
                    })
                    .ok()
            }),
        };

        debug!(
            backend = backend.backend(),
            has_access = session.access_token.is_some(),
            has_refresh = session.refresh_token.is_some(),
            "Token store opened"
        );

        Self { backend, session: RwLock::new(session) }
    }

    /// Process-local store; nothing survives a restart.
    pub fn in_memory() -> Self {
        Self::open(Arc::new(MemorySecretStore::new()))
    }

    /// Name of the persistence backend.
    pub fn backend(&self) -> &'static str {
        self.backend.backend()
    }

    /// Snapshot of the current session.
    pub fn get(&self) -> Session {
        self.session.read().clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.session.read().access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.session.read().refresh_token.clone()
    }

    pub fn identity(&self) -> Option<User> {
        self.session.read().identity.clone()
    }

    pub fn set_access(&self, token: impl Into<String>) {
        let token = token.into();
        let mut session = self.session.write();
        self.persist(ACCESS_TOKEN_KEY, &token);
        session.access_token = Some(token);
    }

    pub fn set_refresh(&self, token: impl Into<String>) {
        let token = token.into();
        let mut session = self.session.write();
        self.persist(REFRESH_TOKEN_KEY, &token);
        session.refresh_token = Some(token);
    }

    /// Replace both tokens at once (login).
    ///
    /// A missing refresh token removes any previously stored one so a new
    /// login never inherits the refresh token of an earlier session.
    pub fn set_tokens(&self, access: impl Into<String>, refresh: Option<String>) {
        let access = access.into();
        let mut session = self.session.write();
        self.persist(ACCESS_TOKEN_KEY, &access);
        match &refresh {
            Some(token) => self.persist(REFRESH_TOKEN_KEY, token),
            None => self.forget(REFRESH_TOKEN_KEY),
        }
        session.access_token = Some(access);
        session.refresh_token = refresh;
    }

    /// Record the outcome of a successful refresh.
    ///
    /// The refresh token is only replaced when the server rotated it.
    pub fn apply_refresh(&self, access: impl Into<String>, rotated_refresh: Option<String>) {
        let access = access.into();
        let mut session = self.session.write();
        self.persist(ACCESS_TOKEN_KEY, &access);
        session.access_token = Some(access);
        if let Some(token) = rotated_refresh {
            self.persist(REFRESH_TOKEN_KEY, &token);
            session.refresh_token = Some(token);
        }
    }

    pub fn set_identity(&self, user: &User) {
        let mut session = self.session.write();
        match serde_json::to_string(user) {
            Ok(raw) => self.persist(IDENTITY_KEY, &raw),
            Err(err) => error!(error = %err, "Failed to encode identity for storage"),
        }
        session.identity = Some(user.clone());
    }

    /// Remove access token, refresh token and identity together.
    pub fn clear(&self) {
        let mut session = self.session.write();
        if let Err(err) = self.backend.remove_all(&SESSION_KEYS) {
            error!(backend = self.backend.backend(), error = %err, "Failed to clear persisted session");
        }
        *session = Session::default();
        debug!(backend = self.backend.backend(), "Session cleared");
    }

    fn persist(&self, key: &str, value: &str) {
        if let Err(err) = self.backend.set(key, value) {
            error!(backend = self.backend.backend(), key, error = %err, "Failed to persist session entry");
        }
    }

    fn forget(&self, key: &str) {
        if let Err(err) = self.backend.remove(key) {
            error!(backend = self.backend.backend(), key, error = %err, "Failed to remove session entry");
        }
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("backend", &self.backend.backend())
            .field("session", &*self.session.read())
            .finish()
    }
}

fn read_entry(backend: &dyn SecretStore, key: &str) -> Option<String> {
    match backend.get(key) {
        Ok(value) => value,
        Err(err) => {
            error!(backend = backend.backend(), key, error = %err, "Failed to read session entry");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use assetdesk_common::testing::{FailingSecretStore, MockKeychainProvider};

    use super::*;

    fn admin() -> User {
        serde_json::from_value(serde_json::json!({"id": 1, "username": "admin"})).unwrap()
    }

    #[test]
    fn empty_backend_yields_empty_session() {
        let store = TokenStore::in_memory();
        assert!(store.get().is_empty());
        assert_eq!(store.backend(), "memory");
    }

    #[test]
    fn session_survives_restart() {
        let keychain = MockKeychainProvider::new("AssetDesk.test");

        let store = TokenStore::open(Arc::new(keychain.clone()));
        store.set_tokens("A1", Some("R1".to_string()));
        store.set_identity(&admin());
        drop(store);

        let restored = TokenStore::open(Arc::new(keychain));
        let session = restored.get();
        assert_eq!(session.access_token.as_deref(), Some("A1"));
        assert_eq!(session.refresh_token.as_deref(), Some("R1"));
        assert_eq!(session.identity.map(|u| u.username), Some("admin".to_string()));
    }

    #[test]
    fn clear_removes_every_entry() {
        let keychain = MockKeychainProvider::new("AssetDesk.test");
        let store = TokenStore::open(Arc::new(keychain.clone()));
        store.set_tokens("A1", Some("R1".to_string()));
        store.set_identity(&admin());

        store.clear();

        assert!(store.get().is_empty());
        assert!(keychain.is_empty());
        assert!(TokenStore::open(Arc::new(keychain)).get().is_empty());
    }

    #[test]
    fn login_without_refresh_token_drops_stale_one() {
        let store = TokenStore::in_memory();
        store.set_tokens("A1", Some("R1".to_string()));

        store.set_tokens("A2", None);

        assert_eq!(store.access_token().as_deref(), Some("A2"));
        assert_eq!(store.refresh_token(), None);
    }

    #[test]
    fn refresh_keeps_refresh_token_unless_rotated() {
        let store = TokenStore::in_memory();
        store.set_tokens("A1", Some("R1".to_string()));

        store.apply_refresh("A2", None);
        assert_eq!(store.access_token().as_deref(), Some("A2"));
        assert_eq!(store.refresh_token().as_deref(), Some("R1"));

        store.apply_refresh("A3", Some("R2".to_string()));
        assert_eq!(store.refresh_token().as_deref(), Some("R2"));
    }

    #[test]
    fn backend_failures_leave_memory_authoritative() {
        let backend = FailingSecretStore::default();
        backend.set_fail_writes(true);
        let store = TokenStore::open(Arc::new(backend.clone()));

        store.set_access("A1");
        store.set_refresh("R1");

        assert_eq!(store.access_token().as_deref(), Some("A1"));
        assert_eq!(store.refresh_token().as_deref(), Some("R1"));
        assert_eq!(backend.write_attempts(), 2);

        store.clear();
        assert!(store.get().is_empty());
    }

    #[test]
    fn debug_output_never_contains_tokens() {
        let store = TokenStore::in_memory();
        store.set_tokens("secret-access", Some("secret-refresh".to_string()));
        assert!(!format!("{store:?}").contains("secret"));
    }
}
