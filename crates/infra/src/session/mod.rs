//! Session persistence
//!
//! [`TokenStore`] is the single owner of the session. The backend it
//! mirrors to is chosen from [`StorageConfig`].

pub mod file_store;
pub mod store;

use std::sync::Arc;

use assetdesk_common::{KeychainProvider, MemorySecretStore, SecretStore};
use assetdesk_domain::{ClientError, StorageBackend, StorageConfig};
use tracing::info;

pub use file_store::FileSecretStore;
pub use store::TokenStore;

/// Build the secret store described by `config`.
///
/// # Errors
/// Returns `ClientError::Config` when the file backend has no path or its
/// existing document cannot be read.
pub fn open_secret_store(config: &StorageConfig) -> Result<Arc<dyn SecretStore>, ClientError> {
    let store: Arc<dyn SecretStore> = match config.backend {
        StorageBackend::Keychain => Arc::new(KeychainProvider::new(config.service_name.clone())),
        StorageBackend::File => {
            let path = config.path.as_ref().ok_or_else(|| {
                ClientError::Config("File storage requires a path".to_string())
            })?;
            let store = FileSecretStore::open(path)
                .map_err(|e| ClientError::Config(format!("Cannot open session file: {e}")))?;
            Arc::new(store)
        }
        StorageBackend::Memory => Arc::new(MemorySecretStore::new()),
    };

    info!(backend = store.backend(), "Session storage selected");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_backend_by_config() {
        let config = StorageConfig { backend: StorageBackend::Memory, ..Default::default() };
        assert_eq!(open_secret_store(&config).unwrap().backend(), "memory");
    }

    #[test]
    fn file_backend_requires_path() {
        let config = StorageConfig { backend: StorageBackend::File, ..Default::default() };
        assert!(matches!(open_secret_store(&config), Err(ClientError::Config(_))));

        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            backend: StorageBackend::File,
            path: Some(dir.path().join("session.json")),
            ..Default::default()
        };
        assert_eq!(open_secret_store(&config).unwrap().backend(), "file");
    }
}
