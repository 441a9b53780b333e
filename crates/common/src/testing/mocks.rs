//! Mock implementations of storage backends
//!
//! Provides mock objects for testing purposes.

// Mutex poisoning is acceptable in test mocks - if a test panics, the entire
// test fails anyway
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[cfg(feature = "platform")]
use crate::security::KeychainError;
use crate::storage::{SecretStore, StorageError};

type StorageData = Arc<Mutex<HashMap<String, String>>>;

/// In-memory keychain replacement with the same API as `KeychainProvider`.
///
/// Clones share storage, which lets a test drop one `TokenStore` and build
/// another over the same data to simulate a process restart.
#[cfg(feature = "platform")]
#[derive(Debug, Clone)]
pub struct MockKeychainProvider {
    storage: StorageData,
    service_name: String,
}

#[cfg(feature = "platform")]
impl MockKeychainProvider {
    /// Create a new mock keychain provider with a service name for namespacing.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self { storage: Arc::new(Mutex::new(HashMap::new())), service_name: service_name.into() }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Store an arbitrary secret value in memory.
    pub fn set_secret(&self, key: &str, value: &str) -> Result<(), KeychainError> {
        self.storage.lock().unwrap().insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Retrieve a secret value or return `KeychainError::NotFound`.
    pub fn get_secret(&self, key: &str) -> Result<String, KeychainError> {
        self.storage.lock().unwrap().get(key).cloned().ok_or(KeychainError::NotFound)
    }

    /// Delete a secret value (idempotent).
    pub fn delete_secret(&self, key: &str) -> Result<(), KeychainError> {
        self.storage.lock().unwrap().remove(key);
        Ok(())
    }

    /// Determine whether a secret exists.
    #[must_use]
    pub fn secret_exists(&self, key: &str) -> bool {
        self.storage.lock().unwrap().contains_key(key)
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.storage.lock().unwrap().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(feature = "platform")]
impl Default for MockKeychainProvider {
    fn default() -> Self {
        Self::new("assetdesk-test")
    }
}

#[cfg(feature = "platform")]
impl SecretStore for MockKeychainProvider {
    fn backend(&self) -> &'static str {
        "mock-keychain"
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.storage.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.set_secret(key, value).map_err(Into::into)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.delete_secret(key).map_err(Into::into)
    }
}

/// Secret store whose writes can be switched to fail.
///
/// Reads always succeed against the in-memory data; `set`/`remove` fail with
/// `StorageError::Keychain` while failure mode is on. Counts every write
/// attempt so tests can assert how often the backend was touched.
#[derive(Debug, Clone, Default)]
pub struct FailingSecretStore {
    storage: StorageData,
    fail_writes: Arc<AtomicBool>,
    write_attempts: Arc<AtomicUsize>,
}

impl FailingSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle write failures.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Total `set` + `remove` calls observed.
    pub fn write_attempts(&self) -> usize {
        self.write_attempts.load(Ordering::SeqCst)
    }

    fn check_write(&self) -> Result<(), StorageError> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Keychain("simulated keychain failure".to_string()));
        }
        Ok(())
    }
}

impl SecretStore for FailingSecretStore {
    fn backend(&self) -> &'static str {
        "failing"
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.storage.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_write()?;
        self.storage.lock().unwrap().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check_write()?;
        self.storage.lock().unwrap().remove(key);
        Ok(())
    }
}
