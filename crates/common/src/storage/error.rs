//! Storage error types
//!
//! Errors raised by [`SecretStore`](super::SecretStore) backends.

use thiserror::Error;

/// Storage error type
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Keychain error: {0}")]
    Keychain(String),

    #[error("Session file error: {0}")]
    File(String),

    #[error("Corrupt session document: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(feature = "platform")]
impl From<crate::security::KeychainError> for StorageError {
    fn from(err: crate::security::KeychainError) -> Self {
        Self::Keychain(err.to_string())
    }
}
