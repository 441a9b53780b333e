//! Backend-agnostic secret storage

use super::error::StorageError;

/// Durable key/value storage for session secrets.
///
/// Implementations must be safe to share across threads. Reads of a key
/// that was never written (or was removed) return `Ok(None)`; absence is
/// not an error.
pub trait SecretStore: Send + Sync {
    /// Short backend name used in log fields.
    fn backend(&self) -> &'static str;

    /// Read a secret.
    ///
    /// # Errors
    /// Returns error if the backend cannot be reached.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write (or overwrite) a secret.
    ///
    /// # Errors
    /// Returns error if the backend rejects the write.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a secret. Removing a missing key succeeds.
    ///
    /// # Errors
    /// Returns error if the backend rejects the deletion.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Remove several secrets as one logical step.
    ///
    /// The default removes each key in turn and attempts all of them even
    /// after a failure, returning the first error. Backends that can do
    /// better (a single document rewrite) override it.
    ///
    /// # Errors
    /// Returns the first backend error encountered.
    fn remove_all(&self, keys: &[&str]) -> Result<(), StorageError> {
        let mut first_error = None;
        for key in keys {
            if let Err(err) = self.remove(key) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
