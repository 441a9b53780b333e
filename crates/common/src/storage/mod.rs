//! Secret storage abstraction
//!
//! - **[`SecretStore`]**: the trait every session backend implements
//! - **[`MemorySecretStore`]**: process-local backend
//! - **[`StorageError`]**: backend failures
//!
//! The platform keychain backend lives in [`crate::security`] behind the
//! `platform` feature; the file backend lives with the session code in
//! `assetdesk-infra`.

mod error;
mod memory;
mod traits;

pub use error::StorageError;
pub use memory::MemorySecretStore;
pub use traits::SecretStore;
