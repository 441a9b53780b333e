//! Common building blocks shared across AssetDesk crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - (always): the [`storage::SecretStore`] abstraction and its in-memory
//!   backend
//! - `platform`: platform keychain integration via `keyring`
//! - `test-utils`: mock implementations for downstream test suites

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod storage;

// Platform tier
// -------------------------------------------------------------------
#[cfg(feature = "platform")]
pub mod security;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", test))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "platform")]
pub use security::{KeychainError, KeychainProvider};
pub use storage::{MemorySecretStore, SecretStore, StorageError};
