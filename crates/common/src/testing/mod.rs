//! Testing utilities
//!
//! - **[`mocks`]**: in-memory stand-ins for platform services

pub mod mocks;

#[cfg(feature = "platform")]
pub use mocks::MockKeychainProvider;
pub use mocks::FailingSecretStore;
