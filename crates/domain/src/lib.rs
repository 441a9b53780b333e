//! # AssetDesk Domain
//!
//! Shared types for the AssetDesk data-access client.
//!
//! This crate contains:
//! - The client error taxonomy ([`ClientError`])
//! - Session and authentication payload types
//! - Configuration structures
//! - Persisted entry names and endpoint paths
//!
//! ## Architecture
//! - No dependencies on other AssetDesk crates
//! - Only external dependencies allowed
//! - Pure data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
