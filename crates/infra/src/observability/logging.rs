//! Tracing subscriber setup

use assetdesk_domain::{ClientError, LoggingConfig};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured filter. Calling this
/// twice is an error rather than a panic so host applications that already
/// installed a subscriber keep theirs.
///
/// # Errors
/// Returns `ClientError::Config` for an invalid filter directive or if a
/// global subscriber is already set.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), ClientError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.filter).map_err(|e| {
            ClientError::Config(format!("Invalid log filter {}: {e}", config.filter))
        })?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.json {
        registry.with(fmt::layer().json().with_current_span(true)).try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };

    result.map_err(|e| ClientError::Config(format!("Tracing already initialized: {e}")))
}
