//! Observability infrastructure
//!
//! Structured logging is done with `tracing` macros at the call sites;
//! this module only installs the subscriber.

pub mod logging;

pub use logging::init_tracing;
