//! Error types for the daemon binary.
//!
//! [`DaemonError`] is the top-level error type that wraps every failure
//! mode during startup and serving.

use beacon_api::ServerError;
use beacon_core::ConfigError;
use beacon_relay::RelayError;

/// Top-level error for the daemon binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// The webhook client could not be built.
    #[error("relay error: {source}")]
    Relay {
        /// The underlying relay error.
        #[from]
        source: RelayError,
    },

    /// The HTTP server failed to bind or serve.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: ServerError,
    },
}
