//! Error types for webhook delivery.
//!
//! These never reach the client that produced the record. They exist so
//! the detached delivery task can log a precise reason.

/// Errors that can occur while delivering one notification.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The HTTP client could not be constructed.
    #[error("client setup error: {0}")]
    Client(String),

    /// The request could not be sent (sink unreachable, DNS, TLS, ...).
    #[error("request failed: {0}")]
    Request(String),

    /// The sink answered with a non-success status.
    #[error("sink returned {status}: {body}")]
    Status {
        /// HTTP status code returned by the sink.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The delivery did not complete within the configured timeout.
    #[error("delivery timed out after {timeout_ms}ms")]
    Timeout {
        /// The timeout that was exceeded, in milliseconds.
        timeout_ms: u128,
    },
}
