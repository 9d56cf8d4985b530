//! Notification relay for the Beacon record store.
//!
//! Every newly stored record is forwarded to an external webhook sink
//! (Discord-compatible). Delivery is best-effort: each attempt has a hard
//! timeout, failures are logged and dropped, and nothing is retried.
//!
//! # Modules
//!
//! - [`config`] -- [`RelayConfig`] loaded from the environment.
//! - [`error`] -- [`RelayError`] for a single failed delivery.
//! - [`payload`] -- Webhook message construction from a record.
//! - [`notifier`] -- [`Notifier`], which delivers messages and spawns
//!   detached deliveries.

pub mod config;
pub mod error;
pub mod notifier;
pub mod payload;

pub use config::RelayConfig;
pub use error::RelayError;
pub use notifier::{Delivery, Notifier};
