//! Shared application state for the request surface.

use std::sync::Arc;
use std::time::Instant;

use beacon_core::RecordStore;
use beacon_relay::Notifier;

use crate::auth::AuthConfig;
use crate::rate_limit::{RateLimitConfig, RateLimiter};

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor. The
/// store and notifier are themselves shared with the process entry point
/// (the store also with the sweeper), so they sit behind their own
/// [`Arc`]s.
#[derive(Debug)]
pub struct AppState {
    /// The record store.
    pub store: Arc<RecordStore>,
    /// Relay for newly stored records.
    pub notifier: Arc<Notifier>,
    /// Shared-secret settings.
    pub auth: AuthConfig,
    /// Per-client request limiter.
    pub limiter: RateLimiter,
    /// Process start, reported by the health check.
    pub booted_at: Instant,
}

impl AppState {
    /// Assemble the state from its parts.
    pub fn new(
        store: Arc<RecordStore>,
        notifier: Arc<Notifier>,
        auth: AuthConfig,
        rate_limit: RateLimitConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            auth,
            limiter: RateLimiter::new(rate_limit),
            booted_at: Instant::now(),
        }
    }
}
