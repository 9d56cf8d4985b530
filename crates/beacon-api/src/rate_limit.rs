//! Per-client fixed-window rate limiting for `/api` routes.
//!
//! Each client (keyed by peer IP) gets `max_requests` per `window`. The
//! window starts on the client's first request and resets once it has
//! fully elapsed. Stale windows are pruned lazily when the table grows.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use beacon_core::config::{ConfigError, millis_var, parse_var};
use parking_lot::Mutex;
use tracing::warn;

use crate::error::ApiError;
use crate::state::AppState;

/// Default requests allowed per window.
pub const DEFAULT_MAX_REQUESTS: u32 = 60;

/// Default window length.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Table size above which expired windows are pruned.
const PRUNE_THRESHOLD: usize = 4_096;

/// Key used when the client address is unknown.
const UNKNOWN_CLIENT: &str = "unknown";

/// Rate limit settings.
///
/// # Environment
///
/// - `RATE_LIMIT_MAX` -- requests per window (default 60)
/// - `RATE_LIMIT_WINDOW_MS` -- window length (default 60000)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Requests allowed per client per window.
    pub max_requests: u32,
    /// Window length.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_MAX_REQUESTS,
            window: DEFAULT_WINDOW,
        }
    }
}

impl RateLimitConfig {
    /// Load the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load the configuration through an arbitrary variable lookup.
    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            max_requests: parse_var(&lookup, "RATE_LIMIT_MAX", DEFAULT_MAX_REQUESTS)?,
            window: millis_var(&lookup, "RATE_LIMIT_WINDOW_MS", DEFAULT_WINDOW)?,
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window limiter keyed by client identifier.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    /// Create a limiter with empty windows.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Count a request from `client` now.
    ///
    /// Returns the time until the window resets when over budget.
    pub fn check(&self, client: &str) -> Result<(), Duration> {
        self.check_at(client, Instant::now())
    }

    /// Count a request from `client` at `now`.
    pub fn check_at(&self, client: &str, now: Instant) -> Result<(), Duration> {
        let window_len = self.config.window;
        let mut windows = self.windows.lock();

        if windows.len() > PRUNE_THRESHOLD {
            windows.retain(|_, w| now.saturating_duration_since(w.started) < window_len);
        }

        let window = windows.entry(client.to_owned()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.saturating_duration_since(window.started) >= window_len {
            *window = Window {
                started: now,
                count: 0,
            };
        }

        if window.count >= self.config.max_requests {
            let elapsed = now.saturating_duration_since(window.started);
            return Err(window_len.saturating_sub(elapsed));
        }
        window.count = window.count.saturating_add(1);
        Ok(())
    }
}

/// Axum middleware applying the shared [`RateLimiter`].
pub async fn limit_requests(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let client = client_key(&request);
    if let Err(retry_after) = state.limiter.check(&client) {
        warn!(client, path = request.uri().path(), "rate limit exceeded");
        return Err(ApiError::RateLimited { retry_after });
    }
    Ok(next.run(request).await)
}

/// Peer IP when the server runs with connect info, else the first
/// `X-Forwarded-For` entry, else a shared bucket.
fn client_key(request: &Request) -> String {
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map_or_else(|| UNKNOWN_CLIENT.to_owned(), ToOwned::to_owned)
}
