//! Shared-secret authentication.
//!
//! Protected routes require an `X-API-Key` header matching the
//! configured secret. The comparison runs in constant time for keys of
//! equal length. Failed attempts are logged at `warn`; they are a
//! security signal, not a server fault.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use beacon_core::config::optional_var;
use subtle::ConstantTimeEq;
use tracing::{error, warn};

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the shared secret.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Authentication settings.
///
/// # Environment
///
/// - `API_KEY` -- shared secret; when unset every protected request fails
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthConfig {
    /// The expected secret, if configured.
    pub api_key: Option<String>,
}

impl AuthConfig {
    /// Require `key` on protected routes.
    pub fn with_key(key: impl Into<String>) -> Self {
        Self {
            api_key: Some(key.into()),
        }
    }

    /// Load the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load the configuration through an arbitrary variable lookup.
    pub fn from_lookup<L>(lookup: L) -> Self
    where
        L: Fn(&str) -> Option<String>,
    {
        Self {
            api_key: optional_var(&lookup, "API_KEY"),
        }
    }

    /// Check a provided header value against the configured secret.
    pub fn verify(&self, provided: Option<&HeaderValue>) -> Result<(), ApiError> {
        let Some(expected) = self.api_key.as_deref() else {
            return Err(ApiError::Misconfigured);
        };
        let Some(provided) = provided else {
            return Err(ApiError::Unauthorized);
        };
        if constant_time_eq(provided.as_bytes(), expected.as_bytes()) {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

/// Axum middleware enforcing [`AuthConfig::verify`].
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Err(e) = state.auth.verify(request.headers().get(API_KEY_HEADER)) {
        let path = request.uri().path();
        match e {
            ApiError::Misconfigured => error!(path, "API_KEY not configured, rejecting request"),
            ApiError::Unauthorized => warn!(path, "unauthorized request: missing API key"),
            _ => warn!(path, "unauthorized request: invalid API key"),
        }
        return Err(e);
    }
    Ok(next.run(request).await)
}

/// Length is not secret; only the contents are compared in constant time.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}
