//! Relay configuration.

use std::time::Duration;

use beacon_core::config::{ConfigError, millis_var, optional_var};

/// Default per-delivery timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Default name shown as the webhook author.
pub const DEFAULT_USERNAME: &str = "JX-NOTIFIER";

/// Configuration for the notification relay.
///
/// # Environment
///
/// - `DISCORD_WEBHOOK_URL` -- sink endpoint; relay is disabled when unset
/// - `NOTIFY_TIMEOUT_MS` -- per-delivery timeout (default 5000)
/// - `NOTIFY_USERNAME` -- webhook author name (default `JX-NOTIFIER`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Webhook endpoint. `None` disables delivery.
    pub webhook_url: Option<String>,
    /// Hard timeout for a single delivery attempt.
    pub timeout: Duration,
    /// Author name attached to each message.
    pub username: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout: DEFAULT_TIMEOUT,
            username: DEFAULT_USERNAME.to_owned(),
        }
    }
}

impl RelayConfig {
    /// Load the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load the configuration through an arbitrary variable lookup.
    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let timeout = millis_var(&lookup, "NOTIFY_TIMEOUT_MS", DEFAULT_TIMEOUT)?;
        if timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "NOTIFY_TIMEOUT_MS".to_owned(),
                reason: "must be greater than zero".to_owned(),
            });
        }

        Ok(Self {
            webhook_url: optional_var(&lookup, "DISCORD_WEBHOOK_URL"),
            timeout,
            username: optional_var(&lookup, "NOTIFY_USERNAME")
                .unwrap_or_else(|| DEFAULT_USERNAME.to_owned()),
        })
    }

    /// Point the relay at a sink.
    #[must_use]
    pub fn with_webhook_url(mut self, url: impl Into<String>) -> Self {
        self.webhook_url = Some(url.into());
        self
    }

    /// Override the delivery timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
