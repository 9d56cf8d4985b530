//! Daemon configuration.
//!
//! Gathers every subsystem's settings from one variable source so the
//! process fails fast on any malformed value before anything starts.

use beacon_api::{AuthConfig, RateLimitConfig, ServerConfig};
use beacon_core::{ConfigError, StoreConfig};
use beacon_relay::RelayConfig;

/// All settings the daemon needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonConfig {
    /// TTL and sweep period.
    pub store: StoreConfig,
    /// Webhook sink settings.
    pub relay: RelayConfig,
    /// Bind address.
    pub server: ServerConfig,
    /// Shared secret.
    pub auth: AuthConfig,
    /// Request budget per client.
    pub rate_limit: RateLimitConfig,
}

impl DaemonConfig {
    /// Load from the process environment, after reading a `.env` file
    /// if one is present.
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load through an arbitrary variable lookup and validate.
    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            store: StoreConfig::from_lookup(&lookup)?,
            relay: RelayConfig::from_lookup(&lookup)?,
            server: ServerConfig::from_lookup(&lookup)?,
            auth: AuthConfig::from_lookup(&lookup),
            rate_limit: RateLimitConfig::from_lookup(&lookup)?,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = DaemonConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.store, StoreConfig::default());
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.auth.api_key, None);
        assert_eq!(config.relay.webhook_url, None);
        assert_eq!(config.rate_limit.max_requests, 60);
    }

    #[test]
    fn reads_every_subsystem() {
        let config = DaemonConfig::from_lookup(lookup(&[
            ("EXPIRATION_TIME", "60000"),
            ("CLEANUP_INTERVAL", "5000"),
            ("DISCORD_WEBHOOK_URL", "https://discord.test/hook"),
            ("PORT", "8080"),
            ("API_KEY", "s3cret"),
            ("RATE_LIMIT_MAX", "10"),
        ]))
        .unwrap();

        assert_eq!(config.store.ttl, Duration::from_secs(60));
        assert_eq!(config.store.sweep_interval, Duration::from_secs(5));
        assert_eq!(config.relay.webhook_url.as_deref(), Some("https://discord.test/hook"));
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.api_key.as_deref(), Some("s3cret"));
        assert_eq!(config.rate_limit.max_requests, 10);
    }

    #[test]
    fn malformed_values_fail_startup() {
        assert!(DaemonConfig::from_lookup(lookup(&[("PORT", "http")])).is_err());
        assert!(DaemonConfig::from_lookup(lookup(&[("EXPIRATION_TIME", "0")])).is_err());
        assert!(DaemonConfig::from_lookup(lookup(&[("NOTIFY_TIMEOUT_MS", "-1")])).is_err());
    }
}
