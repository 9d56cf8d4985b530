//! Store configuration and environment lookup helpers.
//!
//! All configuration is supplied through environment variables. Every
//! loader takes a `lookup` closure instead of reading the process
//! environment directly so tests can feed values without mutating global
//! state. The `from_env` constructors simply pass `std::env::var`.

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

/// Default record time-to-live (5 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_millis(300_000);

/// Default period between expiry sweeps (30 seconds).
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_millis(30_000);

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable was present but could not be parsed or was out of range.
    #[error("invalid value for {name}: {reason}")]
    InvalidValue {
        /// The environment variable name.
        name: String,
        /// What was wrong with the value.
        reason: String,
    },
}

/// Configuration for the record store and its sweeper.
///
/// # Environment
///
/// - `EXPIRATION_TIME` -- record TTL in milliseconds (default 300000)
/// - `CLEANUP_INTERVAL` -- sweep period in milliseconds (default 30000)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// How long a record stays active after insertion.
    pub ttl: Duration,
    /// Period between background expiry sweeps.
    pub sweep_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

impl StoreConfig {
    /// Set the record time-to-live.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the period between expiry sweeps.
    #[must_use]
    pub const fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Load the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load the configuration through an arbitrary variable lookup.
    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let config = Self {
            ttl: millis_var(&lookup, "EXPIRATION_TIME", DEFAULT_TTL)?,
            sweep_interval: millis_var(&lookup, "CLEANUP_INTERVAL", DEFAULT_SWEEP_INTERVAL)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject zero durations; a zero TTL would expire every record on
    /// arrival and a zero interval cannot be scheduled.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ttl.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "EXPIRATION_TIME".to_owned(),
                reason: "must be greater than zero".to_owned(),
            });
        }
        if self.sweep_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "CLEANUP_INTERVAL".to_owned(),
                reason: "must be greater than zero".to_owned(),
            });
        }
        Ok(())
    }
}

/// Read an optional string variable. Empty and whitespace-only values
/// count as absent.
pub fn optional_var<L>(lookup: &L, name: &str) -> Option<String>
where
    L: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Read and parse a variable, falling back to `default` when absent.
pub fn parse_var<L, T>(lookup: &L, name: &str, default: T) -> Result<T, ConfigError>
where
    L: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    optional_var(lookup, name).map_or(Ok(default), |raw| {
        raw.parse().map_err(|e| ConfigError::InvalidValue {
            name: name.to_owned(),
            reason: format!("{raw:?}: {e}"),
        })
    })
}

/// Read a millisecond count as a [`Duration`].
pub fn millis_var<L>(lookup: &L, name: &str, default: Duration) -> Result<Duration, ConfigError>
where
    L: Fn(&str) -> Option<String>,
{
    optional_var(lookup, name).map_or(Ok(default), |raw| {
        raw.parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|e| ConfigError::InvalidValue {
                name: name.to_owned(),
                reason: format!("{raw:?} is not a millisecond count: {e}"),
            })
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = StoreConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.ttl, Duration::from_secs(300));
        assert_eq!(config.sweep_interval, Duration::from_secs(30));
    }

    #[test]
    fn reads_millisecond_values() {
        let config = StoreConfig::from_lookup(lookup_from(&[
            ("EXPIRATION_TIME", "60000"),
            ("CLEANUP_INTERVAL", " 500 "),
        ]))
        .unwrap();
        assert_eq!(config.ttl, Duration::from_secs(60));
        assert_eq!(config.sweep_interval, Duration::from_millis(500));
    }

    #[test]
    fn rejects_garbage() {
        let err = StoreConfig::from_lookup(lookup_from(&[("EXPIRATION_TIME", "soon")]));
        assert!(matches!(err, Err(ConfigError::InvalidValue { ref name, .. }) if name == "EXPIRATION_TIME"));
    }

    #[test]
    fn rejects_zero_interval() {
        let err = StoreConfig::from_lookup(lookup_from(&[("CLEANUP_INTERVAL", "0")]));
        assert!(err.is_err());
    }

    #[test]
    fn empty_optional_is_absent() {
        let lookup = lookup_from(&[("API_KEY", "   ")]);
        assert_eq!(optional_var(&lookup, "API_KEY"), None);
        assert_eq!(parse_var(&lookup, "PORT", 3000_u16).unwrap(), 3000);
    }
}
