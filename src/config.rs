//! Configuration Module
//!
//! Handles loading cache configuration from environment variables and holds
//! the default lifetime used by tag-based expiration.

use std::env;
use std::time::Duration;

/// Default lifetime of tag-based entries: six hours.
pub const DEFAULT_TAG_LIFETIME_SECS: u64 = 6 * 60 * 60;

/// Default interval between sweeper passes.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 1;

// == Expiration Config ==
/// Settings consumed by the tag-based [`Expiration`](crate::Expiration) constructors.
///
/// Passed explicitly instead of living in a process-wide global, so two
/// caches in one process can use different tag lifetimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpirationConfig {
    default_lifetime: Duration,
}

impl ExpirationConfig {
    /// Creates a config with the given default lifetime for tagged entries.
    pub fn new(default_lifetime: Duration) -> Self {
        Self { default_lifetime }
    }

    /// Lifetime given to entries created with a tag policy.
    pub fn default_lifetime(&self) -> Duration {
        self.default_lifetime
    }

    /// Changes the lifetime used by tag policies created from now on.
    ///
    /// Policies already built keep their deadline.
    pub fn set_default_lifetime(&mut self, lifetime: Duration) {
        self.default_lifetime = lifetime;
    }
}

impl Default for ExpirationConfig {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TAG_LIFETIME_SECS))
    }
}

// == Config ==
/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Default lifetime in seconds of entries created with a tag policy
    pub default_tag_lifetime: u64,
    /// Background sweeper interval in seconds
    pub sweep_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DEFAULT_TAG_LIFETIME` - Tag lifetime in seconds (default: 21600)
    /// - `SWEEP_INTERVAL` - Sweeper frequency in seconds (default: 1)
    pub fn from_env() -> Self {
        Self {
            default_tag_lifetime: env::var("DEFAULT_TAG_LIFETIME")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TAG_LIFETIME_SECS),
            sweep_interval: env::var("SWEEP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|secs: &u64| *secs > 0)
                .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS),
        }
    }

    /// Expiration settings derived from this config.
    pub fn expiration(&self) -> ExpirationConfig {
        ExpirationConfig::new(Duration::from_secs(self.default_tag_lifetime))
    }

    /// Sweeper interval as a `Duration`.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_tag_lifetime: DEFAULT_TAG_LIFETIME_SECS,
            sweep_interval: DEFAULT_SWEEP_INTERVAL_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.default_tag_lifetime, 21_600);
        assert_eq!(config.sweep_interval, 1);
        assert_eq!(config.sweep_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("DEFAULT_TAG_LIFETIME");
        env::remove_var("SWEEP_INTERVAL");

        let config = Config::from_env();
        assert_eq!(config.default_tag_lifetime, DEFAULT_TAG_LIFETIME_SECS);
        assert_eq!(config.sweep_interval, DEFAULT_SWEEP_INTERVAL_SECS);
    }

    #[test]
    fn test_expiration_config_from_config() {
        let config = Config {
            default_tag_lifetime: 30,
            sweep_interval: 5,
        };
        assert_eq!(
            config.expiration().default_lifetime(),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn test_set_default_lifetime() {
        let mut expiration = ExpirationConfig::default();
        assert_eq!(
            expiration.default_lifetime(),
            Duration::from_secs(DEFAULT_TAG_LIFETIME_SECS)
        );

        expiration.set_default_lifetime(Duration::from_millis(250));
        assert_eq!(expiration.default_lifetime(), Duration::from_millis(250));
    }
}
