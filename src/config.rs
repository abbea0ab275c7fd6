//! Runtime configuration read from the environment.

use std::env;
use std::time::Duration;

use chrono_tz::Tz;

use crate::error::{Error, Result};

/// Default port if not specified via environment variable.
pub const DEFAULT_PORT: u16 = 3000;

/// Default database path if not specified via environment variable.
pub const DEFAULT_DB_PATH: &str = "sqlite:outages.db?mode=rwc";

/// Default feed polling interval in seconds.
pub const DEFAULT_POLL_SECS: u64 = 300;

/// Service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// Feed document to poll. Polling is off when unset.
    pub feed_url: Option<String>,
    pub poll_interval: Duration,
    /// IANA zone for timestamps the feed writes without an offset and for calendar days.
    pub timezone: Tz,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: DEFAULT_DB_PATH.to_string(),
            feed_url: None,
            poll_interval: Duration::from_secs(DEFAULT_POLL_SECS),
            timezone: Tz::UTC,
        }
    }
}

impl Config {
    /// Load configuration from `OUTAGEMAP_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Config::default();

        let config = Config {
            port: parse_var(&lookup, "OUTAGEMAP_PORT")?.unwrap_or(defaults.port),
            database_url: lookup("OUTAGEMAP_DATABASE_URL").unwrap_or(defaults.database_url),
            feed_url: lookup("OUTAGEMAP_FEED_URL").filter(|url| !url.trim().is_empty()),
            poll_interval: parse_var(&lookup, "OUTAGEMAP_POLL_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.poll_interval),
            timezone: parse_var(&lookup, "OUTAGEMAP_TIMEZONE")?.unwrap_or(defaults.timezone),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(Error::Config("OUTAGEMAP_POLL_SECS must be greater than zero".into()));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| Error::Config(format!("{key} has invalid value {raw:?}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.timezone, Tz::UTC);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("OUTAGEMAP_PORT", "8080"),
            ("OUTAGEMAP_FEED_URL", "https://example.org/outages.json"),
            ("OUTAGEMAP_POLL_SECS", "60"),
            ("OUTAGEMAP_TIMEZONE", "Europe/Warsaw"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.feed_url.as_deref(), Some("https://example.org/outages.json"));
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert_eq!(config.timezone, Tz::Europe__Warsaw);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            Config::from_lookup(lookup(&[("OUTAGEMAP_PORT", "eighty")])),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("OUTAGEMAP_POLL_SECS", "0")])),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("OUTAGEMAP_TIMEZONE", "Europe/Atlantis")])),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_out_of_range_numbers_are_config_errors() {
        for (key, value) in [
            ("OUTAGEMAP_TIMEZONE", "-2147483648"),
            ("OUTAGEMAP_TIMEZONE", "+01:00"),
            ("OUTAGEMAP_PORT", "-1"),
            ("OUTAGEMAP_PORT", "65536"),
            ("OUTAGEMAP_POLL_SECS", "-2147483648"),
            ("OUTAGEMAP_POLL_SECS", "18446744073709551616"),
        ] {
            assert!(
                matches!(Config::from_lookup(lookup(&[(key, value)])), Err(Error::Config(_))),
                "{key}={value} should be rejected"
            );
        }
    }

    #[test]
    fn test_blank_feed_url_disables_polling() {
        let config = Config::from_lookup(lookup(&[("OUTAGEMAP_FEED_URL", " ")])).unwrap();
        assert!(config.feed_url.is_none());
    }
}
