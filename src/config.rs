//! Runtime configuration.
//!
//! Everything comes from environment variables, optionally seeded from a
//! `.env` file in the working directory. Provider keys are optional: a
//! missing key simply leaves that provider out of its chain.

use anyhow::{Context, Result};
use std::time::Duration;

use crate::constants::{DEFAULT_ALERT_LIMIT, DEFAULT_PROVIDER_TIMEOUT_SECS};

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub openweathermap_api_key: Option<String>,
    pub weatherapi_key: Option<String>,
    /// New England 511 developer key; enables traffic alerts and road reports
    pub traffic_511_api_key: Option<String>,
    /// Upper bound on any single provider call
    pub provider_timeout: Duration,
    pub alert_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openweathermap_api_key: None,
            weatherapi_key: None,
            traffic_511_api_key: None,
            provider_timeout: Duration::from_secs(DEFAULT_PROVIDER_TIMEOUT_SECS),
            alert_limit: DEFAULT_ALERT_LIMIT,
        }
    }
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let key = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let provider_timeout = match key("SNOWCAST_PROVIDER_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw
                    .parse()
                    .with_context(|| format!("SNOWCAST_PROVIDER_TIMEOUT_SECS must be whole seconds, got '{raw}'"))?;
                anyhow::ensure!(secs > 0, "SNOWCAST_PROVIDER_TIMEOUT_SECS must be greater than zero");
                Duration::from_secs(secs)
            }
            None => defaults.provider_timeout,
        };

        let alert_limit = match key("SNOWCAST_ALERT_LIMIT") {
            Some(raw) => {
                let limit: usize = raw
                    .parse()
                    .with_context(|| format!("SNOWCAST_ALERT_LIMIT must be a positive integer, got '{raw}'"))?;
                anyhow::ensure!(limit > 0, "SNOWCAST_ALERT_LIMIT must be greater than zero");
                limit
            }
            None => defaults.alert_limit,
        };

        Ok(Self {
            openweathermap_api_key: key("OPENWEATHERMAP_API_KEY"),
            weatherapi_key: key("WEATHERAPI_KEY"),
            traffic_511_api_key: key("TRAFFIC_511_API_KEY"),
            provider_timeout,
            alert_limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.provider_timeout, Duration::from_secs(8));
        assert_eq!(config.alert_limit, 10);
    }

    #[test]
    fn keys_and_overrides_are_read() {
        let config = Config::from_lookup(lookup(&[
            ("WEATHERAPI_KEY", "abc"),
            ("OPENWEATHERMAP_API_KEY", "   "),
            ("SNOWCAST_PROVIDER_TIMEOUT_SECS", "3"),
            ("SNOWCAST_ALERT_LIMIT", "25"),
        ]))
        .unwrap();
        assert_eq!(config.weatherapi_key.as_deref(), Some("abc"));
        assert_eq!(config.openweathermap_api_key, None);
        assert_eq!(config.provider_timeout, Duration::from_secs(3));
        assert_eq!(config.alert_limit, 25);
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let err = Config::from_lookup(lookup(&[("SNOWCAST_ALERT_LIMIT", "lots")])).unwrap_err();
        assert!(format!("{err:#}").contains("SNOWCAST_ALERT_LIMIT"));
        assert!(Config::from_lookup(lookup(&[("SNOWCAST_PROVIDER_TIMEOUT_SECS", "0")])).is_err());
    }
}
