//! Bridge configuration.
//!
//! Defaults match the stock backend on `localhost:8000`. Environment
//! overrides:
//!
//! | Variable | Meaning |
//! |---|---|
//! | `AERO_API_BASE` | base URL of the API |
//! | `AERO_POLL_MS` | poll interval in milliseconds (> 0) |
//! | `AERO_AUTO_POLL` | `1`/`true`/`yes` to start polling on attach |
//! | `AERO_TIMEOUT_MS` | per-request timeout in milliseconds (> 0) |

use std::time::Duration;

use crate::error::{BridgeError, Result};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub const ENV_API_BASE: &str = "AERO_API_BASE";
pub const ENV_POLL_MS: &str = "AERO_POLL_MS";
pub const ENV_AUTO_POLL: &str = "AERO_AUTO_POLL";
pub const ENV_TIMEOUT_MS: &str = "AERO_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub base_url: String,
    pub poll_interval: Duration,
    pub auto_poll: bool,
    pub request_timeout: Option<Duration>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            auto_poll: false,
            request_timeout: None,
        }
    }
}

impl BridgeConfig {
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub fn with_auto_poll(mut self, auto_poll: bool) -> Self {
        self.auto_poll = auto_poll;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Defaults overridden by the `AERO_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(base) = lookup(ENV_API_BASE) {
            config.base_url = base;
        }
        if let Some(raw) = lookup(ENV_POLL_MS) {
            config.poll_interval = parse_millis(ENV_POLL_MS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_AUTO_POLL) {
            config.auto_poll = parse_flag(ENV_AUTO_POLL, &raw)?;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            config.request_timeout = Some(parse_millis(ENV_TIMEOUT_MS, &raw)?);
        }
        config.validate()?;
        Ok(config)
    }

    /// Reject values the bridge cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(BridgeError::invalid_config("base URL is empty"));
        }
        if self.poll_interval.is_zero() {
            return Err(BridgeError::invalid_config("poll interval must be positive"));
        }
        if self.request_timeout.is_some_and(|t| t.is_zero()) {
            return Err(BridgeError::invalid_config("request timeout must be positive"));
        }
        Ok(())
    }
}

fn parse_millis(key: &str, raw: &str) -> Result<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(BridgeError::invalid_config(format!(
            "{key} must be a positive integer (milliseconds), got `{raw}`"
        ))),
        Ok(ms) => Ok(Duration::from_millis(ms)),
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(BridgeError::invalid_config(format!(
            "{key} must be a boolean, got `{raw}`"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = BridgeConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, BridgeConfig::default());
        assert_eq!(config.base_url, "http://localhost:8000/api");
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert!(!config.auto_poll);
        assert_eq!(config.request_timeout, None);
    }

    #[test]
    fn env_overrides() {
        let config = BridgeConfig::from_lookup(lookup(&[
            (ENV_API_BASE, "http://overlay.local/api"),
            (ENV_POLL_MS, "250"),
            (ENV_AUTO_POLL, "TRUE"),
            (ENV_TIMEOUT_MS, "2000"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://overlay.local/api");
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert!(config.auto_poll);
        assert_eq!(config.request_timeout, Some(Duration::from_secs(2)));
    }

    #[test]
    fn invalid_values_are_reported() {
        for pairs in [
            [(ENV_POLL_MS, "0")],
            [(ENV_POLL_MS, "fast")],
            [(ENV_AUTO_POLL, "maybe")],
            [(ENV_TIMEOUT_MS, "-1")],
            [(ENV_API_BASE, "  ")],
        ] {
            let err = BridgeConfig::from_lookup(lookup(&pairs)).unwrap_err();
            assert!(matches!(err, BridgeError::InvalidConfig { .. }), "{err}");
        }
    }
}
