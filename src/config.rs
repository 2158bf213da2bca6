use std::env;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

pub const API_URL_ENV: &str = "EEGFLOW_API_URL";
pub const POLL_INTERVAL_ENV: &str = "EEGFLOW_POLL_INTERVAL_MS";

/// Where the remote executor lives and how often to poll it.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub poll_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `EEGFLOW_API_URL` and `EEGFLOW_POLL_INTERVAL_MS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(url) = lookup(API_URL_ENV).filter(|u| !u.trim().is_empty()) {
            config.base_url = url;
        }
        if let Some(raw) = lookup(POLL_INTERVAL_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => config.poll_interval = Duration::from_millis(ms),
                _ => warn!(value = %raw, "ignoring invalid {}", POLL_INTERVAL_ENV),
            }
        }
        config
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_overrides_defaults() {
        let config = ClientConfig::from_lookup(|key| match key {
            API_URL_ENV => Some("http://executor:8000".to_string()),
            POLL_INTERVAL_ENV => Some("500".to_string()),
            _ => None,
        });
        assert_eq!(config.base_url, "http://executor:8000");
        assert_eq!(config.poll_interval, Duration::from_millis(500));
    }

    #[test]
    fn invalid_interval_keeps_default() {
        let config = ClientConfig::from_lookup(|key| match key {
            POLL_INTERVAL_ENV => Some("soon".to_string()),
            _ => None,
        });
        assert_eq!(config, ClientConfig::default());
    }
}
