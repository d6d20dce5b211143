//! Client-side configuration for [`HttpAccessApi`](crate::HttpAccessApi).

use accessgate_auth::ConfigError;
use std::time::Duration;

/// Environment variable holding the request service base URL.
pub const API_URL_VAR: &str = "ACCESSGATE_API_URL";

/// Environment variable holding the request timeout in seconds.
pub const HTTP_TIMEOUT_VAR: &str = "ACCESSGATE_HTTP_TIMEOUT_SECS";

/// Where the request service lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebConfig {
    /// Base URL, without trailing slash.
    pub api_url: String,

    /// Timeout for each call.
    ///
    /// Default: 10 seconds
    pub request_timeout: Duration,
}

impl WebConfig {
    /// Configuration for `api_url` with the default timeout.
    #[must_use]
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }

    /// Set the per-call timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Read `ACCESSGATE_API_URL` and the optional
    /// `ACCESSGATE_HTTP_TIMEOUT_SECS`.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Missing`] without an API URL
    /// - [`ConfigError::Invalid`] for a non-numeric timeout
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env), reading through `lookup`.
    ///
    /// # Errors
    ///
    /// See [`from_env`](Self::from_env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = lookup(API_URL_VAR)
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing(API_URL_VAR))?;
        let mut config = Self::new(api_url.trim());

        if let Some(raw) = lookup(HTTP_TIMEOUT_VAR) {
            let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: HTTP_TIMEOUT_VAR,
                reason: format!("expected whole seconds, got {raw:?}"),
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    /// Absolute URL of `path` on the service.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_url)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_dropped() {
        let config = WebConfig::new("https://api.example.com/");
        assert_eq!(config.url("/requests"), "https://api.example.com/requests");
    }

    #[test]
    fn from_lookup_requires_url() {
        assert_eq!(
            WebConfig::from_lookup(|_| None),
            Err(ConfigError::Missing(API_URL_VAR))
        );
    }

    #[test]
    fn from_lookup_parses_timeout() {
        let config = WebConfig::from_lookup(|name| match name {
            API_URL_VAR => Some("http://localhost:8080".to_string()),
            HTTP_TIMEOUT_VAR => Some("3".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(3));

        let err = WebConfig::from_lookup(|name| match name {
            API_URL_VAR => Some("http://localhost:8080".to_string()),
            _ => Some("soon".to_string()),
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: HTTP_TIMEOUT_VAR, .. }));
    }
}
