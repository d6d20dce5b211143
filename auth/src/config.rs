//! Authentication configuration.
//!
//! Client credentials and the redirect target are supplied by the
//! deployment, never embedded. Provider endpoints default to GitHub.

use crate::constants::{DEFAULT_SCOPE, env, github};
use crate::error::ConfigError;
use chrono::Duration;
use std::time::Duration as StdDuration;

/// OAuth client configuration.
#[derive(Clone)]
pub struct AuthConfig {
    /// OAuth client identifier.
    pub client_id: String,

    /// OAuth client secret (keep confidential).
    pub client_secret: String,

    /// Redirect target registered with the provider.
    pub redirect_uri: String,

    /// Scope requested on authorization.
    ///
    /// Default: `user:email`
    pub scope: String,

    /// Provider authorization page.
    pub authorize_url: String,

    /// Provider code exchange endpoint.
    pub token_url: String,

    /// Provider authenticated-user endpoint.
    pub user_api_url: String,

    /// Timeout for each provider HTTP call.
    ///
    /// Default: 10 seconds
    pub http_timeout: StdDuration,

    /// How long a consumed code is remembered for replay detection.
    ///
    /// Default: 10 minutes, the lifetime of a GitHub authorization code
    pub code_retention: Duration,
}

impl AuthConfig {
    /// Create configuration for GitHub with default scope and timeouts.
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            scope: DEFAULT_SCOPE.to_string(),
            authorize_url: github::AUTHORIZE_URL.to_string(),
            token_url: github::TOKEN_URL.to_string(),
            user_api_url: github::USER_API_URL.to_string(),
            http_timeout: StdDuration::from_secs(10),
            code_retention: Duration::minutes(10),
        }
    }

    /// Read configuration from the process environment.
    ///
    /// Requires `ACCESSGATE_CLIENT_ID`, `ACCESSGATE_CLIENT_SECRET` and
    /// `ACCESSGATE_REDIRECT_URI`; `ACCESSGATE_OAUTH_SCOPE` is optional.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] naming the first absent variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env), reading through `lookup`.
    ///
    /// Blank values count as missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] naming the first absent variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let require = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let mut config = Self::new(
            require(env::CLIENT_ID)?,
            require(env::CLIENT_SECRET)?,
            require(env::REDIRECT_URI)?,
        );
        if let Some(scope) = lookup(env::OAUTH_SCOPE).filter(|v| !v.trim().is_empty()) {
            config.scope = scope;
        }
        Ok(config)
    }

    /// Set the requested scope.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Point at a different provider (or a local stand-in).
    #[must_use]
    pub fn with_endpoints(
        mut self,
        authorize_url: impl Into<String>,
        token_url: impl Into<String>,
        user_api_url: impl Into<String>,
    ) -> Self {
        self.authorize_url = authorize_url.into();
        self.token_url = token_url.into();
        self.user_api_url = user_api_url.into();
        self
    }

    /// Set the per-call HTTP timeout.
    #[must_use]
    pub const fn with_http_timeout(mut self, timeout: StdDuration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Set how long consumed codes are remembered.
    #[must_use]
    pub const fn with_code_retention(mut self, retention: Duration) -> Self {
        self.code_retention = retention;
        self
    }

    /// Provider URL to send the user to, carrying `state` for the callback.
    ///
    /// # Errors
    ///
    /// Returns error if the query string cannot be encoded.
    pub fn authorization_url(&self, state: &str) -> Result<String, ConfigError> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("scope", self.scope.as_str()),
            ("state", state),
        ];

        let query = serde_urlencoded::to_string(&params).map_err(|e| ConfigError::Invalid {
            name: "authorization_url",
            reason: e.to_string(),
        })?;

        Ok(format!("{}?{query}", self.authorize_url))
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .field("scope", &self.scope)
            .field("authorize_url", &self.authorize_url)
            .field("token_url", &self.token_url)
            .field("user_api_url", &self.user_api_url)
            .field("http_timeout", &self.http_timeout)
            .field("code_retention", &self.code_retention)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn authorization_url_carries_client_redirect_and_scope() {
        let config = AuthConfig::new("abc", "secret", "https://app.example.com/login/callback");
        let url = config.authorization_url("xyz").unwrap();

        assert_eq!(
            url,
            "https://github.com/login/oauth/authorize?client_id=abc\
             &redirect_uri=https%3A%2F%2Fapp.example.com%2Flogin%2Fcallback\
             &scope=user%3Aemail&state=xyz"
        );
    }

    #[test]
    fn from_lookup_requires_credentials() {
        let err = AuthConfig::from_lookup(lookup(&[(env::CLIENT_ID, "abc")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing(env::CLIENT_SECRET));

        let err = AuthConfig::from_lookup(lookup(&[
            (env::CLIENT_ID, "abc"),
            (env::CLIENT_SECRET, "s"),
            (env::REDIRECT_URI, "  "),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing(env::REDIRECT_URI));
    }

    #[test]
    fn from_lookup_applies_scope_override() {
        let config = AuthConfig::from_lookup(lookup(&[
            (env::CLIENT_ID, "abc"),
            (env::CLIENT_SECRET, "s"),
            (env::REDIRECT_URI, "https://app.example.com/cb"),
            (env::OAUTH_SCOPE, "read:user"),
        ]))
        .unwrap();
        assert_eq!(config.scope, "read:user");
        assert_eq!(config.token_url, github::TOKEN_URL);
    }

    #[test]
    fn debug_redacts_secret() {
        let config = AuthConfig::new("abc", "hunter2", "https://app.example.com/cb");
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }
}
