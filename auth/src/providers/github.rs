//! GitHub OAuth provider implementation.

use super::{IdentityProvider, ProviderIdentity};
use crate::config::AuthConfig;
use crate::constants::{USER_AGENT, github};
use crate::error::ConfigError;
use accessgate_core::AuthError;
use reqwest::Client;
use reqwest::header::{ACCEPT, USER_AGENT as USER_AGENT_HEADER};
use serde::Deserialize;

/// GitHub OAuth provider.
///
/// Redeems authorization codes at the token endpoint, then reads the login
/// of the authenticated user.
///
/// # Configuration
///
/// 1. Register an OAuth app on GitHub
/// 2. Set its callback URL to the deployment's redirect target
/// 3. Set `ACCESSGATE_CLIENT_ID`, `ACCESSGATE_CLIENT_SECRET` and
///    `ACCESSGATE_REDIRECT_URI`
///
/// # Example
///
/// ```no_run
/// use accessgate_auth::{AuthConfig, providers::GitHubProvider};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let github = GitHubProvider::new(AuthConfig::from_env()?)?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct GitHubProvider {
    config: AuthConfig,

    /// HTTP client for making requests.
    http_client: Client,
}

impl GitHubProvider {
    /// Create a provider with a client honouring the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HttpClient`] if the client cannot be built.
    pub fn new(config: AuthConfig) -> Result<Self, ConfigError> {
        let http_client = Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &AuthConfig {
        &self.config
    }

    async fn redeem(&self, code: &str) -> Result<String, AuthError> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];

        let response = self
            .http_client
            .post(&self.config.token_url)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT_HEADER, USER_AGENT)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::ProviderFailure(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            tracing::error!(%status, "GitHub token exchange failed: {}", error_body);
            return Err(AuthError::ProviderFailure(format!(
                "token exchange returned {status}"
            )));
        }

        // GitHub reports refused codes with 200 and an `error` field.
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::ProviderFailure(e.to_string()))?;

        match token {
            TokenResponse {
                access_token: Some(access_token),
                ..
            } => Ok(access_token),
            TokenResponse {
                error: Some(error), ..
            } if error == github::BAD_VERIFICATION_CODE => Err(AuthError::InvalidCode),
            TokenResponse {
                error,
                error_description,
                ..
            } => Err(AuthError::ProviderFailure(
                error_description
                    .or(error)
                    .unwrap_or_else(|| "token response without access token".to_string()),
            )),
        }
    }

    async fn fetch_user(&self, access_token: &str) -> Result<ProviderIdentity, AuthError> {
        let response = self
            .http_client
            .get(&self.config.user_api_url)
            .bearer_auth(access_token)
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT_HEADER, USER_AGENT)
            .send()
            .await
            .map_err(|e| AuthError::ProviderFailure(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            tracing::error!(%status, "GitHub user request failed: {}", error_body);
            return Err(AuthError::ProviderFailure(format!(
                "user lookup returned {status}"
            )));
        }

        let user: GitHubUser = response
            .json()
            .await
            .map_err(|e| AuthError::ProviderFailure(e.to_string()))?;

        Ok(ProviderIdentity {
            login: user.login,
            email: user.email,
        })
    }
}

impl IdentityProvider for GitHubProvider {
    async fn exchange_code(&self, code: &str) -> Result<ProviderIdentity, AuthError> {
        let access_token = self.redeem(code).await?;
        self.fetch_user(&access_token).await
    }
}

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// `GET /user` response.
#[derive(Debug, Deserialize)]
struct GitHubUser {
    login: String,
    email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refused_code_body_parses() {
        let body = r#"{"error":"bad_verification_code","error_description":"The code passed is incorrect or expired."}"#;
        let token: TokenResponse = serde_json::from_str(body).unwrap();
        assert_eq!(token.error.as_deref(), Some(github::BAD_VERIFICATION_CODE));
        assert!(token.access_token.is_none());
    }

    #[test]
    fn user_email_is_optional() {
        let user: GitHubUser = serde_json::from_str(r#"{"login":"alice","id":1}"#).unwrap();
        assert_eq!(user.login, "alice");
        assert_eq!(user.email, None);
    }
}
