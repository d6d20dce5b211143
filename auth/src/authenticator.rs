//! Session authenticator: one-time code in, role-bearing session out.
//!
//! ```text
//! code ─▶ ledger (reject replay) ─▶ IdentityProvider ─▶ ContributorDirectory ─▶ Session
//! ```
//!
//! A code is recorded as consumed before it is sent to the provider, so two
//! concurrent exchanges of the same code cannot both reach it. The ledger
//! forgets codes after the configured retention, by which time the provider
//! has expired them anyway.

use crate::metrics::CODE_EXCHANGES;
use crate::providers::{ContributorDirectory, IdentityProvider};
use accessgate_core::environment::Clock;
use accessgate_core::{AuthError, DateTime, Session, Utc};
use chrono::Duration;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Exchanges authorization codes for sessions.
///
/// Never writes to the request store.
pub struct SessionAuthenticator<P, D> {
    provider: P,
    directory: D,
    clock: Arc<dyn Clock>,
    retention: Duration,
    consumed: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl<P, D> SessionAuthenticator<P, D>
where
    P: IdentityProvider,
    D: ContributorDirectory,
{
    /// Create an authenticator remembering consumed codes for `retention`.
    #[must_use]
    pub fn new(provider: P, directory: D, clock: Arc<dyn Clock>, retention: Duration) -> Self {
        Self {
            provider,
            directory,
            clock,
            retention,
            consumed: Mutex::new(HashMap::new()),
        }
    }

    /// Identity provider in use.
    #[must_use]
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// Contributor directory in use.
    #[must_use]
    pub const fn directory(&self) -> &D {
        &self.directory
    }

    /// Exchange a one-time authorization code for a session.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidCode`] for empty, refused or already used codes
    /// - [`AuthError::NotAProjectMember`] if the identity has no role
    /// - [`AuthError::ProviderFailure`] for provider or directory failures
    #[tracing::instrument(skip(self, code))]
    pub async fn exchange_code(&self, code: &str) -> Result<Session, AuthError> {
        let result = self.try_exchange(code.trim()).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.code(),
        };
        metrics::counter!(CODE_EXCHANGES, "outcome" => outcome).increment(1);

        match &result {
            Ok(session) => tracing::info!(
                username = %session.username,
                role = %session.role,
                "Session established"
            ),
            Err(error) => tracing::warn!(%error, "Code exchange refused"),
        }
        result
    }

    async fn try_exchange(&self, code: &str) -> Result<Session, AuthError> {
        if code.is_empty() {
            return Err(AuthError::InvalidCode);
        }
        self.consume(code)?;

        let identity = self.provider.exchange_code(code).await?;
        let role = self
            .directory
            .role_of(&identity.login)
            .await?
            .ok_or_else(|| AuthError::NotAProjectMember {
                username: identity.login.clone(),
            })?;

        Ok(Session::new(identity.login, role))
    }

    /// Record `code` as consumed, refusing it if it already was.
    fn consume(&self, code: &str) -> Result<(), AuthError> {
        let now = self.clock.now();
        let mut consumed = self
            .consumed
            .lock()
            .map_err(|_| AuthError::ProviderFailure("code ledger poisoned".to_string()))?;

        consumed.retain(|_, at| now.signed_duration_since(*at) < self.retention);

        if consumed.contains_key(code) {
            tracing::warn!("Authorization code replayed");
            return Err(AuthError::InvalidCode);
        }
        consumed.insert(code.to_string(), now);
        Ok(())
    }
}

impl<P, D> std::fmt::Debug for SessionAuthenticator<P, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionAuthenticator")
            .field("retention", &self.retention)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::MockIdentityProvider;
    use crate::providers::StaticDirectory;
    use accessgate_core::Role;
    use accessgate_core::environment::SystemClock;

    fn authenticator(
        provider: MockIdentityProvider,
    ) -> SessionAuthenticator<MockIdentityProvider, StaticDirectory> {
        SessionAuthenticator::new(
            provider,
            StaticDirectory::new()
                .with_admin("bob")
                .with_contributor("alice"),
            Arc::new(SystemClock),
            Duration::minutes(10),
        )
    }

    #[tokio::test]
    async fn blank_code_never_reaches_provider() {
        let provider = MockIdentityProvider::new();
        let auth = authenticator(provider.clone());

        assert_eq!(auth.exchange_code("  ").await, Err(AuthError::InvalidCode));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn role_comes_from_directory() {
        let provider = MockIdentityProvider::new()
            .with_code("c1", "bob")
            .with_code("c2", "alice");
        let auth = authenticator(provider);

        assert_eq!(
            auth.exchange_code("c1").await.unwrap().role,
            Role::Admin
        );
        assert_eq!(auth.exchange_code("c2").await.unwrap().role, Role::User);
    }

    #[tokio::test]
    async fn provider_login_case_is_canonicalised() {
        let provider = MockIdentityProvider::new().with_code("c1", "Alice");
        let auth = authenticator(provider);

        let session = auth.exchange_code("c1").await.unwrap();
        assert_eq!(session.username, "alice");
        assert_eq!(session.role, Role::User);
    }

    #[tokio::test]
    async fn provider_refusal_consumes_code() {
        let provider = MockIdentityProvider::new();
        let auth = authenticator(provider.clone());

        assert_eq!(auth.exchange_code("bogus").await, Err(AuthError::InvalidCode));
        assert_eq!(auth.exchange_code("bogus").await, Err(AuthError::InvalidCode));
        assert_eq!(provider.calls(), 1);
    }
}
