//! Session context: the explicit, lifecycle-managed holder of the current
//! session.
//!
//! A context starts empty, gains a session on successful login and loses it
//! on logout. Nothing is persisted; a new process starts logged out.

use crate::authenticator::SessionAuthenticator;
use crate::providers::{ContributorDirectory, IdentityProvider};
use accessgate_core::{AuthError, Session};

/// Holds at most one authenticated session.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    current: Option<Session>,
}

impl SessionContext {
    /// Logged-out context.
    #[must_use]
    pub const fn new() -> Self {
        Self { current: None }
    }

    /// Exchange `code` and, on success, replace the current session.
    ///
    /// On failure the current session, if any, is left in place.
    ///
    /// # Errors
    ///
    /// Returns the authenticator's error unchanged.
    pub async fn login<P, D>(
        &mut self,
        authenticator: &SessionAuthenticator<P, D>,
        code: &str,
    ) -> Result<&Session, AuthError>
    where
        P: IdentityProvider,
        D: ContributorDirectory,
    {
        let session = authenticator.exchange_code(code).await?;
        if let Some(previous) = &self.current {
            tracing::debug!(previous = %previous.username, "Replacing session");
        }
        let session: &Session = self.current.insert(session);
        Ok(session)
    }

    /// Destroy the current session, returning it.
    pub fn logout(&mut self) -> Option<Session> {
        let session = self.current.take();
        if let Some(session) = &session {
            tracing::info!(username = %session.username, "Session ended");
        }
        session
    }

    /// Current session.
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    /// Whether a session is held.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }
}
