//! Application state for Axum handlers.

use accessgate_auth::{ContributorDirectory, IdentityProvider, SessionAuthenticator};
use accessgate_core::{RequestStore, Role, Session};
use accessgate_runtime::LifecycleEngine;
use accessgate_runtime::metrics::MetricsExporter;
use std::sync::Arc;

use crate::error::AppError;

/// State shared by every handler.
///
/// Cloning is cheap; the engine and authenticator are shared.
pub struct AppState<S, P, D> {
    /// Lifecycle engine, the only writer of requests.
    pub engine: Arc<LifecycleEngine<S>>,

    /// Code exchange and contributor directory.
    pub authenticator: Arc<SessionAuthenticator<P, D>>,

    /// Prometheus exporter served on `/metrics`, if installed.
    pub metrics: Option<MetricsExporter>,
}

impl<S, P, D> AppState<S, P, D>
where
    S: RequestStore,
    P: IdentityProvider,
    D: ContributorDirectory,
{
    /// Create state without a metrics exporter.
    #[must_use]
    pub fn new(engine: LifecycleEngine<S>, authenticator: SessionAuthenticator<P, D>) -> Self {
        Self {
            engine: Arc::new(engine),
            authenticator: Arc::new(authenticator),
            metrics: None,
        }
    }

    /// Serve `exporter` on `/metrics`.
    ///
    /// Also registers the authenticator's metric descriptions with the
    /// installed recorder.
    #[must_use]
    pub fn with_metrics(mut self, exporter: MetricsExporter) -> Self {
        accessgate_auth::metrics::register_metrics();
        self.metrics = Some(exporter);
        self
    }

    /// Build the session for `username` from the contributor directory.
    ///
    /// Clients name themselves in request bodies; the role is never taken
    /// from them. When the body also claims a role, it must match.
    ///
    /// # Errors
    ///
    /// - 403 `NOT_A_PROJECT_MEMBER` for unknown usernames
    /// - 403 `FORBIDDEN` if `claimed` differs from the directory's answer
    /// - 502 if the directory cannot be reached
    pub async fn resolve_session(
        &self,
        username: &str,
        claimed: Option<Role>,
    ) -> Result<Session, AppError> {
        let username = username.trim();
        let role = self
            .authenticator
            .directory()
            .role_of(username)
            .await?
            .ok_or_else(|| accessgate_core::AuthError::NotAProjectMember {
                username: username.to_string(),
            })?;

        if let Some(claimed) = claimed.filter(|c| *c != role) {
            tracing::warn!(%username, %claimed, actual = %role, "Role claim mismatch");
            return Err(AppError::forbidden(format!(
                "{username} does not hold the {claimed} role"
            )));
        }

        Ok(Session::new(username, role))
    }
}

impl<S, P, D> Clone for AppState<S, P, D> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            authenticator: Arc::clone(&self.authenticator),
            metrics: self.metrics.clone(),
        }
    }
}
