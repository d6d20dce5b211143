//! Client-side access to the request service.
//!
//! [`AccessApi`] is the seam between a client view and wherever the
//! lifecycle engine lives: [`EngineApi`] calls an in-process engine, and the
//! web crate provides an HTTP implementation of the same trait.
//!
//! [`ClientView`] is what an admin or user screen holds for the lifetime of
//! a session: a running poller plus the mutating actions, each followed by
//! an immediate refresh.

use crate::engine::LifecycleEngine;
use crate::poller::{PollConfig, PollerHandle, SyncPoller};
use crate::sync::SyncState;
use accessgate_core::api::{SUBMITTED_MESSAGE, action_message};
use accessgate_core::environment::Clock;
use accessgate_core::{
    AccessRequest, EngineError, RequestAction, RequestId, RequestStatus, RequestStore, Role,
    Session, TransportError,
};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// Failure of a call made through an [`AccessApi`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The service could not be reached or answered unintelligibly.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The service refused the call.
    #[error("{message}")]
    Rejected {
        /// Machine-readable code, e.g. `DUPLICATE_REQUEST`
        code: String,
        /// Message for the actor
        message: String,
    },
}

impl ClientError {
    /// Machine-readable code; `TRANSPORT` for transport failures.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Transport(_) => "TRANSPORT",
            Self::Rejected { code, .. } => code,
        }
    }
}

impl From<EngineError> for ClientError {
    fn from(err: EngineError) -> Self {
        Self::Rejected {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

/// Operations a client view performs against the request service.
pub trait AccessApi: Send + Sync + 'static {
    /// Fetch the requests visible to `session`.
    ///
    /// # Errors
    ///
    /// Returns error if the service is unreachable or refuses the call.
    fn fetch_requests(
        &self,
        session: &Session,
    ) -> impl Future<Output = Result<Vec<AccessRequest>, ClientError>> + Send;

    /// Submit a request for `session`'s user. Returns the confirmation message.
    ///
    /// # Errors
    ///
    /// Returns error if the service is unreachable or refuses the submission.
    fn submit(
        &self,
        session: &Session,
        reason: &str,
    ) -> impl Future<Output = Result<String, ClientError>> + Send;

    /// Apply an admin action. Returns the confirmation message.
    ///
    /// # Errors
    ///
    /// Returns error if the service is unreachable or refuses the transition.
    fn act(
        &self,
        session: &Session,
        request_id: RequestId,
        action: RequestAction,
    ) -> impl Future<Output = Result<String, ClientError>> + Send;
}

/// [`AccessApi`] over an in-process engine.
pub struct EngineApi<S> {
    engine: Arc<LifecycleEngine<S>>,
}

impl<S> EngineApi<S> {
    /// Wrap a shared engine.
    #[must_use]
    pub const fn new(engine: Arc<LifecycleEngine<S>>) -> Self {
        Self { engine }
    }
}

impl<S> Clone for EngineApi<S> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<S> AccessApi for EngineApi<S>
where
    S: RequestStore + 'static,
{
    async fn fetch_requests(&self, session: &Session) -> Result<Vec<AccessRequest>, ClientError> {
        Ok(self.engine.list_visible(session).await?)
    }

    async fn submit(&self, session: &Session, reason: &str) -> Result<String, ClientError> {
        self.engine.submit(session, reason).await?;
        Ok(SUBMITTED_MESSAGE.to_string())
    }

    async fn act(
        &self,
        session: &Session,
        request_id: RequestId,
        action: RequestAction,
    ) -> Result<String, ClientError> {
        self.engine.apply(session, request_id, action).await?;
        Ok(action_message(action))
    }
}

/// A live, role-scoped view of the request service for one session.
///
/// Dropping the view stops its poller.
pub struct ClientView<A> {
    session: Session,
    api: Arc<A>,
    poller: PollerHandle,
}

impl<A> ClientView<A>
where
    A: AccessApi,
{
    /// Start polling on behalf of `session`.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn open(session: Session, api: Arc<A>, config: PollConfig, clock: Arc<dyn Clock>) -> Self {
        let poller = SyncPoller::start(Arc::clone(&api), session.clone(), config, clock);
        Self {
            session,
            api,
            poller,
        }
    }

    /// Session this view acts for.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Poller driving this view.
    #[must_use]
    pub const fn poller(&self) -> &PollerHandle {
        &self.poller
    }

    /// Current sync state.
    #[must_use]
    pub fn state(&self) -> SyncState {
        self.poller.current()
    }

    /// Requests in the current snapshot with the given status.
    #[must_use]
    pub fn with_status(&self, status: RequestStatus) -> Vec<AccessRequest> {
        self.state()
            .requests()
            .iter()
            .filter(|r| r.status == status)
            .cloned()
            .collect()
    }

    /// Requests awaiting a decision.
    #[must_use]
    pub fn pending(&self) -> Vec<AccessRequest> {
        self.with_status(RequestStatus::Pending)
    }

    /// Currently granted requests.
    #[must_use]
    pub fn approved(&self) -> Vec<AccessRequest> {
        self.with_status(RequestStatus::Approved)
    }

    /// Whether a user may submit: loaded, and no request of theirs is visible.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        let state = self.state();
        self.session.role == Role::User
            && state.snapshot.as_ref().is_some_and(|s| s.requests.is_empty())
    }

    /// Submit a request, then refresh.
    ///
    /// # Errors
    ///
    /// Returns the service's refusal or the transport failure verbatim.
    pub async fn submit(&self, reason: &str) -> Result<String, ClientError> {
        let result = self.api.submit(&self.session, reason).await;
        self.poller.trigger_immediate_refresh();
        result
    }

    /// Approve a request, then refresh.
    ///
    /// # Errors
    ///
    /// Returns the service's refusal or the transport failure verbatim.
    pub async fn approve(&self, request_id: RequestId) -> Result<String, ClientError> {
        self.act(request_id, RequestAction::Approve).await
    }

    /// Reject a request, then refresh.
    ///
    /// # Errors
    ///
    /// Returns the service's refusal or the transport failure verbatim.
    pub async fn reject(&self, request_id: RequestId) -> Result<String, ClientError> {
        self.act(request_id, RequestAction::Reject).await
    }

    /// Revoke a request, then refresh.
    ///
    /// # Errors
    ///
    /// Returns the service's refusal or the transport failure verbatim.
    pub async fn revoke(&self, request_id: RequestId) -> Result<String, ClientError> {
        self.act(request_id, RequestAction::Revoke).await
    }

    async fn act(&self, request_id: RequestId, action: RequestAction) -> Result<String, ClientError> {
        let result = self.api.act(&self.session, request_id, action).await;
        self.poller.trigger_immediate_refresh();
        result
    }

    /// Tear the view down, stopping its poller.
    pub async fn close(self) {
        self.poller.stop().await;
    }
}
