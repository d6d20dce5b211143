//! Lifecycle engine: the only writer of access requests.
//!
//! Every mutation follows the same path:
//!
//! ```text
//! authorize(session) → read record → compute next (pure) → compare_and_swap
//! ```
//!
//! The compare-and-swap is keyed on the status the next record was computed
//! from, so of two concurrent admins acting on the same `PENDING` request
//! exactly one succeeds and the other observes `InvalidState`. The engine
//! never retries; a [`EngineError::StoreUnavailable`] leaves the stored
//! record untouched and the caller may re-issue the call.

use crate::metrics::{REQUESTS_SUBMITTED, TRANSITIONS};
use accessgate_core::environment::Clock;
use accessgate_core::{
    AccessRequest, EngineError, MAX_REASON_LEN, RequestAction, RequestId, RequestStore, Role,
    Session, TransitionError, ValidationError,
};
use std::sync::Arc;

/// Owns the request state machine and its authorization guards.
pub struct LifecycleEngine<S> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S> LifecycleEngine<S>
where
    S: RequestStore,
{
    /// Create an engine writing through `store`, stamping with `clock`.
    #[must_use]
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Submit a new request for the session's user.
    ///
    /// The reason is trimmed before it is validated and stored.
    ///
    /// # Errors
    ///
    /// - [`TransitionError::Unauthorized`] for admin sessions
    /// - [`ValidationError::EmptyReason`] / [`ValidationError::ReasonTooLong`]
    /// - [`ValidationError::DuplicateRequest`] if the user owns any request,
    ///   whatever its status
    /// - [`EngineError::StoreUnavailable`] if nothing could be written
    #[tracing::instrument(skip(self, reason), fields(username = %session.username))]
    pub async fn submit(
        &self,
        session: &Session,
        reason: &str,
    ) -> Result<AccessRequest, EngineError> {
        let result = self.try_submit(session, reason).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.code(),
        };
        metrics::counter!(REQUESTS_SUBMITTED, "outcome" => outcome).increment(1);

        match &result {
            Ok(request) => {
                tracing::info!(request_id = %request.request_id, "Access request submitted");
            },
            Err(error) => tracing::warn!(%error, "Access request submission refused"),
        }
        result
    }

    async fn try_submit(
        &self,
        session: &Session,
        reason: &str,
    ) -> Result<AccessRequest, EngineError> {
        if session.role != Role::User {
            return Err(TransitionError::Unauthorized {
                username: session.username.clone(),
                attempted: "submit",
            }
            .into());
        }

        let reason = validate_reason(reason)?;
        let request = AccessRequest::new(session.username.clone(), reason, self.clock.now());

        self.store.insert_unique(request.clone()).await?;
        Ok(request)
    }

    /// Approve a `PENDING` request.
    ///
    /// # Errors
    ///
    /// See [`apply`](Self::apply).
    pub async fn approve(
        &self,
        session: &Session,
        request_id: RequestId,
    ) -> Result<AccessRequest, EngineError> {
        self.apply(session, request_id, RequestAction::Approve).await
    }

    /// Reject a `PENDING` request.
    ///
    /// # Errors
    ///
    /// See [`apply`](Self::apply).
    pub async fn reject(
        &self,
        session: &Session,
        request_id: RequestId,
    ) -> Result<AccessRequest, EngineError> {
        self.apply(session, request_id, RequestAction::Reject).await
    }

    /// Revoke an `APPROVED` request.
    ///
    /// # Errors
    ///
    /// See [`apply`](Self::apply).
    pub async fn revoke(
        &self,
        session: &Session,
        request_id: RequestId,
    ) -> Result<AccessRequest, EngineError> {
        self.apply(session, request_id, RequestAction::Revoke).await
    }

    /// Apply an admin action to a request.
    ///
    /// Returns the record as written.
    ///
    /// # Errors
    ///
    /// - [`TransitionError::Unauthorized`] unless the session is an admin
    /// - [`TransitionError::NotFound`] for unknown identifiers
    /// - [`TransitionError::InvalidState`] if the action does not apply to the
    ///   current status, including when a concurrent action won the race
    /// - [`EngineError::StoreUnavailable`] if the store failed; nothing was written
    #[tracing::instrument(skip(self), fields(actor = %session.username))]
    pub async fn apply(
        &self,
        session: &Session,
        request_id: RequestId,
        action: RequestAction,
    ) -> Result<AccessRequest, EngineError> {
        let result = self.try_apply(session, request_id, action).await;
        record_transition(action.as_str(), &result);
        result
    }

    async fn try_apply(
        &self,
        session: &Session,
        request_id: RequestId,
        action: RequestAction,
    ) -> Result<AccessRequest, EngineError> {
        if !session.is_admin() {
            return Err(TransitionError::Unauthorized {
                username: session.username.clone(),
                attempted: action.as_str(),
            }
            .into());
        }

        let current = self.load(request_id).await?;
        let updated = current.transition(action, &session.username, self.clock.now())?;
        self.write(&current, updated, action.as_str()).await
    }

    /// Mark an `APPROVED` grant as exercised.
    ///
    /// Called by the grant consumer, not by an interactive session.
    ///
    /// # Errors
    ///
    /// - [`TransitionError::NotFound`] for unknown identifiers
    /// - [`TransitionError::InvalidState`] unless the request is `APPROVED`
    /// - [`EngineError::StoreUnavailable`] if the store failed
    #[tracing::instrument(skip(self))]
    pub async fn consume(&self, request_id: RequestId) -> Result<AccessRequest, EngineError> {
        let result = self.try_consume(request_id).await;
        record_transition("consume", &result);
        result
    }

    async fn try_consume(&self, request_id: RequestId) -> Result<AccessRequest, EngineError> {
        let current = self.load(request_id).await?;
        let updated = current.consume(self.clock.now())?;
        self.write(&current, updated, "consume").await
    }

    /// Requests visible to `session`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::StoreUnavailable`] if the store cannot be read.
    pub async fn list_visible(&self, session: &Session) -> Result<Vec<AccessRequest>, EngineError> {
        let scope = session.scope();
        let mut requests = scope.filter(self.store.list(&scope).await?);
        requests.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.request_id.cmp(&b.request_id))
        });
        Ok(requests)
    }

    async fn load(&self, request_id: RequestId) -> Result<AccessRequest, EngineError> {
        self.store
            .get(request_id)
            .await?
            .ok_or_else(|| TransitionError::NotFound(request_id).into())
    }

    async fn write(
        &self,
        current: &AccessRequest,
        updated: AccessRequest,
        attempted: &'static str,
    ) -> Result<AccessRequest, EngineError> {
        match self
            .store
            .compare_and_swap(current.status, updated.clone())
            .await
        {
            Ok(()) => {
                tracing::info!(
                    request_id = %updated.request_id,
                    from = %current.status,
                    to = %updated.status,
                    "Access request transitioned"
                );
                Ok(updated)
            },
            Err(accessgate_core::StoreError::StaleState {
                request_id, actual, ..
            }) => Err(TransitionError::InvalidState {
                request_id,
                status: actual,
                attempted,
            }
            .into()),
            Err(other) => Err(other.into()),
        }
    }
}

fn validate_reason(reason: &str) -> Result<String, ValidationError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(ValidationError::EmptyReason);
    }
    if reason.chars().count() > MAX_REASON_LEN {
        return Err(ValidationError::ReasonTooLong {
            max: MAX_REASON_LEN,
        });
    }
    Ok(reason.to_string())
}

fn record_transition(action: &'static str, result: &Result<AccessRequest, EngineError>) {
    let outcome = match result {
        Ok(_) => "success",
        Err(e) => e.code(),
    };
    metrics::counter!(TRANSITIONS, "action" => action, "outcome" => outcome).increment(1);

    if let Err(error) = result {
        tracing::warn!(action, %error, "Access request transition refused");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::InMemoryRequestStore;
    use accessgate_core::environment::SystemClock;
    use accessgate_core::RequestStatus;

    fn engine() -> LifecycleEngine<InMemoryRequestStore> {
        LifecycleEngine::new(InMemoryRequestStore::new(), Arc::new(SystemClock))
    }

    #[tokio::test]
    async fn submit_trims_reason() {
        let engine = engine();
        let request = engine
            .submit(&Session::user("alice"), "  needs access \n")
            .await
            .unwrap();
        assert_eq!(request.reason, "needs access");
        assert_eq!(request.status, RequestStatus::Pending);
    }

    #[tokio::test]
    async fn blank_reason_is_rejected() {
        let err = engine()
            .submit(&Session::user("alice"), "   ")
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::Validation(ValidationError::EmptyReason));
    }

    #[tokio::test]
    async fn overlong_reason_is_rejected() {
        let reason = "x".repeat(MAX_REASON_LEN + 1);
        let err = engine()
            .submit(&Session::user("alice"), &reason)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "REASON_TOO_LONG");
    }

    #[tokio::test]
    async fn admins_do_not_submit() {
        let err = engine()
            .submit(&Session::admin("bob"), "reason")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn users_cannot_approve() {
        let engine = engine();
        let request = engine.submit(&Session::user("alice"), "r").await.unwrap();

        let err = engine
            .approve(&Session::user("alice"), request.request_id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Transition(TransitionError::Unauthorized { .. })
        ));

        let stored = engine.store().get(request.request_id).await.unwrap().unwrap();
        assert_eq!(stored.status, RequestStatus::Pending);
    }

    #[tokio::test]
    async fn unknown_request_is_not_found() {
        let id = RequestId::new();
        let err = engine()
            .reject(&Session::admin("bob"), id)
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::Transition(TransitionError::NotFound(id)));
    }

    #[tokio::test]
    async fn list_visible_is_role_scoped() {
        let engine = engine();
        engine.submit(&Session::user("alice"), "a").await.unwrap();
        engine.submit(&Session::user("dave"), "d").await.unwrap();

        assert_eq!(
            engine
                .list_visible(&Session::admin("bob"))
                .await
                .unwrap()
                .len(),
            2
        );
        let own = engine.list_visible(&Session::user("dave")).await.unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].username, "dave");
    }
}
