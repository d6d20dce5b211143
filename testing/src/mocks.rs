//! Mock implementations for testing.

#![allow(clippy::missing_panics_doc)] // Poisoned test locks panic

use accessgate_core::environment::Clock;
use accessgate_core::{
    AccessRequest, RequestAction, RequestId, RequestScope, RequestStatus, RequestStore, Session,
    StoreError,
};
use accessgate_runtime::{AccessApi, ClientError};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Fixed clock for deterministic tests
///
/// Always returns the same time, making tests reproducible.
///
/// # Example
///
/// ```
/// use accessgate_testing::mocks::FixedClock;
/// use accessgate_core::environment::Clock;
/// use chrono::Utc;
///
/// let clock = FixedClock::new(Utc::now());
/// assert_eq!(clock.now(), clock.now());
/// ```
#[derive(Debug, Clone)]
pub struct FixedClock {
    time: DateTime<Utc>,
}

impl FixedClock {
    /// Create a new fixed clock with the given time
    #[must_use]
    pub const fn new(time: DateTime<Utc>) -> Self {
        Self { time }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.time
    }
}

/// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
#[must_use]
pub fn test_clock() -> FixedClock {
    FixedClock::new(epoch())
}

fn epoch() -> DateTime<Utc> {
    DateTime::from_timestamp(1_735_689_600, 0).unwrap_or_default()
}

/// Clock that moves forward by a fixed step on every reading.
///
/// Gives every record a distinct, predictable timestamp.
#[derive(Debug, Clone)]
pub struct SteppingClock {
    next: Arc<Mutex<DateTime<Utc>>>,
    step: ChronoDuration,
}

impl SteppingClock {
    /// Start at `start`, advancing `step` per reading.
    #[must_use]
    pub fn new(start: DateTime<Utc>, step: ChronoDuration) -> Self {
        Self {
            next: Arc::new(Mutex::new(start)),
            step,
        }
    }

    /// Start at 2025-01-01 00:00:00 UTC, one second per reading.
    #[must_use]
    pub fn per_second() -> Self {
        Self::new(epoch(), ChronoDuration::seconds(1))
    }
}

impl Clock for SteppingClock {
    #[allow(clippy::unwrap_used)] // Test double
    fn now(&self) -> DateTime<Utc> {
        let mut next = self.next.lock().unwrap();
        let now = *next;
        *next = now + self.step;
        now
    }
}

/// One scripted fetch outcome.
#[derive(Debug, Clone)]
struct FetchStep {
    delay: Duration,
    result: Result<Vec<AccessRequest>, ClientError>,
}

#[derive(Debug, Default)]
struct Script {
    fetches: VecDeque<FetchStep>,
    fallback: Vec<AccessRequest>,
    fetch_calls: usize,
    mutation_error: Option<ClientError>,
    submissions: Vec<(String, String)>,
    actions: Vec<(String, RequestId, RequestAction)>,
}

/// [`AccessApi`] answering fetches from a script.
///
/// Scripted outcomes are consumed in order; once the script runs out every
/// fetch returns the fallback list. Delays use Tokio time, so they advance
/// instantly under a paused runtime. Mutations are recorded and succeed
/// unless [`fail_mutations_with`](Self::fail_mutations_with) was called.
///
/// Cloning shares the script.
#[derive(Debug, Clone, Default)]
pub struct ScriptedApi {
    script: Arc<Mutex<Script>>,
}

#[allow(clippy::unwrap_used)] // Test double
impl ScriptedApi {
    /// Empty script, empty fallback.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the list returned once the script is exhausted.
    #[must_use]
    pub fn with_fallback(self, requests: Vec<AccessRequest>) -> Self {
        self.script.lock().unwrap().fallback = requests;
        self
    }

    /// Queue a successful fetch.
    pub fn push_ok(&self, requests: Vec<AccessRequest>) {
        self.push(Duration::ZERO, Ok(requests));
    }

    /// Queue a failed fetch.
    pub fn push_err(&self, error: ClientError) {
        self.push(Duration::ZERO, Err(error));
    }

    /// Queue a fetch that completes after `delay`.
    pub fn push_delayed(&self, delay: Duration, result: Result<Vec<AccessRequest>, ClientError>) {
        self.push(delay, result);
    }

    fn push(&self, delay: Duration, result: Result<Vec<AccessRequest>, ClientError>) {
        self.script
            .lock()
            .unwrap()
            .fetches
            .push_back(FetchStep { delay, result });
    }

    /// Make every later submit and act call fail with `error`.
    pub fn fail_mutations_with(&self, error: ClientError) {
        self.script.lock().unwrap().mutation_error = Some(error);
    }

    /// Number of fetches started so far.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.script.lock().unwrap().fetch_calls
    }

    /// Recorded submissions as `(username, reason)`.
    #[must_use]
    pub fn submissions(&self) -> Vec<(String, String)> {
        self.script.lock().unwrap().submissions.clone()
    }

    /// Recorded admin actions as `(actor, request, action)`.
    #[must_use]
    pub fn actions(&self) -> Vec<(String, RequestId, RequestAction)> {
        self.script.lock().unwrap().actions.clone()
    }

    fn next_fetch(&self) -> FetchStep {
        let mut script = self.script.lock().unwrap();
        script.fetch_calls += 1;
        script.fetches.pop_front().unwrap_or_else(|| FetchStep {
            delay: Duration::ZERO,
            result: Ok(script.fallback.clone()),
        })
    }
}

#[allow(clippy::unwrap_used)] // Test double
impl AccessApi for ScriptedApi {
    async fn fetch_requests(&self, _session: &Session) -> Result<Vec<AccessRequest>, ClientError> {
        let step = self.next_fetch();
        if !step.delay.is_zero() {
            tokio::time::sleep(step.delay).await;
        }
        step.result
    }

    async fn submit(&self, session: &Session, reason: &str) -> Result<String, ClientError> {
        let mut script = self.script.lock().unwrap();
        script
            .submissions
            .push((session.username.clone(), reason.to_string()));
        match &script.mutation_error {
            Some(error) => Err(error.clone()),
            None => Ok(accessgate_core::api::SUBMITTED_MESSAGE.to_string()),
        }
    }

    async fn act(
        &self,
        session: &Session,
        request_id: RequestId,
        action: RequestAction,
    ) -> Result<String, ClientError> {
        let mut script = self.script.lock().unwrap();
        script
            .actions
            .push((session.username.clone(), request_id, action));
        match &script.mutation_error {
            Some(error) => Err(error.clone()),
            None => Ok(accessgate_core::api::action_message(action)),
        }
    }
}

/// Store wrapper that fails a chosen number of operations.
///
/// While failures remain, every operation returns
/// [`StoreError::Unavailable`] without touching the inner store.
#[derive(Debug, Clone)]
pub struct FlakyRequestStore<S> {
    inner: S,
    failures_left: Arc<AtomicUsize>,
}

impl<S> FlakyRequestStore<S> {
    /// Wrap `inner`, initially healthy.
    #[must_use]
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            failures_left: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fail the next `count` operations.
    pub fn fail_next(&self, count: usize) {
        self.failures_left.store(count, Ordering::SeqCst);
    }

    /// Wrapped store.
    #[must_use]
    pub const fn inner(&self) -> &S {
        &self.inner
    }

    fn check(&self) -> Result<(), StoreError> {
        let tripped = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if tripped {
            Err(StoreError::Unavailable("injected outage".to_string()))
        } else {
            Ok(())
        }
    }
}

impl<S: RequestStore> RequestStore for FlakyRequestStore<S> {
    fn insert_unique(
        &self,
        request: AccessRequest,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        let gate = self.check();
        let inner = self.inner.insert_unique(request);
        async move {
            gate?;
            inner.await
        }
    }

    fn get(
        &self,
        request_id: RequestId,
    ) -> impl Future<Output = Result<Option<AccessRequest>, StoreError>> + Send {
        let gate = self.check();
        let inner = self.inner.get(request_id);
        async move {
            gate?;
            inner.await
        }
    }

    fn list(
        &self,
        scope: &RequestScope,
    ) -> impl Future<Output = Result<Vec<AccessRequest>, StoreError>> + Send {
        let gate = self.check();
        let inner = self.inner.list(scope);
        async move {
            gate?;
            inner.await
        }
    }

    fn compare_and_swap(
        &self,
        expected: RequestStatus,
        updated: AccessRequest,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        let gate = self.check();
        let inner = self.inner.compare_and_swap(expected, updated);
        async move {
            gate?;
            inner.await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accessgate_core::TransportError;
    use accessgate_runtime::InMemoryRequestStore;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.now().to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }

    #[test]
    fn stepping_clock_advances_per_reading() {
        let clock = SteppingClock::per_second();
        let first = clock.now();
        let second = clock.now();
        assert_eq!(second - first, ChronoDuration::seconds(1));
    }

    #[tokio::test]
    async fn scripted_api_replays_then_falls_back() {
        let fallback = vec![AccessRequest::new("alice", "r", epoch())];
        let api = ScriptedApi::new().with_fallback(fallback.clone());
        api.push_err(ClientError::Transport(TransportError::Timeout));

        let session = Session::admin("bob");
        assert!(api.fetch_requests(&session).await.is_err());
        assert_eq!(api.fetch_requests(&session).await.unwrap(), fallback);
        assert_eq!(api.fetch_count(), 2);
    }

    #[tokio::test]
    async fn flaky_store_fails_then_recovers() {
        let store = FlakyRequestStore::new(InMemoryRequestStore::new());
        store.fail_next(1);

        let request = AccessRequest::new("alice", "r", epoch());
        assert!(matches!(
            store.insert_unique(request.clone()).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.inner().is_empty().unwrap());

        store.insert_unique(request).await.unwrap();
        assert_eq!(store.inner().len().unwrap(), 1);
    }
}
