//! Pure reconciliation logic of a sync poller.
//!
//! The poller's decisions live in [`SyncReducer`], so they can be tested
//! without timers. The rules:
//!
//! - At most one fetch is in flight. A tick that arrives meanwhile is
//!   skipped, not queued.
//! - A refresh request that arrives meanwhile is remembered and issued as
//!   soon as the in-flight fetch completes, so a mutation is followed by a
//!   fetch that started after it.
//! - A successful fetch replaces the snapshot wholesale.
//! - A failed fetch keeps the previous snapshot and raises a transient
//!   error flag. With no snapshot yet, it is a load failure instead.
//! - After `Stop`, completions are discarded.

use crate::client::{AccessApi, ClientError};
use crate::metrics::{POLL_TICKS, POLL_TICKS_SKIPPED};
use accessgate_core::effect::Effect;
use accessgate_core::environment::Clock;
use accessgate_core::reducer::Reducer;
use accessgate_core::{AccessRequest, DateTime, Session, SmallVec, Utc, smallvec};
use std::marker::PhantomData;
use std::sync::Arc;

/// Requests as of one successful fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Visible requests, exactly as fetched.
    pub requests: Vec<AccessRequest>,
    /// Sequence number of the fetch that produced this snapshot.
    pub tick: u64,
    /// When the fetch completed.
    pub fetched_at: DateTime<Utc>,
}

/// Display-level summary of a [`SyncState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// Nothing fetched yet.
    Loading,
    /// Showing a snapshot from the latest fetch.
    Ready,
    /// Showing an older snapshot; the latest fetch failed.
    Degraded,
    /// The first load failed; there is nothing to show.
    Failed,
}

/// State of one poller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncState {
    /// Last good snapshot.
    pub snapshot: Option<Snapshot>,
    /// Sequence number of the fetch in flight, if any.
    pub in_flight: Option<u64>,
    /// Sequence number given to the most recently started fetch.
    pub last_started: u64,
    /// A refresh arrived while a fetch was in flight.
    pub refresh_pending: bool,
    /// Failure of the latest fetch while a snapshot is shown.
    pub transient_error: Option<ClientError>,
    /// Failure of the latest fetch while nothing has loaded yet.
    pub load_error: Option<ClientError>,
    /// Ticks dropped because a fetch was in flight.
    pub skipped_ticks: u64,
    /// The poller has been stopped.
    pub stopped: bool,
}

impl SyncState {
    /// Display-level summary.
    #[must_use]
    pub fn status(&self) -> SyncStatus {
        match (&self.snapshot, &self.transient_error, &self.load_error) {
            (Some(_), None, _) => SyncStatus::Ready,
            (Some(_), Some(_), _) => SyncStatus::Degraded,
            (None, _, Some(_)) => SyncStatus::Failed,
            (None, _, None) => SyncStatus::Loading,
        }
    }

    /// Requests of the current snapshot, empty before the first load.
    #[must_use]
    pub fn requests(&self) -> &[AccessRequest] {
        self.snapshot.as_ref().map_or(&[], |s| s.requests.as_slice())
    }

    /// Sequence number of the current snapshot.
    #[must_use]
    pub fn snapshot_tick(&self) -> Option<u64> {
        self.snapshot.as_ref().map(|s| s.tick)
    }
}

/// Inputs of the sync reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    /// The interval timer fired.
    Tick,
    /// A mutation completed; fetch as soon as possible.
    RefreshRequested,
    /// A fetch finished.
    FetchCompleted {
        /// Sequence number assigned when the fetch started
        tick: u64,
        /// Fetched requests or the failure
        result: Result<Vec<AccessRequest>, ClientError>,
    },
    /// The view is being torn down.
    Stop,
}

/// Dependencies of the sync reducer.
pub struct SyncEnvironment<A> {
    /// Where requests are fetched from.
    pub api: Arc<A>,
    /// Session the poller fetches for.
    pub session: Session,
    /// Clock for snapshot timestamps.
    pub clock: Arc<dyn Clock>,
}

impl<A> SyncEnvironment<A> {
    /// Creates a sync environment.
    #[must_use]
    pub fn new(api: Arc<A>, session: Session, clock: Arc<dyn Clock>) -> Self {
        Self {
            api,
            session,
            clock,
        }
    }
}

impl<A> Clone for SyncEnvironment<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            session: self.session.clone(),
            clock: Arc::clone(&self.clock),
        }
    }
}

/// Reducer deciding when to fetch and how to apply results.
///
/// Generic over the API it fetches through.
#[derive(Debug)]
pub struct SyncReducer<A> {
    _api: PhantomData<fn() -> A>,
}

impl<A> SyncReducer<A> {
    /// Creates a `SyncReducer`.
    #[must_use]
    pub const fn new() -> Self {
        Self { _api: PhantomData }
    }
}

impl<A> Default for SyncReducer<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Clone for SyncReducer<A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A> Copy for SyncReducer<A> {}

impl<A: AccessApi> SyncReducer<A> {
    fn start_fetch(
        state: &mut SyncState,
        env: &SyncEnvironment<A>,
    ) -> Effect<SyncAction> {
        state.last_started += 1;
        let tick = state.last_started;
        state.in_flight = Some(tick);

        let api = Arc::clone(&env.api);
        let session = env.session.clone();
        Effect::future(async move {
            let result = api.fetch_requests(&session).await;
            Some(SyncAction::FetchCompleted { tick, result })
        })
    }

    fn apply_result(
        state: &mut SyncState,
        tick: u64,
        result: Result<Vec<AccessRequest>, ClientError>,
        session: &Session,
        now: DateTime<Utc>,
    ) {
        match result {
            Ok(requests) => {
                state.snapshot = Some(Snapshot {
                    requests: session.scope().filter(requests),
                    tick,
                    fetched_at: now,
                });
                state.transient_error = None;
                state.load_error = None;
                metrics::counter!(POLL_TICKS, "outcome" => "success").increment(1);
            },
            Err(error) if state.snapshot.is_some() => {
                tracing::warn!(tick, %error, "Poll failed, keeping previous snapshot");
                state.transient_error = Some(error);
                metrics::counter!(POLL_TICKS, "outcome" => "transient_error").increment(1);
            },
            Err(error) => {
                tracing::error!(tick, %error, "Initial load failed");
                state.load_error = Some(error);
                metrics::counter!(POLL_TICKS, "outcome" => "fatal_error").increment(1);
            },
        }
    }
}

impl<A> Reducer for SyncReducer<A>
where
    A: AccessApi,
{
    type State = SyncState;
    type Action = SyncAction;
    type Environment = SyncEnvironment<A>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        if state.stopped {
            if let SyncAction::FetchCompleted { tick, .. } = action {
                tracing::debug!(tick, "Discarding fetch completed after stop");
                metrics::counter!(POLL_TICKS, "outcome" => "discarded").increment(1);
            }
            return SmallVec::new();
        }

        match action {
            SyncAction::Tick => {
                if let Some(in_flight) = state.in_flight {
                    state.skipped_ticks += 1;
                    tracing::debug!(in_flight, "Skipping tick, fetch still in flight");
                    metrics::counter!(POLL_TICKS_SKIPPED).increment(1);
                    return SmallVec::new();
                }
                smallvec![Self::start_fetch(state, env)]
            },

            SyncAction::RefreshRequested => {
                if state.in_flight.is_some() {
                    state.refresh_pending = true;
                    return SmallVec::new();
                }
                smallvec![Self::start_fetch(state, env)]
            },

            SyncAction::FetchCompleted { tick, result } => {
                if state.in_flight != Some(tick) {
                    tracing::debug!(tick, "Ignoring completion of unknown fetch");
                    return SmallVec::new();
                }
                state.in_flight = None;
                Self::apply_result(state, tick, result, &env.session, env.clock.now());

                if state.refresh_pending {
                    state.refresh_pending = false;
                    return smallvec![Self::start_fetch(state, env)];
                }
                SmallVec::new()
            },

            SyncAction::Stop => {
                state.stopped = true;
                state.refresh_pending = false;
                tracing::debug!(username = %env.session.username, "Poller stopped");
                SmallVec::new()
            },
        }
    }
}
