//! Polling driver for [`SyncReducer`](crate::sync::SyncReducer).
//!
//! A poller is a spawned task that owns its [`SyncState`]. Ticks from a
//! [`tokio::time::interval`] and actions sent through the [`PollerHandle`]
//! are fed to the reducer one at a time; effects are spawned and their
//! resulting actions come back through the same channel. Every state
//! change is published on a `watch` channel.
//!
//! # Example
//!
//! ```rust,no_run
//! # use accessgate_runtime::{EngineApi, InMemoryRequestStore, LifecycleEngine};
//! # use accessgate_runtime::poller::{PollConfig, SyncPoller};
//! # use accessgate_core::{Session, environment::SystemClock};
//! # use std::sync::Arc;
//! # async fn example() {
//! let engine = Arc::new(LifecycleEngine::new(InMemoryRequestStore::new(), Arc::new(SystemClock)));
//! let api = Arc::new(EngineApi::new(engine));
//!
//! let poller = SyncPoller::start(api, Session::admin("bob"), PollConfig::default(), Arc::new(SystemClock));
//! let loaded = poller.wait_for(|s| s.snapshot.is_some()).await;
//! poller.stop().await;
//! # }
//! ```

use crate::client::AccessApi;
use crate::sync::{SyncAction, SyncEnvironment, SyncReducer, SyncState};
use accessgate_core::Session;
use accessgate_core::effect::Effect;
use accessgate_core::environment::Clock;
use accessgate_core::reducer::Reducer;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Poller timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    interval: Duration,
}

impl PollConfig {
    /// Interval used when none is configured.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

    /// Shortest interval accepted; shorter values are raised to it.
    pub const MIN_INTERVAL: Duration = Duration::from_millis(100);

    /// Poll every `interval`, but no more often than [`Self::MIN_INTERVAL`].
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Self::MIN_INTERVAL),
        }
    }

    /// Configured interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INTERVAL)
    }
}

/// The poller task is no longer running.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("poller has stopped")]
pub struct PollerStopped;

/// Starts pollers.
#[derive(Debug, Clone, Copy)]
pub struct SyncPoller;

impl SyncPoller {
    /// Spawn a poller fetching through `api` on behalf of `session`.
    ///
    /// The first fetch is issued immediately. Must be called from within a
    /// Tokio runtime.
    #[must_use]
    pub fn start<A>(
        api: Arc<A>,
        session: Session,
        config: PollConfig,
        clock: Arc<dyn Clock>,
    ) -> PollerHandle
    where
        A: AccessApi,
    {
        let (actions, inbox) = mpsc::unbounded_channel();
        let (publisher, view) = watch::channel(SyncState::default());
        let env = SyncEnvironment::new(api, session, clock);

        let task = tokio::spawn(run_loop(env, config, inbox, actions.clone(), publisher));

        PollerHandle {
            actions,
            view,
            task: Some(task),
        }
    }
}

async fn run_loop<A: AccessApi>(
    env: SyncEnvironment<A>,
    config: PollConfig,
    mut inbox: mpsc::UnboundedReceiver<SyncAction>,
    feedback: mpsc::UnboundedSender<SyncAction>,
    publisher: watch::Sender<SyncState>,
) {
    let reducer = SyncReducer::<A>::new();
    let mut state = SyncState::default();

    let mut ticker = tokio::time::interval(config.interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::debug!(
        username = %env.session.username,
        interval_ms = config.interval().as_millis(),
        "Poller started"
    );

    loop {
        let action = tokio::select! {
            biased;
            received = inbox.recv() => received.unwrap_or(SyncAction::Stop),
            _ = ticker.tick() => SyncAction::Tick,
        };
        let stopping = matches!(action, SyncAction::Stop);

        let effects = reducer.reduce(&mut state, action, &env);
        publisher.send_replace(state.clone());

        for effect in effects {
            execute_effect(effect, feedback.clone());
        }

        if stopping {
            break;
        }
    }
}

fn execute_effect(effect: Effect<SyncAction>, feedback: mpsc::UnboundedSender<SyncAction>) {
    match effect {
        Effect::None => {},
        Effect::Future(fut) => {
            tokio::spawn(async move {
                if let Some(action) = fut.await {
                    // The poller may have stopped meanwhile; its inbox is then closed.
                    let _ = feedback.send(action);
                }
            });
        },
    }
}

/// Handle to a running poller.
///
/// Dropping the handle stops the poller. [`stop`](Self::stop) does the same
/// and waits for the task to finish.
#[derive(Debug)]
pub struct PollerHandle {
    actions: mpsc::UnboundedSender<SyncAction>,
    view: watch::Receiver<SyncState>,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Fetch now instead of at the next tick.
    ///
    /// If a fetch is in flight, another one is issued as soon as it
    /// completes. No-op once the poller has stopped.
    pub fn trigger_immediate_refresh(&self) {
        let _ = self.actions.send(SyncAction::RefreshRequested);
    }

    /// Latest published state.
    #[must_use]
    pub fn current(&self) -> SyncState {
        self.view.borrow().clone()
    }

    /// Receiver notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.view.clone()
    }

    /// Wait until the published state satisfies `predicate`.
    ///
    /// # Errors
    ///
    /// Returns [`PollerStopped`] if the poller stops first.
    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&SyncState) -> bool,
    ) -> Result<SyncState, PollerStopped> {
        let mut view = self.view.clone();
        let state = view
            .wait_for(|state| predicate(state))
            .await
            .map_err(|_| PollerStopped)?
            .clone();
        Ok(state)
    }

    /// Whether the poller task is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop polling and wait for the task to exit.
    ///
    /// A fetch still in flight is left to finish; its result is discarded.
    pub async fn stop(mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        let _ = self.actions.send(SyncAction::Stop);
        if let Err(error) = task.await {
            tracing::error!(%error, "Poller task ended abnormally");
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        if self.task.take().is_some() {
            let _ = self.actions.send(SyncAction::Stop);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_has_a_floor() {
        assert_eq!(
            PollConfig::new(Duration::from_millis(5)).interval(),
            PollConfig::MIN_INTERVAL
        );
        assert_eq!(
            PollConfig::new(Duration::from_secs(3)).interval(),
            Duration::from_secs(3)
        );
    }

    #[test]
    fn default_interval_is_ten_seconds() {
        assert_eq!(PollConfig::default().interval(), Duration::from_secs(10));
    }
}
