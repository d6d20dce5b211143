//! # Accessgate Core
//!
//! Domain types and contracts for time-limited contributor access.
//!
//! A contributor authenticates through an external identity provider,
//! submits a single access request with a justification, and an
//! administrator approves, rejects, or later revokes it. This crate holds
//! everything that is shared by the engine, the pollers and the HTTP
//! surface:
//!
//! - **Session**: who is acting, and in which role
//! - **`AccessRequest`**: the record and its status state machine
//! - **`RequestStore`**: the narrow storage contract the engine writes through
//! - **Errors**: one enum per failure family
//! - **Wire contracts**: JSON bodies exchanged with clients
//! - **Reducer / Effect**: the pure-core abstraction the sync poller is built on
//!
//! ## State machine
//!
//! ```text
//!            approve            revoke
//! PENDING ───────────▶ APPROVED ───────▶ REVOKED
//!    │                    │
//!    │ reject             │ consume (grant exercised)
//!    ▼                    ▼
//! REJECTED               USED
//! ```
//!
//! `REJECTED`, `REVOKED` and `USED` are terminal.
//!
//! ## Example
//!
//! ```
//! use accessgate_core::{AccessRequest, RequestAction, RequestStatus};
//! use chrono::Utc;
//!
//! let request = AccessRequest::new("alice", "needs access", Utc::now());
//! let approved = request.transition(RequestAction::Approve, "bob", Utc::now())?;
//! assert_eq!(approved.status, RequestStatus::Approved);
//! assert_eq!(approved.approved_by.as_deref(), Some("bob"));
//! # Ok::<(), accessgate_core::TransitionError>(())
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{SmallVec, smallvec};

pub mod api;
pub mod error;
pub mod request;
pub mod session;
pub mod store;

pub use error::{
    AuthError, EngineError, StoreError, TransitionError, TransportError, ValidationError,
};
pub use request::{AccessRequest, MAX_REASON_LEN, RequestAction, RequestId, RequestStatus};
pub use session::{RequestScope, Role, Session, canonical_username};
pub use store::RequestStore;

/// Reducer module - the pure-core abstraction.
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`.
/// They hold all decision logic and are deterministic and testable without
/// a runtime.
pub mod reducer {
    use super::SmallVec;
    use super::effect::Effect;

    /// The Reducer trait.
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    ///
    /// # Example
    ///
    /// ```ignore
    /// impl Reducer for SyncReducer {
    ///     type State = SyncState;
    ///     type Action = SyncAction;
    ///     type Environment = SyncEnvironment<A>;
    ///
    ///     fn reduce(
    ///         &self,
    ///         state: &mut SyncState,
    ///         action: SyncAction,
    ///         env: &SyncEnvironment<A>,
    ///     ) -> SmallVec<[Effect<SyncAction>; 4]> {
    ///         match action {
    ///             SyncAction::Tick => { /* start a fetch */ }
    ///             _ => SmallVec::new(),
    ///         }
    ///     }
    /// }
    /// ```
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects.
        ///
        /// 1. Validates the action against the current state
        /// 2. Updates state in place
        /// 3. Returns effect descriptions for the runtime to execute
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - side effect descriptions.
///
/// Effects are values returned by reducers, executed by a runtime.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;

    /// Effect type - describes a side effect to be executed.
    ///
    /// Effects are NOT executed immediately. The runtime that owns the
    /// reducer executes them and feeds any produced action back in.
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Arbitrary async computation.
        ///
        /// If it resolves to `Some(action)`, the action is fed back into the reducer.
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Wrap an async computation into an effect.
        pub fn future<F>(fut: F) -> Self
        where
            F: Future<Output = Option<Action>> + Send + 'static,
        {
            Effect::Future(Box::pin(fut))
        }

        /// Returns `true` for `Effect::None`.
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }
    }
}

/// Environment module - dependency injection traits.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time so request timestamps are testable.
    ///
    /// # Examples
    ///
    /// ```
    /// use accessgate_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let before = chrono::Utc::now();
    /// assert!(clock.now() >= before);
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall clock.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::effect::Effect;

    #[test]
    fn effect_debug_hides_future() {
        let effect: Effect<u8> = Effect::future(async { Some(1) });
        assert_eq!(format!("{effect:?}"), "Effect::Future(<future>)");
    }

    #[test]
    fn none_is_none() {
        assert!(Effect::<u8>::None.is_none());
        assert!(!Effect::<u8>::future(async { None }).is_none());
    }
}
