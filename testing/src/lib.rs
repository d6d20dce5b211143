//! # Accessgate Testing
//!
//! Test doubles and helpers shared by the accessgate crates:
//!
//! - Deterministic clocks ([`FixedClock`], [`SteppingClock`])
//! - [`ScriptedApi`]: an [`AccessApi`](accessgate_runtime::AccessApi) whose
//!   fetch results are scripted in advance
//! - [`FlakyRequestStore`]: a store wrapper that injects outages
//! - [`ReducerTest`]: Given-When-Then harness for reducers
//! - proptest strategies for the domain types
//!
//! ## Example
//!
//! ```
//! use accessgate_core::{Session, environment::Clock};
//! use accessgate_runtime::{InMemoryRequestStore, LifecycleEngine};
//! use accessgate_testing::test_clock;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let clock = test_clock();
//! let engine = LifecycleEngine::new(InMemoryRequestStore::new(), Arc::new(clock.clone()));
//!
//! let request = engine.submit(&Session::user("alice"), "fix CI").await.unwrap();
//! assert_eq!(request.timestamp, clock.now());
//! # });
//! ```

pub mod mocks;

/// Fixtures for common sessions and records.
pub mod fixtures {
    use accessgate_core::{AccessRequest, RequestStatus, Session};
    use chrono::{DateTime, Utc};

    /// Admin session for `bob`.
    #[must_use]
    pub fn admin() -> Session {
        Session::admin("bob")
    }

    /// User session for `alice`.
    #[must_use]
    pub fn user() -> Session {
        Session::user("alice")
    }

    /// A record for `username` already in `status`.
    ///
    /// `approved_by` is set to `bob` for statuses reached through approval.
    #[must_use]
    pub fn request_in(username: &str, status: RequestStatus, at: DateTime<Utc>) -> AccessRequest {
        let mut request = AccessRequest::new(username, "needs access", at);
        request.status = status;
        if matches!(
            status,
            RequestStatus::Approved | RequestStatus::Revoked | RequestStatus::Used
        ) {
            request.approved_by = Some("bob".to_string());
        }
        request
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use accessgate_core::{RequestAction, RequestStatus};
    use proptest::prelude::*;

    /// Any request status.
    pub fn any_status() -> impl Strategy<Value = RequestStatus> {
        prop::sample::select(RequestStatus::ALL.to_vec())
    }

    /// Any admin action.
    pub fn any_action() -> impl Strategy<Value = RequestAction> {
        prop::sample::select(RequestAction::ALL.to_vec())
    }

    /// Short reasons that pass validation.
    pub fn valid_reason() -> BoxedStrategy<String> {
        proptest::string::string_regex("[a-zA-Z0-9][a-zA-Z0-9 .,]{0,80}")
            .map(|s| s.boxed())
            .unwrap_or_else(|_| Just("needs access".to_string()).boxed())
    }

    /// Reasons consisting only of whitespace.
    pub fn blank_reason() -> BoxedStrategy<String> {
        proptest::string::string_regex("[ \t\n]{0,16}")
            .map(|s| s.boxed())
            .unwrap_or_else(|_| Just(String::new()).boxed())
    }
}

/// Install a `tracing` subscriber honouring `RUST_LOG`, once per process.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub use mocks::{FixedClock, FlakyRequestStore, ScriptedApi, SteppingClock, test_clock};
pub use reducer_test::{ReducerTest, assertions};

#[cfg(test)]
mod tests {
    use super::*;
    use accessgate_core::RequestStatus;
    use accessgate_core::environment::Clock;

    #[test]
    fn fixture_records_carry_approver() {
        let clock = test_clock();
        let used = fixtures::request_in("alice", RequestStatus::Used, clock.now());
        assert_eq!(used.approved_by.as_deref(), Some("bob"));

        let rejected = fixtures::request_in("alice", RequestStatus::Rejected, clock.now());
        assert_eq!(rejected.approved_by, None);
    }

    #[test]
    fn init_tracing_twice_is_harmless() {
        init_tracing();
        init_tracing();
    }
}
