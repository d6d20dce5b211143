//! Integration tests for the request lifecycle.
//!
//! Drives [`LifecycleEngine`] through complete request histories, including
//! concurrent admin actions and store outages.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use accessgate_core::{
    EngineError, RequestAction, RequestStatus, RequestStore, Session, TransitionError,
    ValidationError,
};
use accessgate_runtime::{InMemoryRequestStore, LifecycleEngine};
use accessgate_testing::{FlakyRequestStore, SteppingClock, fixtures, properties, test_clock};
use proptest::prelude::*;
use std::sync::Arc;

fn engine() -> LifecycleEngine<InMemoryRequestStore> {
    accessgate_testing::init_tracing();
    LifecycleEngine::new(InMemoryRequestStore::new(), Arc::new(test_clock()))
}

fn is_invalid_state(err: &EngineError) -> bool {
    matches!(
        err,
        EngineError::Transition(TransitionError::InvalidState { .. })
    )
}

#[tokio::test]
async fn submit_approve_revoke_then_approve_again() {
    let engine = engine();
    let alice = Session::user("alice");
    let bob = Session::admin("bob");

    let request = engine.submit(&alice, "needs access").await.unwrap();
    assert_eq!(request.status, RequestStatus::Pending);
    assert_eq!(request.username, "alice");
    assert_eq!(request.approved_by, None);

    let approved = engine.approve(&bob, request.request_id).await.unwrap();
    assert_eq!(approved.status, RequestStatus::Approved);
    assert_eq!(approved.approved_by.as_deref(), Some("bob"));

    let revoked = engine.revoke(&bob, request.request_id).await.unwrap();
    assert_eq!(revoked.status, RequestStatus::Revoked);
    assert_eq!(revoked.approved_by.as_deref(), Some("bob"));

    let err = engine.approve(&bob, request.request_id).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::Transition(TransitionError::InvalidState {
            request_id: request.request_id,
            status: RequestStatus::Revoked,
            attempted: "approve",
        })
    );
}

#[tokio::test]
async fn replayed_approve_reports_invalid_state() {
    let engine = engine();
    let bob = Session::admin("bob");
    let request = engine.submit(&Session::user("alice"), "r").await.unwrap();

    engine.approve(&bob, request.request_id).await.unwrap();
    let err = engine.approve(&bob, request.request_id).await.unwrap_err();
    assert!(is_invalid_state(&err));

    let stored = engine.store().get(request.request_id).await.unwrap().unwrap();
    assert_eq!(stored.status, RequestStatus::Approved);
    assert_eq!(stored.approved_by.as_deref(), Some("bob"));
}

#[tokio::test]
async fn transitions_restamp_timestamp() {
    let engine = LifecycleEngine::new(
        InMemoryRequestStore::new(),
        Arc::new(SteppingClock::per_second()),
    );
    let request = engine.submit(&Session::user("alice"), "r").await.unwrap();
    let rejected = engine
        .reject(&Session::admin("bob"), request.request_id)
        .await
        .unwrap();

    assert!(rejected.timestamp > request.timestamp);
    assert_eq!(rejected.approved_by, None);
}

#[tokio::test]
async fn rejected_user_cannot_resubmit() {
    let engine = engine();
    let alice = Session::user("alice");
    let request = engine.submit(&alice, "first").await.unwrap();
    engine
        .reject(&Session::admin("bob"), request.request_id)
        .await
        .unwrap();

    let err = engine.submit(&alice, "second").await.unwrap_err();
    assert_eq!(
        err,
        EngineError::Validation(ValidationError::DuplicateRequest {
            username: "alice".to_string()
        })
    );
}

#[tokio::test]
async fn consume_marks_grant_used_once() {
    let engine = engine();
    let request = engine.submit(&Session::user("alice"), "r").await.unwrap();

    let err = engine.consume(request.request_id).await.unwrap_err();
    assert!(is_invalid_state(&err));

    engine
        .approve(&Session::admin("bob"), request.request_id)
        .await
        .unwrap();
    let used = engine.consume(request.request_id).await.unwrap();
    assert_eq!(used.status, RequestStatus::Used);
    assert!(is_invalid_state(
        &engine.consume(request.request_id).await.unwrap_err()
    ));
    assert!(is_invalid_state(
        &engine
            .revoke(&Session::admin("bob"), request.request_id)
            .await
            .unwrap_err()
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_approve_and_reject_have_one_winner() {
    for _ in 0..50 {
        let engine = Arc::new(engine());
        let request = engine.submit(&Session::user("alice"), "r").await.unwrap();
        let id = request.request_id;

        let approve = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.approve(&Session::admin("bob"), id).await })
        };
        let reject = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.reject(&Session::admin("carol"), id).await })
        };

        let results = [approve.await.unwrap(), reject.await.unwrap()];
        let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1);

        let loser = results.iter().find_map(|r| r.as_ref().err()).unwrap();
        assert!(is_invalid_state(loser));

        let stored = engine.store().get(id).await.unwrap().unwrap();
        assert_eq!(&stored, winners[0]);
    }
}

#[tokio::test]
async fn store_outage_leaves_record_untouched() {
    let store = FlakyRequestStore::new(InMemoryRequestStore::new());
    let engine = LifecycleEngine::new(store.clone(), Arc::new(test_clock()));
    let request = engine.submit(&Session::user("alice"), "r").await.unwrap();

    store.fail_next(1);
    let err = engine
        .approve(&Session::admin("bob"), request.request_id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::StoreUnavailable(_)));
    assert!(err.is_retryable());

    let stored = store.inner().get(request.request_id).await.unwrap().unwrap();
    assert_eq!(stored.status, RequestStatus::Pending);

    // Re-issuing the same action after the outage succeeds.
    let approved = engine
        .approve(&Session::admin("bob"), request.request_id)
        .await
        .unwrap();
    assert_eq!(approved.status, RequestStatus::Approved);
}

#[tokio::test]
async fn listing_is_oldest_first() {
    let engine = LifecycleEngine::new(
        InMemoryRequestStore::new(),
        Arc::new(SteppingClock::per_second()),
    );
    for user in ["carol", "alice", "dave"] {
        engine.submit(&Session::user(user), "r").await.unwrap();
    }

    let names: Vec<_> = engine
        .list_visible(&fixtures::admin())
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.username)
        .collect();
    assert_eq!(names, ["carol", "alice", "dave"]);
}

proptest! {
    #[test]
    fn second_submission_always_fails(
        first in properties::valid_reason(),
        second in properties::valid_reason(),
        decision in prop::option::of(properties::any_action()),
    ) {
        tokio_test::block_on(async {
            let engine = engine();
            let alice = fixtures::user();
            let request = engine.submit(&alice, &first).await.unwrap();

            if let Some(action) = decision {
                // Revoke from PENDING fails; the record stays PENDING either way.
                let _ = engine.apply(&fixtures::admin(), request.request_id, action).await;
            }

            let err = engine.submit(&alice, &second).await.unwrap_err();
            assert_eq!(err.code(), "DUPLICATE_REQUEST");
        });
    }

    #[test]
    fn approve_succeeds_only_from_pending(status in properties::any_status()) {
        tokio_test::block_on(async {
            let store = InMemoryRequestStore::new();
            let record = fixtures::request_in("alice", status, test_clock_now());
            store.insert_unique(record.clone()).await.unwrap();
            let engine = LifecycleEngine::new(store, Arc::new(test_clock()));

            let result = engine.approve(&fixtures::admin(), record.request_id).await;
            if status == RequestStatus::Pending {
                assert_eq!(result.unwrap().status, RequestStatus::Approved);
            } else {
                assert!(is_invalid_state(&result.unwrap_err()));
            }
        });
    }

    #[test]
    fn blank_reasons_are_refused(reason in properties::blank_reason()) {
        tokio_test::block_on(async {
            let err = engine().submit(&fixtures::user(), &reason).await.unwrap_err();
            assert_eq!(err, EngineError::Validation(ValidationError::EmptyReason));
        });
    }

    #[test]
    fn users_never_transition(action in properties::any_action()) {
        tokio_test::block_on(async {
            let engine = engine();
            let request = engine.submit(&fixtures::user(), "r").await.unwrap();
            let err = engine
                .apply(&Session::user("mallory"), request.request_id, action)
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                EngineError::Transition(TransitionError::Unauthorized { .. })
            ));
        });
    }
}

fn test_clock_now() -> accessgate_core::DateTime<accessgate_core::Utc> {
    use accessgate_core::environment::Clock;
    test_clock().now()
}

#[test]
fn action_names_round_trip() {
    for action in RequestAction::ALL {
        assert_eq!(action.as_str().parse::<RequestAction>(), Ok(action));
    }
}
