//! `HttpAccessApi` against a real listener serving the router.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use accessgate_auth::SessionAuthenticator;
use accessgate_auth::mocks::MockIdentityProvider;
use accessgate_auth::providers::StaticDirectory;
use accessgate_core::{RequestAction, RequestStatus, Role, Session, TransportError};
use accessgate_runtime::{
    AccessApi, ClientError, ClientView, InMemoryRequestStore, LifecycleEngine, PollConfig,
};
use accessgate_testing::test_clock;
use accessgate_web::{AppState, HttpAccessApi, WebConfig, router};
use std::sync::Arc;
use std::time::Duration;

async fn spawn_service() -> HttpAccessApi {
    accessgate_testing::init_tracing();
    let engine = LifecycleEngine::new(InMemoryRequestStore::new(), Arc::new(test_clock()));
    let authenticator = SessionAuthenticator::new(
        MockIdentityProvider::new()
            .with_code("alice-code", "alice")
            .with_code("bob-code", "bob"),
        StaticDirectory::new()
            .with_admin("bob")
            .with_contributor("alice"),
        Arc::new(test_clock()),
        chrono::Duration::minutes(10),
    );
    let app = router(AppState::new(engine, authenticator));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    HttpAccessApi::new(WebConfig::new(base)).unwrap()
}

#[tokio::test]
async fn client_speaks_every_contract() {
    let api = spawn_service().await;

    let alice = api.login("alice-code").await.unwrap();
    assert_eq!(alice, Session::user("alice"));
    let bob = api.login("bob-code").await.unwrap();
    assert_eq!(bob.role, Role::Admin);

    let message = api.submit(&alice, "needs access").await.unwrap();
    assert_eq!(message, "Request submitted successfully");

    let requests = api.fetch_requests(&bob).await.unwrap();
    assert_eq!(requests.len(), 1);
    let id = requests[0].request_id;

    let message = api.act(&bob, id, RequestAction::Approve).await.unwrap();
    assert_eq!(message, "Request approved");

    let mine = api.fetch_requests(&alice).await.unwrap();
    assert_eq!(mine[0].status, RequestStatus::Approved);
    assert_eq!(mine[0].approved_by.as_deref(), Some("bob"));
}

#[tokio::test]
async fn refusals_carry_service_codes() {
    let api = spawn_service().await;

    let err = api.login("alice-code-typo").await.unwrap_err();
    assert_eq!(err.code(), "INVALID_CODE");

    let alice = Session::user("alice");
    api.submit(&alice, "first").await.unwrap();
    let err = api.submit(&alice, "second").await.unwrap_err();
    assert!(matches!(err, ClientError::Rejected { ref code, .. } if code == "DUPLICATE_REQUEST"));
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let api = HttpAccessApi::new(WebConfig::new(base)).unwrap();
    let err = api.fetch_requests(&Session::admin("bob")).await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(TransportError::Network(_))));
}

#[tokio::test]
async fn client_view_polls_over_http() {
    let api = Arc::new(spawn_service().await);
    let config = PollConfig::new(Duration::from_millis(100));

    let admin = ClientView::open(
        Session::admin("bob"),
        Arc::clone(&api),
        config,
        Arc::new(test_clock()),
    );
    let user = ClientView::open(
        Session::user("alice"),
        Arc::clone(&api),
        config,
        Arc::new(test_clock()),
    );

    user.submit("needs access").await.unwrap();
    let state = tokio::time::timeout(
        Duration::from_secs(5),
        admin.poller().wait_for(|s| s.requests().len() == 1),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(state.requests()[0].username, "alice");
    assert_eq!(admin.pending().len(), 1);

    user.close().await;
    admin.close().await;
}
