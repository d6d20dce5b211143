//! `/metrics` with the Prometheus recorder installed.
//!
//! Kept in its own test binary: the recorder is process-global.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect

use accessgate_auth::SessionAuthenticator;
use accessgate_auth::mocks::MockIdentityProvider;
use accessgate_auth::providers::StaticDirectory;
use accessgate_runtime::metrics::MetricsExporter;
use accessgate_runtime::{InMemoryRequestStore, LifecycleEngine};
use accessgate_testing::test_clock;
use accessgate_web::{AppState, router};
use axum_test::TestServer;
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn exporter_serves_engine_and_auth_counters() {
    accessgate_testing::init_tracing();
    let exporter = MetricsExporter::install().unwrap();

    let engine = LifecycleEngine::new(InMemoryRequestStore::new(), Arc::new(test_clock()));
    let authenticator = SessionAuthenticator::new(
        MockIdentityProvider::new().with_code("c0de", "alice"),
        StaticDirectory::new().with_contributor("alice"),
        Arc::new(test_clock()),
        chrono::Duration::minutes(10),
    );
    let state = AppState::new(engine, authenticator).with_metrics(exporter);
    let server = TestServer::new(router(state)).unwrap();

    server
        .post("/login")
        .json(&json!({"code": "c0de"}))
        .await
        .assert_status_ok();
    server
        .post("/requests/submit")
        .json(&json!({"username": "alice", "reason": "needs access"}))
        .await
        .assert_status_ok();

    let response = server.get("/metrics").await;
    response.assert_status_ok();
    let text = response.text();
    assert!(text.contains("accessgate_code_exchanges_total"));
    assert!(text.contains("# HELP accessgate_code_exchanges_total"));
    assert!(text.contains("accessgate_requests_submitted_total"));
}
