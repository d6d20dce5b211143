//! HTTP router.
//!
//! Composes the handlers into one Axum router with correlation ids,
//! request tracing and CORS for browser clients.

use crate::handlers;
use crate::middleware::correlation_id_layer;
use crate::state::AppState;
use accessgate_auth::{ContributorDirectory, IdentityProvider};
use accessgate_core::RequestStore;
use accessgate_core::api::{ACTION_PATH, LOGIN_PATH, REQUESTS_PATH, SUBMIT_PATH};
use axum::{
    Router,
    http::{Method, header},
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the request service router.
///
/// # Routes
///
/// - `POST /login` - Exchange an authorization code for a session
/// - `POST /requests` - List visible requests
/// - `POST /requests/submit` - Submit a request
/// - `POST /requests/action` - Approve, reject or revoke
/// - `GET /health` - Health report
/// - `GET /metrics` - Prometheus metrics
pub fn router<S, P, D>(state: AppState<S, P, D>) -> Router
where
    S: RequestStore + 'static,
    P: IdentityProvider + 'static,
    D: ContributorDirectory + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route(LOGIN_PATH, post(handlers::login::<S, P, D>))
        .route(REQUESTS_PATH, post(handlers::list::<S, P, D>))
        .route(SUBMIT_PATH, post(handlers::submit::<S, P, D>))
        .route(ACTION_PATH, post(handlers::act::<S, P, D>))
        .route("/health", get(handlers::health_check::<S, P, D>))
        .route("/metrics", get(handlers::metrics::<S, P, D>))
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
        .layer(cors)
        .with_state(state)
}
