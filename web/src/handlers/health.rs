//! Health and metrics endpoints.

use crate::error::AppError;
use crate::state::AppState;
use accessgate_auth::{ContributorDirectory, IdentityProvider};
use accessgate_core::RequestStore;
use accessgate_runtime::HealthReport;
use accessgate_runtime::health::check_store;
use axum::{Json, extract::State, http::StatusCode};

/// Health report for load balancers and monitoring.
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// 200 when every check passes, 503 otherwise.
///
/// ```json
/// {
///   "status": "healthy",
///   "checks": [ { "component": "request_store", "status": "healthy", ... } ],
///   "timestamp": "2025-01-01T00:00:00Z"
/// }
/// ```
pub async fn health_check<S, P, D>(
    State(state): State<AppState<S, P, D>>,
) -> (StatusCode, Json<HealthReport>)
where
    S: RequestStore + 'static,
    P: IdentityProvider + 'static,
    D: ContributorDirectory + 'static,
{
    let report = HealthReport::new(vec![check_store(state.engine.store()).await]);

    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(report))
}

/// Prometheus text exposition.
///
/// # Errors
///
/// 404 if no exporter was installed.
#[allow(clippy::unused_async)]
pub async fn metrics<S, P, D>(State(state): State<AppState<S, P, D>>) -> Result<String, AppError>
where
    S: RequestStore + 'static,
    P: IdentityProvider + 'static,
    D: ContributorDirectory + 'static,
{
    state
        .metrics
        .as_ref()
        .map(accessgate_runtime::metrics::MetricsExporter::render)
        .ok_or_else(|| AppError::not_found("Metrics exporter not installed"))
}
