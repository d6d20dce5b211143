//! Code exchange endpoint.

use crate::error::AppError;
use crate::extractors::{CorrelationId, JsonBody};
use crate::state::AppState;
use accessgate_auth::{ContributorDirectory, IdentityProvider};
use accessgate_core::RequestStore;
use accessgate_core::api::{LoginBody, LoginResponse};
use axum::{Json, extract::State};

/// Exchange a one-time authorization code for a session.
///
/// # Endpoint
///
/// ```text
/// POST /login
/// Content-Type: application/json
///
/// { "code": "0123abcd" }
/// ```
///
/// # Response
///
/// ```json
/// { "username": "alice", "role": "user" }
/// ```
///
/// # Errors
///
/// - 401 `INVALID_CODE` for empty, refused or replayed codes
/// - 403 `NOT_A_PROJECT_MEMBER` for identities outside the project
/// - 502 `PROVIDER_FAILURE` if the identity provider is unreachable
pub async fn login<S, P, D>(
    State(state): State<AppState<S, P, D>>,
    correlation_id: CorrelationId,
    JsonBody(body): JsonBody<LoginBody>,
) -> Result<Json<LoginResponse>, AppError>
where
    S: RequestStore + 'static,
    P: IdentityProvider + 'static,
    D: ContributorDirectory + 'static,
{
    tracing::debug!(correlation_id = %correlation_id.0, "Login attempt");
    let session = state.authenticator.exchange_code(&body.code).await?;
    Ok(Json(LoginResponse::from(session)))
}
