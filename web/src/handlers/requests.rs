//! Access request endpoints.
//!
//! The caller is identified by the username in the body; the role always
//! comes from the contributor directory.

use crate::error::AppError;
use crate::extractors::JsonBody;
use crate::state::AppState;
use accessgate_auth::{ContributorDirectory, IdentityProvider};
use accessgate_core::RequestStore;
use accessgate_core::api::{
    ActionBody, ListBody, ListResponse, MessageResponse, SUBMITTED_MESSAGE, SubmitBody,
    action_message,
};
use axum::{Json, extract::State};

/// List the requests visible to the caller.
///
/// # Endpoint
///
/// ```text
/// POST /requests
///
/// { "username": "alice", "role": "user" }
/// ```
///
/// # Response
///
/// ```json
/// { "requests": [ { "requestId": "...", "username": "alice", "status": "PENDING", ... } ] }
/// ```
///
/// Admins receive every request, users only their own, oldest first.
///
/// # Errors
///
/// - 403 if the username is unknown or the claimed role is wrong
/// - 503 `STORE_UNAVAILABLE`
pub async fn list<S, P, D>(
    State(state): State<AppState<S, P, D>>,
    JsonBody(body): JsonBody<ListBody>,
) -> Result<Json<ListResponse>, AppError>
where
    S: RequestStore + 'static,
    P: IdentityProvider + 'static,
    D: ContributorDirectory + 'static,
{
    let session = state.resolve_session(&body.username, Some(body.role)).await?;
    let requests = state.engine.list_visible(&session).await?;
    Ok(Json(ListResponse { requests }))
}

/// Submit the caller's access request.
///
/// # Endpoint
///
/// ```text
/// POST /requests/submit
///
/// { "username": "alice", "reason": "needs access" }
/// ```
///
/// # Response
///
/// ```json
/// { "message": "Request submitted successfully" }
/// ```
///
/// # Errors
///
/// - 409 `DUPLICATE_REQUEST` if the user already has a request
/// - 422 `EMPTY_REASON` / `REASON_TOO_LONG`
/// - 403 for unknown users and for admins
pub async fn submit<S, P, D>(
    State(state): State<AppState<S, P, D>>,
    JsonBody(body): JsonBody<SubmitBody>,
) -> Result<Json<MessageResponse>, AppError>
where
    S: RequestStore + 'static,
    P: IdentityProvider + 'static,
    D: ContributorDirectory + 'static,
{
    let session = state.resolve_session(&body.username, None).await?;
    state.engine.submit(&session, &body.reason).await?;
    Ok(Json(MessageResponse::new(SUBMITTED_MESSAGE)))
}

/// Approve, reject or revoke a request.
///
/// # Endpoint
///
/// ```text
/// POST /requests/action
///
/// { "requestId": "...", "action": "approve", "approvedBy": "bob" }
/// ```
///
/// # Response
///
/// ```json
/// { "message": "Request approved" }
/// ```
///
/// # Errors
///
/// - 409 `INVALID_STATE` if the action does not apply to the current status
/// - 404 `NOT_FOUND` for unknown request ids
/// - 403 unless `approvedBy` is an admin
pub async fn act<S, P, D>(
    State(state): State<AppState<S, P, D>>,
    JsonBody(body): JsonBody<ActionBody>,
) -> Result<Json<MessageResponse>, AppError>
where
    S: RequestStore + 'static,
    P: IdentityProvider + 'static,
    D: ContributorDirectory + 'static,
{
    let session = state.resolve_session(&body.approved_by, None).await?;
    state
        .engine
        .apply(&session, body.request_id, body.action)
        .await?;
    Ok(Json(MessageResponse::new(action_message(body.action))))
}
