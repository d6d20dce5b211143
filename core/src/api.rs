//! JSON bodies of the request service's HTTP contracts.
//!
//! ```text
//! POST /login            {code}                          → {username, role}
//! POST /requests         {username, role}                → {requests: [...]}
//! POST /requests/submit  {username, reason}              → {message}
//! POST /requests/action  {requestId, action, approvedBy} → {message}
//! ```
//!
//! Errors are answered with [`ErrorBody`].

use crate::request::{AccessRequest, RequestAction, RequestId};
use crate::session::{Role, Session};
use serde::{Deserialize, Serialize};

/// Route of the code exchange.
pub const LOGIN_PATH: &str = "/login";
/// Route of the role-scoped listing.
pub const REQUESTS_PATH: &str = "/requests";
/// Route of request submission.
pub const SUBMIT_PATH: &str = "/requests/submit";
/// Route of admin actions.
pub const ACTION_PATH: &str = "/requests/action";

/// Confirmation message clients match on after a successful submit.
pub const SUBMITTED_MESSAGE: &str = "Request submitted successfully";

/// Confirmation message for an admin action.
#[must_use]
pub fn action_message(action: RequestAction) -> String {
    format!("Request {}", action.past_tense())
}

/// `POST /login` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginBody {
    /// One-time authorization code from the provider redirect.
    pub code: String,
}

/// `POST /login` success response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Authenticated username.
    pub username: String,
    /// Resolved role.
    pub role: Role,
}

impl From<Session> for LoginResponse {
    fn from(session: Session) -> Self {
        Self {
            username: session.username,
            role: session.role,
        }
    }
}

impl From<LoginResponse> for Session {
    fn from(response: LoginResponse) -> Self {
        Self::new(response.username, response.role)
    }
}

/// `POST /requests` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListBody {
    /// Caller username.
    pub username: String,
    /// Caller role as the client believes it to be.
    pub role: Role,
}

impl From<&Session> for ListBody {
    fn from(session: &Session) -> Self {
        Self {
            username: session.username.clone(),
            role: session.role,
        }
    }
}

/// `POST /requests` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListResponse {
    /// Visible requests.
    pub requests: Vec<AccessRequest>,
}

/// `POST /requests/submit` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitBody {
    /// Requesting username.
    pub username: String,
    /// Justification.
    pub reason: String,
}

/// `POST /requests/action` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionBody {
    /// Target request.
    pub request_id: RequestId,
    /// Action to apply.
    pub action: RequestAction,
    /// Acting admin.
    pub approved_by: String,
}

/// Confirmation response for mutating calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human-readable confirmation.
    pub message: String,
}

impl MessageResponse {
    /// Creates a message response.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn action_body_uses_camel_case() {
        let id = RequestId::new();
        let body: ActionBody = serde_json::from_value(json!({
            "requestId": id.to_string(),
            "action": "revoke",
            "approvedBy": "bob",
        }))
        .unwrap();

        assert_eq!(body.request_id, id);
        assert_eq!(body.action, RequestAction::Revoke);
        assert_eq!(body.approved_by, "bob");
    }

    #[test]
    fn action_messages() {
        assert_eq!(action_message(RequestAction::Approve), "Request approved");
        assert_eq!(action_message(RequestAction::Revoke), "Request revoked");
    }

    #[test]
    fn login_response_round_trips_into_session() {
        let response: LoginResponse =
            serde_json::from_value(json!({"username": "bob", "role": "admin"})).unwrap();
        assert_eq!(Session::from(response), Session::admin("bob"));
    }
}
