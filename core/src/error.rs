//! Error taxonomy for authentication, submission, transitions and transport.
//!
//! Each family has its own enum so callers can match on exactly the
//! failures an operation can produce. Every error carries a stable
//! machine-readable [`code`](EngineError::code) used on the wire.

use crate::request::{RequestId, RequestStatus};
use thiserror::Error;

/// Failures of the authorization-code exchange.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The code is empty, malformed, or was already consumed.
    #[error("Invalid or already used authorization code")]
    InvalidCode,

    /// The identity is valid but not on the contributor list.
    #[error("{username} is not part of the project contributor list")]
    NotAProjectMember {
        /// Provider username that was looked up
        username: String,
    },

    /// Transport or provider-side failure.
    #[error("Identity provider failure: {0}")]
    ProviderFailure(String),
}

impl AuthError {
    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidCode => "INVALID_CODE",
            Self::NotAProjectMember { .. } => "NOT_A_PROJECT_MEMBER",
            Self::ProviderFailure(_) => "PROVIDER_FAILURE",
        }
    }

    /// Returns `true` if a fresh login attempt may succeed without user changes.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ProviderFailure(_))
    }
}

/// Submission rejected before anything is written.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Reason is empty after trimming.
    #[error("Reason cannot be empty")]
    EmptyReason,

    /// Reason exceeds the accepted length.
    #[error("Reason is too long (max {max} characters)")]
    ReasonTooLong {
        /// Maximum accepted length
        max: usize,
    },

    /// The user already owns a request, whatever its status.
    #[error("{username} already has a request. Only one request is allowed per user")]
    DuplicateRequest {
        /// Owner of the existing request
        username: String,
    },
}

impl ValidationError {
    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::EmptyReason => "EMPTY_REASON",
            Self::ReasonTooLong { .. } => "REASON_TOO_LONG",
            Self::DuplicateRequest { .. } => "DUPLICATE_REQUEST",
        }
    }
}

/// Transition refused by the state machine or the authorization guard.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// No transition for this action from the record's current status.
    ///
    /// Also what the loser of a concurrent race observes.
    #[error("Cannot {attempted} request {request_id}: status is {status}")]
    InvalidState {
        /// Request the action targeted
        request_id: RequestId,
        /// Status observed at decision time
        status: RequestStatus,
        /// Action that was refused
        attempted: &'static str,
    },

    /// The actor's role may not perform this action.
    #[error("{username} is not authorized to {attempted}")]
    Unauthorized {
        /// Acting username
        username: String,
        /// Action that was refused
        attempted: &'static str,
    },

    /// No request with this identifier.
    #[error("Request {0} not found")]
    NotFound(RequestId),
}

impl TransitionError {
    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::Unauthorized { .. } => "UNAUTHORIZED",
            Self::NotFound(_) => "NOT_FOUND",
        }
    }
}

/// Network-level failure talking to the request service.
///
/// Pollers absorb these after the first successful load.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request did not complete in time.
    #[error("Request timed out")]
    Timeout,

    /// Connection-level failure.
    #[error("Network error: {0}")]
    Network(String),

    /// The service answered with an unexpected status.
    #[error("Unexpected status {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Message from the error body, if any
        message: String,
    },

    /// The body could not be decoded.
    #[error("Malformed response: {0}")]
    Decode(String),
}

/// Failures of the storage contract.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached or refused the operation. Nothing was written.
    #[error("Request store unavailable: {0}")]
    Unavailable(String),

    /// Insert refused: the owner already has a record.
    #[error("A request already exists for {username}")]
    DuplicateOwner {
        /// Owner of the existing record
        username: String,
    },

    /// Compare-and-swap refused: the stored status changed underneath.
    #[error("Request {request_id} is {actual}, expected {expected}")]
    StaleState {
        /// Record that was targeted
        request_id: RequestId,
        /// Status the write was computed from
        expected: RequestStatus,
        /// Status currently stored
        actual: RequestStatus,
    },

    /// No record with this identifier.
    #[error("Request {0} not found")]
    NotFound(RequestId),
}

/// Errors returned by lifecycle engine operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Submission failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Transition refused.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// The store failed; prior state is intact and the call may be retried.
    #[error("Request store unavailable: {0}")]
    StoreUnavailable(String),
}

impl EngineError {
    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(e) => e.code(),
            Self::Transition(e) => e.code(),
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
        }
    }

    /// Returns `true` if re-issuing the same call may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(message) => Self::StoreUnavailable(message),
            StoreError::DuplicateOwner { username } => {
                Self::Validation(ValidationError::DuplicateRequest { username })
            },
            StoreError::StaleState {
                request_id, actual, ..
            } => Self::Transition(TransitionError::InvalidState {
                request_id,
                status: actual,
                attempted: "update",
            }),
            StoreError::NotFound(id) => Self::Transition(TransitionError::NotFound(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_owner_surfaces_as_validation_error() {
        let err = EngineError::from(StoreError::DuplicateOwner {
            username: "alice".to_string(),
        });
        assert_eq!(err.code(), "DUPLICATE_REQUEST");
        assert!(!err.is_retryable());
    }

    #[test]
    fn stale_state_surfaces_as_invalid_state() {
        let id = RequestId::new();
        let err = EngineError::from(StoreError::StaleState {
            request_id: id,
            expected: RequestStatus::Pending,
            actual: RequestStatus::Rejected,
        });
        assert!(matches!(
            err,
            EngineError::Transition(TransitionError::InvalidState {
                status: RequestStatus::Rejected,
                ..
            })
        ));
    }

    #[test]
    fn only_store_outages_are_retryable() {
        assert!(EngineError::StoreUnavailable("down".into()).is_retryable());
        assert!(!EngineError::from(ValidationError::EmptyReason).is_retryable());
        assert!(AuthError::ProviderFailure("502".into()).is_retryable());
        assert!(!AuthError::InvalidCode.is_retryable());
    }

    #[test]
    fn messages_are_user_facing() {
        assert_eq!(
            ValidationError::EmptyReason.to_string(),
            "Reason cannot be empty"
        );
        assert_eq!(
            AuthError::NotAProjectMember {
                username: "eve".into()
            }
            .to_string(),
            "eve is not part of the project contributor list"
        );
    }
}
