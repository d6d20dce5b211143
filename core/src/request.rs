//! Access request records and their transition table.
//!
//! The transition rules live here as pure functions on [`AccessRequest`];
//! the engine only adds authorization and the atomic store write.

use crate::error::TransitionError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Longest accepted justification, in characters, after trimming.
pub const MAX_REASON_LEN: usize = 1000;

/// Unique identifier for an access request. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generate a new random `RequestId`.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a `RequestId` from a UUID.
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RequestId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Status of an access request.
///
/// Serialized in upper case (`"PENDING"`, `"APPROVED"`, ...) to match the
/// wire format clients already render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    /// Submitted, awaiting an admin decision.
    Pending,
    /// Granted. May be revoked or consumed.
    Approved,
    /// Declined by an admin.
    Rejected,
    /// Grant withdrawn after approval.
    Revoked,
    /// Grant exercised by its consumer.
    Used,
}

impl RequestStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Approved,
        Self::Rejected,
        Self::Revoked,
        Self::Used,
    ];

    /// Returns `true` if no transition leaves this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Revoked | Self::Used)
    }

    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Revoked => "REVOKED",
            Self::Used => "USED",
        }
    }

    /// Status reached by applying `action` from `self`, if the table allows it.
    #[must_use]
    pub const fn next(self, action: RequestAction) -> Option<Self> {
        match (self, action) {
            (Self::Pending, RequestAction::Approve) => Some(Self::Approved),
            (Self::Pending, RequestAction::Reject) => Some(Self::Rejected),
            (Self::Approved, RequestAction::Revoke) => Some(Self::Revoked),
            _ => None,
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Admin decision applied to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestAction {
    /// `PENDING → APPROVED`
    Approve,
    /// `PENDING → REJECTED`
    Reject,
    /// `APPROVED → REVOKED`
    Revoke,
}

impl RequestAction {
    /// All admin actions.
    pub const ALL: [Self; 3] = [Self::Approve, Self::Reject, Self::Revoke];

    /// Wire name of the action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Revoke => "revoke",
        }
    }

    /// Past-tense verb used in confirmation messages.
    #[must_use]
    pub const fn past_tense(self) -> &'static str {
        match self {
            Self::Approve => "approved",
            Self::Reject => "rejected",
            Self::Revoke => "revoked",
        }
    }
}

impl fmt::Display for RequestAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            "revoke" => Ok(Self::Revoke),
            other => Err(format!("unknown action: {other}")),
        }
    }
}

/// A contributor's request for elevated access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRequest {
    /// Stable identifier assigned at creation.
    pub request_id: RequestId,
    /// Owner. Immutable.
    pub username: String,
    /// Justification supplied at submission. Immutable.
    pub reason: String,
    /// Current lifecycle status.
    pub status: RequestStatus,
    /// Admin who approved the request. Kept after revocation for audit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    /// Time of the last status-relevant event.
    pub timestamp: DateTime<Utc>,
}

impl AccessRequest {
    /// Creates a new `PENDING` request with a fresh identifier.
    #[must_use]
    pub fn new(username: impl Into<String>, reason: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            request_id: RequestId::new(),
            username: username.into(),
            reason: reason.into(),
            status: RequestStatus::Pending,
            approved_by: None,
            timestamp: at,
        }
    }

    /// Computes the record that results from `actor` applying `action` at `at`.
    ///
    /// The receiver is left untouched so a caller can write the result with
    /// a compare-and-swap against the status it was computed from.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::InvalidState`] if the table has no entry
    /// for `(self.status, action)`.
    pub fn transition(
        &self,
        action: RequestAction,
        actor: &str,
        at: DateTime<Utc>,
    ) -> Result<Self, TransitionError> {
        let next = self
            .status
            .next(action)
            .ok_or_else(|| TransitionError::InvalidState {
                request_id: self.request_id,
                status: self.status,
                attempted: action.as_str(),
            })?;

        let mut updated = self.clone();
        updated.status = next;
        updated.timestamp = at;
        if action == RequestAction::Approve {
            updated.approved_by = Some(actor.to_string());
        }
        Ok(updated)
    }

    /// Computes the record that results from the grant being exercised.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::InvalidState`] unless the request is `APPROVED`.
    pub fn consume(&self, at: DateTime<Utc>) -> Result<Self, TransitionError> {
        if self.status != RequestStatus::Approved {
            return Err(TransitionError::InvalidState {
                request_id: self.request_id,
                status: self.status,
                attempted: "consume",
            });
        }

        let mut updated = self.clone();
        updated.status = RequestStatus::Used;
        updated.timestamp = at;
        Ok(updated)
    }

    /// Returns `true` if the grant is currently usable.
    #[must_use]
    pub fn is_active_grant(&self) -> bool {
        self.status == RequestStatus::Approved
    }
}
