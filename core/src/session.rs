//! Authenticated sessions and role-scoped visibility.

use crate::request::AccessRequest;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of an authenticated user. Immutable for a session's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// May approve, reject and revoke; sees every request.
    Admin,
    /// May submit one request; sees only their own.
    User,
}

impl Role {
    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical form of a provider username: trimmed and lowercased.
///
/// GitHub logins are case-insensitive, so `Alice` and `alice` are one
/// person and must own at most one request between them.
#[must_use]
pub fn canonical_username(username: &str) -> String {
    username.trim().to_lowercase()
}

/// A verified identity, issued once per successful code exchange.
///
/// Sessions are plain values. They are passed explicitly to every
/// operation that needs an actor, never looked up from ambient state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Session {
    /// Provider-supplied username in [canonical form](canonical_username).
    pub username: String,
    /// Role resolved from the contributor directory.
    pub role: Role,
}

impl Session {
    /// Creates a session. The username is stored in canonical form.
    #[must_use]
    pub fn new(username: impl AsRef<str>, role: Role) -> Self {
        Self {
            username: canonical_username(username.as_ref()),
            role,
        }
    }

    /// Shorthand for an admin session.
    #[must_use]
    pub fn admin(username: impl AsRef<str>) -> Self {
        Self::new(username, Role::Admin)
    }

    /// Shorthand for a user session.
    #[must_use]
    pub fn user(username: impl AsRef<str>) -> Self {
        Self::new(username, Role::User)
    }

    /// Returns `true` for admin sessions.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }

    /// The slice of requests this session may see.
    #[must_use]
    pub fn scope(&self) -> RequestScope {
        match self.role {
            Role::Admin => RequestScope::All,
            Role::User => RequestScope::Owner(self.username.clone()),
        }
    }
}

/// Visibility filter applied to request listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RequestScope {
    /// Every request.
    All,
    /// Only requests owned by this username.
    Owner(String),
}

impl RequestScope {
    /// Returns `true` if `request` is visible under this scope.
    #[must_use]
    pub fn admits(&self, request: &AccessRequest) -> bool {
        match self {
            Self::All => true,
            Self::Owner(username) => request.username == *username,
        }
    }

    /// Drops every request not visible under this scope.
    #[must_use]
    pub fn filter(&self, requests: Vec<AccessRequest>) -> Vec<AccessRequest> {
        match self {
            Self::All => requests,
            Self::Owner(_) => requests.into_iter().filter(|r| self.admits(r)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn usernames_are_canonical() {
        assert_eq!(Session::user(" Alice ").username, "alice");
        assert_eq!(Session::admin("BOB"), Session::admin("bob"));
        assert_eq!(
            Session::user("Alice").scope(),
            RequestScope::Owner("alice".to_string())
        );
    }

    #[test]
    fn admin_scope_sees_everything() {
        let scope = Session::admin("bob").scope();
        assert_eq!(scope, RequestScope::All);
        assert!(scope.admits(&AccessRequest::new("alice", "r", Utc::now())));
    }

    #[test]
    fn user_scope_filters_to_owner() {
        let scope = Session::user("alice").scope();
        let requests = vec![
            AccessRequest::new("alice", "mine", Utc::now()),
            AccessRequest::new("mallory", "not mine", Utc::now()),
        ];

        let visible = scope.filter(requests);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].username, "alice");
    }

    #[test]
    fn role_wire_names() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"user\"").unwrap(),
            Role::User
        );
    }
}
