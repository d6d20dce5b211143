//! Contributor directory backed by fixed username lists.

use super::ContributorDirectory;
use crate::constants::env;
use crate::utils::normalize_username;
use accessgate_core::{AuthError, Role};
use std::collections::HashSet;
use std::future::Future;

/// Directory holding admin and contributor usernames in memory.
///
/// Lookups are case-insensitive. A username on both lists is an admin.
///
/// # Example
///
/// ```
/// use accessgate_auth::providers::StaticDirectory;
///
/// let directory = StaticDirectory::new()
///     .with_admin("bob")
///     .with_contributor("alice");
/// assert!(directory.contains("Alice"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    admins: HashSet<String>,
    contributors: HashSet<String>,
}

impl StaticDirectory {
    /// Empty directory; every lookup answers `None`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an admin.
    #[must_use]
    pub fn with_admin(mut self, username: &str) -> Self {
        self.admins.insert(normalize_username(username));
        self
    }

    /// Add a contributor.
    #[must_use]
    pub fn with_contributor(mut self, username: &str) -> Self {
        self.contributors.insert(normalize_username(username));
        self
    }

    /// Read `ACCESSGATE_ADMINS` and `ACCESSGATE_CONTRIBUTORS`, each a
    /// comma-separated list. Absent variables mean empty lists.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env), reading through `lookup`.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parse = |name: &str| -> HashSet<String> {
            lookup(name)
                .unwrap_or_default()
                .split(',')
                .map(normalize_username)
                .filter(|u| !u.is_empty())
                .collect()
        };

        Self {
            admins: parse(env::ADMINS),
            contributors: parse(env::CONTRIBUTORS),
        }
    }

    /// Synchronous lookup.
    #[must_use]
    pub fn lookup(&self, username: &str) -> Option<Role> {
        let key = normalize_username(username);
        if self.admins.contains(&key) {
            Some(Role::Admin)
        } else if self.contributors.contains(&key) {
            Some(Role::User)
        } else {
            None
        }
    }

    /// Whether `username` has any role.
    #[must_use]
    pub fn contains(&self, username: &str) -> bool {
        self.lookup(username).is_some()
    }
}

impl ContributorDirectory for StaticDirectory {
    fn role_of(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<Role>, AuthError>> + Send {
        let role = self.lookup(username);
        async move { Ok(role) }
    }
}
