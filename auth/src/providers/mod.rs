//! Authentication providers.
//!
//! The authenticator depends on two external collaborators, both expressed
//! as traits so tests can substitute in-memory versions:
//!
//! - [`IdentityProvider`]: turns a one-time authorization code into the
//!   provider's identity for the user (GitHub in production)
//! - [`ContributorDirectory`]: maps that identity to a project role, or to
//!   nothing for outsiders

use accessgate_core::{AuthError, Role};
use serde::{Deserialize, Serialize};
use std::future::Future;

pub mod directory;
pub mod github;

pub use directory::StaticDirectory;
pub use github::GitHubProvider;

/// Identity asserted by the provider for the holder of a code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderIdentity {
    /// Provider username (GitHub login).
    pub login: String,

    /// Primary email, if the provider disclosed one.
    pub email: Option<String>,
}

/// Exchanges authorization codes for identities.
pub trait IdentityProvider: Send + Sync {
    /// Redeem `code` and fetch the identity it was issued for.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidCode`] if the provider does not accept the code
    /// - [`AuthError::ProviderFailure`] for transport or provider-side errors
    fn exchange_code(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<ProviderIdentity, AuthError>> + Send;
}

/// Looks up project roles by provider username.
pub trait ContributorDirectory: Send + Sync {
    /// Role of `username`, or `None` if they are not on the project.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::ProviderFailure`] if the directory is unreachable.
    fn role_of(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<Role>, AuthError>> + Send;
}
