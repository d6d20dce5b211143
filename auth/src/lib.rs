//! # Accessgate Authentication
//!
//! Turns a provider-issued, one-time authorization code into a
//! [`Session`](accessgate_core::Session) carrying the caller's project role.
//!
//! ## Flow
//!
//! ```text
//! AuthConfig::authorization_url(state) ─▶ user signs in at the provider
//!                                         │
//!                    redirect with ?code= ◀┘
//!                                         │
//! SessionAuthenticator::exchange_code(code) ─▶ Session { username, role }
//! ```
//!
//! ## Example
//!
//! ```
//! use accessgate_auth::mocks::MockIdentityProvider;
//! use accessgate_auth::providers::StaticDirectory;
//! use accessgate_auth::{SessionAuthenticator, SessionContext};
//! use accessgate_core::{Role, environment::SystemClock};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let authenticator = SessionAuthenticator::new(
//!     MockIdentityProvider::new().with_code("c0de", "alice"),
//!     StaticDirectory::new().with_contributor("alice"),
//!     Arc::new(SystemClock),
//!     chrono::Duration::minutes(10),
//! );
//!
//! let mut context = SessionContext::new();
//! let session = context.login(&authenticator, "c0de").await?;
//! assert_eq!(session.role, Role::User);
//!
//! // Codes are single-use.
//! assert!(authenticator.exchange_code("c0de").await.is_err());
//! # Ok::<(), accessgate_core::AuthError>(())
//! # }).unwrap();
//! ```

pub mod authenticator;
pub mod config;
pub mod constants;
pub mod error;
pub mod metrics;
pub mod providers;
pub mod session;
pub mod utils;

/// Mock providers for tests.
#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

pub use accessgate_core::AuthError;
pub use authenticator::SessionAuthenticator;
pub use config::AuthConfig;
pub use error::ConfigError;
pub use providers::{ContributorDirectory, IdentityProvider, ProviderIdentity};
pub use session::SessionContext;
