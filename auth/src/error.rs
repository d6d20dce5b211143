//! Configuration errors.
//!
//! Authentication failures themselves are [`accessgate_core::AuthError`].

use thiserror::Error;

/// Invalid or missing configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required setting is absent.
    #[error("Missing required setting {0}")]
    Missing(&'static str),

    /// A setting is present but unusable.
    #[error("Invalid setting {name}: {reason}")]
    Invalid {
        /// Setting name
        name: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}
