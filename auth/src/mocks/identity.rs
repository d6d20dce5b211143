//! Mock identity provider for testing.

use crate::providers::{IdentityProvider, ProviderIdentity};
use accessgate_core::AuthError;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Mock identity provider.
///
/// Answers registered codes with their outcome and refuses everything else
/// with [`AuthError::InvalidCode`]. Like a real provider, each registered
/// code is honoured once. Cloning shares the registrations.
#[derive(Debug, Clone, Default)]
pub struct MockIdentityProvider {
    codes: Arc<Mutex<HashMap<String, Result<ProviderIdentity, AuthError>>>>,
    calls: Arc<AtomicUsize>,
}

impl MockIdentityProvider {
    /// Provider with no valid codes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `code` as issued to `login`.
    #[must_use]
    pub fn with_code(self, code: &str, login: &str) -> Self {
        self.register(
            code,
            Ok(ProviderIdentity {
                login: login.to_string(),
                email: Some(format!("{login}@example.com")),
            }),
        );
        self
    }

    /// Make `code` fail with `error`.
    #[must_use]
    pub fn with_failure(self, code: &str, error: AuthError) -> Self {
        self.register(code, Err(error));
        self
    }

    fn register(&self, code: &str, outcome: Result<ProviderIdentity, AuthError>) {
        if let Ok(mut codes) = self.codes.lock() {
            codes.insert(code.to_string(), outcome);
        }
    }

    /// Number of exchanges that reached the provider.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl IdentityProvider for MockIdentityProvider {
    fn exchange_code(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<ProviderIdentity, AuthError>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self
            .codes
            .lock()
            .ok()
            .and_then(|mut codes| codes.remove(code))
            .unwrap_or(Err(AuthError::InvalidCode));

        async move { outcome }
    }
}
