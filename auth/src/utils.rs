//! Utility functions for authentication.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;

/// Random anti-forgery value for the `state` parameter of an authorization
/// redirect.
///
/// 32 random bytes, base64url-encoded without padding.
///
/// # Examples
///
/// ```
/// use accessgate_auth::utils::generate_state;
///
/// let state = generate_state();
/// assert_eq!(state.len(), 43);
/// assert_ne!(state, generate_state());
/// ```
#[must_use]
pub fn generate_state() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Canonical form of a provider username for directory lookups.
///
/// Same form as [`Session::username`](accessgate_core::Session), so
/// directory keys and request owners always agree.
#[must_use]
pub fn normalize_username(username: &str) -> String {
    accessgate_core::canonical_username(username)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_is_url_safe() {
        let state = generate_state();
        assert!(
            state
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn usernames_compare_case_insensitively() {
        assert_eq!(normalize_username(" Alice "), "alice");
    }
}
