//! Authentication constants.

/// GitHub endpoints used by default.
pub mod github {
    /// Authorization page the user is redirected to.
    pub const AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";

    /// Code-for-token exchange endpoint.
    pub const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";

    /// Authenticated-user endpoint.
    pub const USER_API_URL: &str = "https://api.github.com/user";

    /// Error GitHub reports for unknown, expired or already used codes.
    pub const BAD_VERIFICATION_CODE: &str = "bad_verification_code";
}

/// Scope requested by default.
pub const DEFAULT_SCOPE: &str = "user:email";

/// `User-Agent` sent to the provider; GitHub refuses requests without one.
pub const USER_AGENT: &str = concat!("accessgate/", env!("CARGO_PKG_VERSION"));

/// Environment variable names read by `from_env` constructors.
pub mod env {
    /// OAuth client identifier.
    pub const CLIENT_ID: &str = "ACCESSGATE_CLIENT_ID";
    /// OAuth client secret.
    pub const CLIENT_SECRET: &str = "ACCESSGATE_CLIENT_SECRET";
    /// Redirect target registered with the provider.
    pub const REDIRECT_URI: &str = "ACCESSGATE_REDIRECT_URI";
    /// Optional scope override.
    pub const OAUTH_SCOPE: &str = "ACCESSGATE_OAUTH_SCOPE";
    /// Comma-separated admin usernames.
    pub const ADMINS: &str = "ACCESSGATE_ADMINS";
    /// Comma-separated contributor usernames.
    pub const CONTRIBUTORS: &str = "ACCESSGATE_CONTRIBUTORS";
}
