//! Error responses for HTTP handlers.
//!
//! Domain errors keep their machine code on the wire so clients can match
//! on `DUPLICATE_REQUEST` or `INVALID_STATE` rather than on status alone.

use accessgate_core::{AuthError, EngineError, TransitionError, ValidationError};
use accessgate_core::api::ErrorBody;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

/// Application error type for web handlers.
///
/// Implements [`IntoResponse`], answering `{code, message}` with `status`.
///
/// # Examples
///
/// ```
/// use accessgate_core::ValidationError;
/// use accessgate_web::AppError;
/// use axum::http::StatusCode;
///
/// let err = AppError::from(accessgate_core::EngineError::from(ValidationError::EmptyReason));
/// assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
/// assert_eq!(err.code(), "EMPTY_REASON");
/// ```
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    code: String,
    /// Internal error (logged, never sent to the client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code: code.into(),
            source: None,
        }
    }

    /// Attach the underlying error for logging.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// 400 Bad Request.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    /// 403 Forbidden.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", message)
    }

    /// 404 Not Found.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    /// 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_SERVER_ERROR",
            message,
        )
    }

    /// HTTP status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Client-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    error = %source,
                    "Request failed"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "Request failed"
                );
            }
        } else {
            tracing::debug!(status = %self.status, code = %self.code, "Request refused");
        }

        let body = ErrorBody {
            code: self.code,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        let status = match &err {
            EngineError::Validation(
                ValidationError::EmptyReason | ValidationError::ReasonTooLong { .. },
            ) => StatusCode::UNPROCESSABLE_ENTITY,
            EngineError::Validation(ValidationError::DuplicateRequest { .. })
            | EngineError::Transition(TransitionError::InvalidState { .. }) => StatusCode::CONFLICT,
            EngineError::Transition(TransitionError::Unauthorized { .. }) => StatusCode::FORBIDDEN,
            EngineError::Transition(TransitionError::NotFound(_)) => StatusCode::NOT_FOUND,
            EngineError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        Self::new(status, err.code(), err.to_string())
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        let status = match &err {
            AuthError::InvalidCode => StatusCode::UNAUTHORIZED,
            AuthError::NotAProjectMember { .. } => StatusCode::FORBIDDEN,
            AuthError::ProviderFailure(_) => StatusCode::BAD_GATEWAY,
        };
        Self::new(status, err.code(), err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}
