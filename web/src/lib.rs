//! HTTP surface for accessgate.
//!
//! Serves the four request-service contracts over Axum and provides
//! [`HttpAccessApi`], the client that speaks them.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │            HTTP shell (Axum)             │  ← JSON bodies, status codes
//! │  - correlation id + tracing span         │  ← CORS, request logging
//! │  - role resolved from the directory      │
//! ├──────────────────────────────────────────┤
//! │   SessionAuthenticator │ LifecycleEngine │  ← the only writers
//! └──────────────────────────────────────────┘
//! ```
//!
//! # Routes
//!
//! | Route | Body | Response |
//! |---|---|---|
//! | `POST /login` | `{code}` | `{username, role}` |
//! | `POST /requests` | `{username, role}` | `{requests: [...]}` |
//! | `POST /requests/submit` | `{username, reason}` | `{message}` |
//! | `POST /requests/action` | `{requestId, action, approvedBy}` | `{message}` |
//! | `GET /health` | | health report |
//! | `GET /metrics` | | Prometheus text |
//!
//! Failures answer `{code, message}` with the status given by [`AppError`].
//!
//! # Example
//!
//! ```no_run
//! use accessgate_auth::providers::{GitHubProvider, StaticDirectory};
//! use accessgate_auth::{AuthConfig, SessionAuthenticator};
//! use accessgate_core::environment::SystemClock;
//! use accessgate_runtime::{InMemoryRequestStore, LifecycleEngine};
//! use accessgate_web::{AppState, router};
//! use std::sync::Arc;
//!
//! # async fn serve() -> anyhow::Result<()> {
//! let config = AuthConfig::from_env()?;
//! let retention = config.code_retention;
//! let authenticator = SessionAuthenticator::new(
//!     GitHubProvider::new(config)?,
//!     StaticDirectory::from_env(),
//!     Arc::new(SystemClock),
//!     retention,
//! );
//! let engine = LifecycleEngine::new(InMemoryRequestStore::new(), Arc::new(SystemClock));
//!
//! let app = router(AppState::new(engine, authenticator));
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use client::HttpAccessApi;
pub use config::WebConfig;
pub use error::AppError;
pub use extractors::{CorrelationId, JsonBody};
pub use middleware::{CORRELATION_ID_HEADER, CorrelationIdExt, correlation_id_layer};
pub use router::router;
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
