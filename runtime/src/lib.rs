//! # Accessgate Runtime
//!
//! The moving parts around the domain types of `accessgate-core`:
//!
//! - **[`LifecycleEngine`]**: the single writer of access requests
//! - **[`InMemoryRequestStore`]**: a [`RequestStore`](accessgate_core::RequestStore)
//!   with atomic conditional writes
//! - **[`SyncPoller`]**: keeps a client's view of the requests fresh,
//!   driven by the pure [`SyncReducer`]
//! - **[`ClientView`]**: a poller plus the mutating actions of one session
//! - **Metrics and health** reporting
//!
//! ## Example
//!
//! ```
//! use accessgate_core::{RequestStatus, Session, environment::SystemClock};
//! use accessgate_runtime::{InMemoryRequestStore, LifecycleEngine};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let engine = LifecycleEngine::new(InMemoryRequestStore::new(), Arc::new(SystemClock));
//!
//! let request = engine.submit(&Session::user("alice"), "fix CI").await?;
//! let approved = engine.approve(&Session::admin("bob"), request.request_id).await?;
//! assert_eq!(approved.status, RequestStatus::Approved);
//! # Ok::<(), accessgate_core::EngineError>(())
//! # }).unwrap();
//! ```

pub mod client;
pub mod engine;
pub mod health;
pub mod memory_store;
pub mod metrics;
pub mod poller;
pub mod sync;

pub use client::{AccessApi, ClientError, ClientView, EngineApi};
pub use engine::LifecycleEngine;
pub use health::{HealthCheck, HealthReport, HealthStatus};
pub use memory_store::InMemoryRequestStore;
pub use poller::{PollConfig, PollerHandle, PollerStopped, SyncPoller};
pub use sync::{Snapshot, SyncAction, SyncEnvironment, SyncReducer, SyncState, SyncStatus};
