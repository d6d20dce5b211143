//! Request store contract.
//!
//! The store durably owns every [`AccessRequest`]. The lifecycle engine is
//! its only writer and relies on two atomic primitives:
//!
//! - [`insert_unique`](RequestStore::insert_unique): insert only if the
//!   owner has no record at all
//! - [`compare_and_swap`](RequestStore::compare_and_swap): replace a record
//!   only if its stored status still equals the one the new value was
//!   computed from
//!
//! A failed call must leave the stored record exactly as it was.

use crate::error::StoreError;
use crate::request::{AccessRequest, RequestId, RequestStatus};
use crate::session::RequestScope;
use std::future::Future;

/// Durable storage for access requests.
///
/// # Implementation Notes
///
/// - Both write primitives must test and write in one indivisible step
/// - Reads may lag writes; pollers tolerate a bounded staleness window
pub trait RequestStore: Send + Sync {
    /// Insert a new record.
    ///
    /// # Errors
    ///
    /// - [`StoreError::DuplicateOwner`] if any record exists for `request.username`
    /// - [`StoreError::Unavailable`] if the store cannot be reached
    fn insert_unique(
        &self,
        request: AccessRequest,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Fetch one record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the store cannot be reached.
    fn get(
        &self,
        request_id: RequestId,
    ) -> impl Future<Output = Result<Option<AccessRequest>, StoreError>> + Send;

    /// List the records visible under `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the store cannot be reached.
    fn list(
        &self,
        scope: &RequestScope,
    ) -> impl Future<Output = Result<Vec<AccessRequest>, StoreError>> + Send;

    /// Replace the record with `updated.request_id` if its stored status is `expected`.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if no such record exists
    /// - [`StoreError::StaleState`] if the stored status differs from `expected`
    /// - [`StoreError::Unavailable`] if the store cannot be reached
    fn compare_and_swap(
        &self,
        expected: RequestStatus,
        updated: AccessRequest,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}
