//! In-memory request store.
//!
//! Suitable for development, single-process deployments and tests. Both
//! write primitives run under one lock, so the check and the write are a
//! single indivisible step.

use accessgate_core::{
    AccessRequest, RequestId, RequestScope, RequestStatus, RequestStore, StoreError,
};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Records {
    by_id: HashMap<RequestId, AccessRequest>,
    owners: HashMap<String, RequestId>,
}

/// Request store backed by a mutex-guarded map.
///
/// Cloning shares the underlying records.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRequestStore {
    records: Arc<Mutex<Records>>,
}

impl InMemoryRequestStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    ///
    /// # Errors
    ///
    /// Returns error if the lock is poisoned.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(lock(&self.records)?.by_id.len())
    }

    /// Returns `true` if nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns error if the lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

fn lock(records: &Mutex<Records>) -> Result<MutexGuard<'_, Records>, StoreError> {
    records
        .lock()
        .map_err(|_| StoreError::Unavailable("request store lock poisoned".to_string()))
}

impl RequestStore for InMemoryRequestStore {
    fn insert_unique(
        &self,
        request: AccessRequest,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        let records = Arc::clone(&self.records);

        async move {
            let mut guard = lock(&records)?;

            if guard.owners.contains_key(&request.username) {
                return Err(StoreError::DuplicateOwner {
                    username: request.username,
                });
            }

            guard
                .owners
                .insert(request.username.clone(), request.request_id);
            guard.by_id.insert(request.request_id, request);
            Ok(())
        }
    }

    fn get(
        &self,
        request_id: RequestId,
    ) -> impl Future<Output = Result<Option<AccessRequest>, StoreError>> + Send {
        let records = Arc::clone(&self.records);

        async move { Ok(lock(&records)?.by_id.get(&request_id).cloned()) }
    }

    fn list(
        &self,
        scope: &RequestScope,
    ) -> impl Future<Output = Result<Vec<AccessRequest>, StoreError>> + Send {
        let records = Arc::clone(&self.records);
        let scope = scope.clone();

        async move {
            let guard = lock(&records)?;
            let requests = match &scope {
                RequestScope::All => guard.by_id.values().cloned().collect(),
                RequestScope::Owner(username) => guard
                    .owners
                    .get(username)
                    .and_then(|id| guard.by_id.get(id))
                    .cloned()
                    .into_iter()
                    .collect(),
            };
            Ok(requests)
        }
    }

    fn compare_and_swap(
        &self,
        expected: RequestStatus,
        updated: AccessRequest,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        let records = Arc::clone(&self.records);

        async move {
            let mut guard = lock(&records)?;

            let current = guard
                .by_id
                .get_mut(&updated.request_id)
                .ok_or(StoreError::NotFound(updated.request_id))?;

            if current.status != expected {
                return Err(StoreError::StaleState {
                    request_id: updated.request_id,
                    expected,
                    actual: current.status,
                });
            }

            *current = updated;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn insert_refuses_second_record_for_owner() {
        let store = InMemoryRequestStore::new();
        store
            .insert_unique(AccessRequest::new("alice", "first", Utc::now()))
            .await
            .unwrap();

        let err = store
            .insert_unique(AccessRequest::new("alice", "second", Utc::now()))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            StoreError::DuplicateOwner {
                username: "alice".to_string()
            }
        );
        assert_eq!(store.len().unwrap(), 1);
    }

    #[tokio::test]
    async fn compare_and_swap_checks_stored_status() {
        let store = InMemoryRequestStore::new();
        let request = AccessRequest::new("alice", "r", Utc::now());
        store.insert_unique(request.clone()).await.unwrap();

        let mut rejected = request.clone();
        rejected.status = RequestStatus::Rejected;
        store
            .compare_and_swap(RequestStatus::Pending, rejected)
            .await
            .unwrap();

        let mut approved = request.clone();
        approved.status = RequestStatus::Approved;
        let err = store
            .compare_and_swap(RequestStatus::Pending, approved)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StoreError::StaleState {
                actual: RequestStatus::Rejected,
                ..
            }
        ));
        let stored = store.get(request.request_id).await.unwrap().unwrap();
        assert_eq!(stored.status, RequestStatus::Rejected);
    }

    #[tokio::test]
    async fn list_respects_scope() {
        let store = InMemoryRequestStore::new();
        store
            .insert_unique(AccessRequest::new("alice", "a", Utc::now()))
            .await
            .unwrap();
        store
            .insert_unique(AccessRequest::new("dave", "d", Utc::now()))
            .await
            .unwrap();

        assert_eq!(store.list(&RequestScope::All).await.unwrap().len(), 2);
        let own = store
            .list(&RequestScope::Owner("dave".to_string()))
            .await
            .unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].username, "dave");
    }

    #[tokio::test]
    async fn swap_of_unknown_record_is_not_found() {
        let store = InMemoryRequestStore::new();
        let ghost = AccessRequest::new("ghost", "r", Utc::now());
        let err = store
            .compare_and_swap(RequestStatus::Pending, ghost.clone())
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::NotFound(ghost.request_id));
    }
}
