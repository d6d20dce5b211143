//! Health reporting.
//!
//! A [`HealthReport`] aggregates per-component [`HealthCheck`]s; its status
//! is the worst of its checks.

use accessgate_core::{DateTime, RequestScope, RequestStore, Utc};
use serde::Serialize;

/// Health of a component or of the whole service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Fully operational
    Healthy,
    /// Operational with reduced guarantees
    Degraded,
    /// Not operational
    Unhealthy,
}

impl HealthStatus {
    /// Check if status is healthy
    #[must_use]
    pub const fn is_healthy(self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// The worse of two statuses.
    #[must_use]
    pub const fn worst(self, other: Self) -> Self {
        match (self, other) {
            (Self::Unhealthy, _) | (_, Self::Unhealthy) => Self::Unhealthy,
            (Self::Degraded, _) | (_, Self::Degraded) => Self::Degraded,
            _ => Self::Healthy,
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded => write!(f, "degraded"),
            Self::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Result of checking one component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    /// Component name
    pub component: String,
    /// Component status
    pub status: HealthStatus,
    /// Details, if not healthy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Extra key/value details
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<(String, String)>,
}

impl HealthCheck {
    /// Create a healthy check result
    #[must_use]
    pub fn healthy(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status: HealthStatus::Healthy,
            message: None,
            metadata: Vec::new(),
        }
    }

    /// Create an unhealthy check result
    #[must_use]
    pub fn unhealthy(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status: HealthStatus::Unhealthy,
            message: Some(message.into()),
            metadata: Vec::new(),
        }
    }

    /// Add metadata to the health check
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push((key.into(), value.into()));
        self
    }
}

/// Aggregated health of the service.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// Worst status of all checks
    pub status: HealthStatus,
    /// Individual component checks
    pub checks: Vec<HealthCheck>,
    /// When the report was generated
    pub timestamp: DateTime<Utc>,
}

impl HealthReport {
    /// Aggregate `checks`.
    #[must_use]
    pub fn new(checks: Vec<HealthCheck>) -> Self {
        let status = checks
            .iter()
            .map(|c| c.status)
            .fold(HealthStatus::Healthy, HealthStatus::worst);

        Self {
            status,
            checks,
            timestamp: Utc::now(),
        }
    }

    /// Check if overall system is healthy
    #[must_use]
    pub const fn is_healthy(&self) -> bool {
        self.status.is_healthy()
    }
}

/// Check that the request store answers reads.
pub async fn check_store<S: RequestStore>(store: &S) -> HealthCheck {
    match store.list(&RequestScope::All).await {
        Ok(requests) => HealthCheck::healthy("request_store")
            .with_metadata("requests", requests.len().to_string()),
        Err(error) => HealthCheck::unhealthy("request_store", error.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::InMemoryRequestStore;

    #[test]
    fn worst_status_wins() {
        let report = HealthReport::new(vec![
            HealthCheck::healthy("a"),
            HealthCheck::unhealthy("b", "down"),
        ]);
        assert_eq!(report.status, HealthStatus::Unhealthy);
        assert!(!report.is_healthy());
        assert!(HealthReport::new(vec![]).is_healthy());
    }

    #[tokio::test]
    async fn empty_store_is_healthy() {
        let check = check_store(&InMemoryRequestStore::new()).await;
        assert_eq!(check.status, HealthStatus::Healthy);
        assert_eq!(
            check.metadata,
            vec![("requests".to_string(), "0".to_string())]
        );
    }
}
