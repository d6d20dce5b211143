//! Prometheus metrics for the lifecycle engine and pollers.
//!
//! Components record through the `metrics` facade unconditionally. Nothing
//! is exported until an application installs a recorder, for example with
//! [`MetricsExporter::install`].
//!
//! # Example
//!
//! ```rust,no_run
//! use accessgate_runtime::metrics::MetricsExporter;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let exporter = MetricsExporter::install()?;
//! let text = exporter.render();
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use thiserror::Error;

// Re-export metrics macros for use in other crates
pub use metrics::counter;

/// Submissions, labelled by `outcome`.
pub const REQUESTS_SUBMITTED: &str = "accessgate_requests_submitted_total";
/// Admin transitions and consumptions, labelled by `action` and `outcome`.
pub const TRANSITIONS: &str = "accessgate_transitions_total";
/// Completed poll fetches, labelled by `outcome`.
pub const POLL_TICKS: &str = "accessgate_poll_ticks_total";
/// Ticks dropped because a fetch was still in flight.
pub const POLL_TICKS_SKIPPED: &str = "accessgate_poll_ticks_skipped_total";

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Installed Prometheus recorder.
///
/// Render the handle from an HTTP endpoint for scraping.
#[derive(Clone)]
pub struct MetricsExporter {
    handle: PrometheusHandle,
}

impl MetricsExporter {
    /// Install the Prometheus recorder and register metric descriptions.
    ///
    /// # Errors
    ///
    /// Returns error if a global recorder is already installed.
    pub fn install() -> Result<Self, MetricsError> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| MetricsError::Install(e.to_string()))?;

        register_metrics();
        tracing::info!("Prometheus metrics recorder installed");

        Ok(Self { handle })
    }

    /// Render current metrics in Prometheus text format.
    #[must_use]
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

impl std::fmt::Debug for MetricsExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsExporter").finish_non_exhaustive()
    }
}

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(
        REQUESTS_SUBMITTED,
        Unit::Count,
        "Access request submissions by outcome"
    );
    describe_counter!(
        TRANSITIONS,
        Unit::Count,
        "Access request transitions by action and outcome"
    );
    describe_counter!(POLL_TICKS, Unit::Count, "Poll fetches by outcome");
    describe_counter!(
        POLL_TICKS_SKIPPED,
        Unit::Count,
        "Poll ticks skipped because a fetch was in flight"
    );
}
