//! Authentication metrics.
//!
//! Recorded through the `metrics` facade; an application exports them by
//! installing a recorder and calling [`register_metrics`].

use metrics::{Unit, describe_counter};

/// Authorization-code exchanges, labelled by `outcome`.
pub const CODE_EXCHANGES: &str = "accessgate_code_exchanges_total";

/// Register the authenticator's metric descriptions.
pub fn register_metrics() {
    describe_counter!(
        CODE_EXCHANGES,
        Unit::Count,
        "Authorization code exchanges by outcome"
    );
}
