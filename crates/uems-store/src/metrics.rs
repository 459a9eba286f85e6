//! Store metrics collection.
//!
//! Provides standardized metrics for monitoring store operations:
//! - Operation counters
//! - Batch conflict counters (lost preconditions and duplicate creates)

use metrics::counter;

/// Metric name constants for consistency.
pub mod names {
    /// Total store operations by operation name.
    pub const OPS_TOTAL: &str = "uems_store_ops_total";

    /// Total batch/CAS conflicts by collection.
    pub const CONFLICTS_TOTAL: &str = "uems_store_conflicts_total";
}

/// Record a completed store operation.
pub fn record_op(operation: &'static str) {
    counter!(names::OPS_TOTAL, "operation" => operation).increment(1);
}

/// Record a precondition conflict (duplicate create or lost CAS).
pub fn record_conflict(collection: &str) {
    counter!(
        names::CONFLICTS_TOTAL,
        "collection" => collection.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names() {
        assert!(names::OPS_TOTAL.contains("ops"));
        assert!(names::CONFLICTS_TOTAL.contains("conflicts"));
    }
}
