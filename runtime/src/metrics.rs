//! Metrics for observability and monitoring.
//!
//! The dispatcher records through the [`metrics`] facade. Nothing is exported
//! unless the host application installs a recorder; without one every call
//! below is a no-op.
//!
//! # Example
//!
//! ```rust
//! use flux_runtime::metrics::register_metrics;
//!
//! // After installing a recorder (e.g. a Prometheus exporter):
//! register_metrics();
//! ```

use metrics::{describe_counter, describe_gauge, describe_histogram};
use std::time::Duration;

// Re-export metrics macros for use in other modules
pub use metrics::{counter, gauge, histogram};

/// Register all metric descriptions.
///
/// Call once after installing a recorder so exporters can attach help text.
pub fn register_metrics() {
    describe_counter!(
        "dispatcher_actions_total",
        "Total number of actions reduced by a dispatcher (bootstrap included)"
    );
    describe_counter!(
        "dispatcher_actions_rejected_total",
        "Total number of actions rejected before reduction"
    );
    describe_counter!(
        "dispatcher_actions_queued_total",
        "Total number of nested dispatches queued behind a running dispatch"
    );
    describe_counter!(
        "dispatcher_null_slices_total",
        "Total number of dispatches aborted because a store returned no slice"
    );
    describe_histogram!(
        "dispatcher_reduce_duration_seconds",
        "Time taken to run every store over one action"
    );
    describe_histogram!(
        "dispatcher_changed_keys",
        "Number of slices that changed identity per dispatch"
    );
    describe_counter!(
        "dispatcher_notifications_total",
        "Total number of observer invocations"
    );
    describe_gauge!(
        "dispatcher_stores_registered",
        "Number of stores registered with the most recently updated dispatcher"
    );
}

/// Dispatcher metrics recorder.
pub struct DispatcherMetrics;

impl DispatcherMetrics {
    /// Record one reduction pass and its outcome.
    pub fn record_reduce(duration: Duration, changed_keys: usize) {
        counter!("dispatcher_actions_total").increment(1);
        histogram!("dispatcher_reduce_duration_seconds").record(duration.as_secs_f64());
        // Note: Precision loss acceptable for metrics (key counts < 2^52)
        #[allow(clippy::cast_precision_loss)]
        histogram!("dispatcher_changed_keys").record(changed_keys as f64);
    }

    /// Record an action rejected before reduction.
    pub fn record_rejection() {
        counter!("dispatcher_actions_rejected_total").increment(1);
    }

    /// Record a nested dispatch deferred to the queue.
    pub fn record_queued() {
        counter!("dispatcher_actions_queued_total").increment(1);
    }

    /// Record a dispatch aborted by a missing slice.
    pub fn record_null_slice() {
        counter!("dispatcher_null_slices_total").increment(1);
    }

    /// Record a notification pass.
    pub fn record_notifications(count: usize) {
        counter!("dispatcher_notifications_total").increment(count as u64);
    }

    /// Record the size of the store registry.
    pub fn record_store_count(count: usize) {
        // Note: Precision loss acceptable for metrics
        #[allow(clippy::cast_precision_loss)]
        gauge!("dispatcher_stores_registered").set(count as f64);
    }
}
