//! Store metrics, recorded through the `metrics` facade.
//!
//! The library never installs a recorder. Applications that want the numbers
//! install one (Prometheus, statsd, ...) and call [`register_metrics`] once so
//! the exporter can publish descriptions.
//!
//! Every metric carries a `store` label holding [`StoreConfig::name`](crate::StoreConfig).

use metrics::{
    Unit, counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram,
};
use std::time::Duration;

/// Actions run through a reducer, including the init action.
pub const DISPATCHES_TOTAL: &str = "tally_store_dispatches_total";

/// Reducer calls that returned an error.
pub const REDUCER_FAILURES_TOTAL: &str = "tally_store_reducer_failures_total";

/// Time spent inside the reducer per dispatch.
pub const REDUCER_DURATION_SECONDS: &str = "tally_store_reducer_duration_seconds";

/// Currently registered listeners.
pub const LISTENERS: &str = "tally_store_listeners";

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(
        DISPATCHES_TOTAL,
        "Total number of actions run through a store reducer"
    );
    describe_counter!(
        REDUCER_FAILURES_TOTAL,
        "Total number of reducer calls that returned an error"
    );
    describe_histogram!(
        REDUCER_DURATION_SECONDS,
        Unit::Seconds,
        "Time spent inside the reducer per dispatch"
    );
    describe_gauge!(LISTENERS, "Number of listeners subscribed to a store");
}

/// Store metrics recorder.
pub(crate) struct StoreMetrics;

impl StoreMetrics {
    /// Record one reducer call.
    pub(crate) fn record_dispatch(store: &str, duration: Duration, failed: bool) {
        counter!(DISPATCHES_TOTAL, "store" => store.to_owned()).increment(1);
        histogram!(REDUCER_DURATION_SECONDS, "store" => store.to_owned())
            .record(duration.as_secs_f64());
        if failed {
            counter!(REDUCER_FAILURES_TOTAL, "store" => store.to_owned()).increment(1);
        }
    }

    /// Record the current listener count.
    // Precision loss is fine for a gauge (listener counts < 2^52)
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn record_listeners(store: &str, count: usize) {
        gauge!(LISTENERS, "store" => store.to_owned()).set(count as f64);
    }
}
