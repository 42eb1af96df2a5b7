//! Server metrics definitions
//!
//! OpenTelemetry instruments for the call pipeline. They are recorded by the
//! dispatcher when metrics are enabled on the builder and exported through
//! whatever meter provider is installed globally.
//!
//! # Metrics Collected
//!
//! - **calls_total**: Calls processed, by method and status (counter)
//! - **call_duration**: Call processing latency distribution (histogram)
//! - **batch_size**: Batch size distribution (histogram)
//! - **errors_total**: Failed calls, by error kind (counter)
//! - **notifications_total**: Calls answered without a body (counter)
//!
//! # Examples
//!
//! ```rust,no_run
//! use duorpc_server::ServerMetrics;
//!
//! let metrics = ServerMetrics::new("my-service");
//! metrics.record_call("math.add", "success", 0.002);
//! ```

use opentelemetry::{
    global,
    metrics::{Counter, Histogram, Meter},
    InstrumentationScope, KeyValue,
};

/// Server metrics for monitoring
///
/// All metrics are prefixed with `duorpc.server.*`.
pub struct ServerMetrics {
    /// Total number of calls processed
    pub calls_total: Counter<u64>,
    /// Call processing duration in seconds
    pub call_duration: Histogram<f64>,
    /// Batch size distribution
    pub batch_size: Histogram<u64>,
    /// Total number of failed calls
    pub errors_total: Counter<u64>,
    /// Total number of suppressed 2.0 replies
    pub notifications_total: Counter<u64>,
}

impl ServerMetrics {
    pub fn new(service_name: impl Into<String>) -> Self {
        let scope = InstrumentationScope::builder(service_name.into()).build();
        Self::new_with_meter(&global::meter_with_scope(scope))
    }

    /// Create a new ServerMetrics instance with a custom meter
    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            calls_total: meter
                .u64_counter("duorpc.server.calls.total")
                .with_description("Total number of calls processed")
                .build(),
            call_duration: meter
                .f64_histogram("duorpc.server.call.duration")
                .with_description("Call processing duration in seconds")
                .build(),
            batch_size: meter
                .u64_histogram("duorpc.server.batch.size")
                .with_description("Number of calls in batch requests")
                .build(),
            errors_total: meter
                .u64_counter("duorpc.server.errors.total")
                .with_description("Total number of failed calls")
                .build(),
            notifications_total: meter
                .u64_counter("duorpc.server.notifications.total")
                .with_description("Total number of calls answered without a body")
                .build(),
        }
    }

    pub fn record_call(&self, method: &str, status: &str, duration_secs: f64) {
        let attributes = &[
            KeyValue::new("method", method.to_string()),
            KeyValue::new("status", status.to_string()),
        ];
        self.calls_total.add(1, attributes);
        self.call_duration.record(duration_secs, attributes);
    }

    pub fn record_error(&self, kind: &str) {
        let attributes = &[KeyValue::new("error_type", kind.to_string())];
        self.errors_total.add(1, attributes);
    }

    pub fn record_batch(&self, size: u64, mode: &str) {
        let attributes = &[KeyValue::new("mode", mode.to_string())];
        self.batch_size.record(size, attributes);
    }

    pub fn record_notification(&self, method: &str) {
        let attributes = &[KeyValue::new("method", method.to_string())];
        self.notifications_total.add(1, attributes);
    }
}
