//! Prometheus metrics for the registry.
//!
//! All metrics follow the naming convention: `crm_<area>_<metric>_<unit>`
//!
//! Labels never carry organization ids or entity ids, only bounded enums
//! (entity kind, operation, outcome, saga step, constraint name).

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry,
    TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Registry holding every registry metric
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // DOCUMENT STORE
    // =========================================================================

    /// Store operations by entity, operation and outcome
    pub static ref STORE_OPERATIONS: CounterVec = CounterVec::new(
        Opts::new("crm_store_operations_total", "Document store operations"),
        &["entity", "operation", "outcome"]  // outcome: ok/error/conflict
    ).expect("metric creation failed");

    /// Store operation latency
    pub static ref STORE_OPERATION_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "crm_store_operation_duration_seconds",
            "Time spent in document store calls"
        ).buckets(exponential_buckets(0.00005, 2.0, 14).expect("valid buckets")),
        &["entity", "operation"]
    ).expect("metric creation failed");

    // =========================================================================
    // WRITE SAGA / CONSTRAINTS / CASCADE
    // =========================================================================

    /// Compensating actions run by the alias/holder-link saga
    pub static ref SAGA_COMPENSATIONS: CounterVec = CounterVec::new(
        Opts::new("crm_saga_compensations_total", "Saga compensations executed"),
        &["step", "outcome"]  // outcome: ok/failed
    ).expect("metric creation failed");

    /// Holder-link constraint violations by constraint and detecting layer
    pub static ref CONSTRAINT_VIOLATIONS: CounterVec = CounterVec::new(
        Opts::new("crm_constraint_violations_total", "Uniqueness constraint violations"),
        &["constraint", "layer"]  // layer: pre_check/index
    ).expect("metric creation failed");

    /// Entities removed through the deletion cascade
    pub static ref CASCADE_DELETIONS: CounterVec = CounterVec::new(
        Opts::new("crm_cascade_deletions_total", "Entities deleted by cascade"),
        &["entity", "mode"]  // mode: soft/hard
    ).expect("metric creation failed");
}

/// Register all metrics with [`REGISTRY`].
///
/// Safe to call more than once.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(STORE_OPERATIONS.clone()),
        Box::new(STORE_OPERATION_DURATION.clone()),
        Box::new(SAGA_COMPENSATIONS.clone()),
        Box::new(CONSTRAINT_VIOLATIONS.clone()),
        Box::new(CASCADE_DELETIONS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn gather_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: prometheus::Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for one labelled series.
    pub fn new(histogram: &HistogramVec, labels: &[&str]) -> Self {
        Self {
            histogram: histogram.with_label_values(labels),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}

/// Start timing for a histogram series. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr, $labels:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram, $labels)
    };
}
