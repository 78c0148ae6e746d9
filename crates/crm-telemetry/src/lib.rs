//! # CRM Telemetry
//!
//! Logging and metrics for the Ledger-CRM registry.
//!
//! ## Components
//!
//! - **Logging**: `tracing` subscriber with `EnvFilter`, pretty or JSON output
//! - **Metrics**: Prometheus counters/histograms in a crate-local registry
//!
//! ## Usage
//!
//! ```rust,ignore
//! use crm_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_telemetry(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `ledger-crm` | Service name in logs |
//! | `CRM_LOG_LEVEL` | `info` | Log level filter |
//! | `CRM_JSON_LOGS` | `false` | JSON log lines |
//! | `CRM_CONSOLE_OUTPUT` | `true` | Write logs to stdout |

#![warn(missing_docs)]

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::{init_logging, StructuredLogger};
pub use metrics::{
    gather_metrics, register_metrics, CASCADE_DELETIONS, CONSTRAINT_VIOLATIONS,
    SAGA_COMPENSATIONS, STORE_OPERATIONS, STORE_OPERATION_DURATION,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Subscriber or filter could not be built
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// Metric registration or encoding failed
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Register metrics and install the logging subscriber.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<StructuredLogger, TelemetryError> {
    register_metrics()?;
    init_logging(config)
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
