//! Structured logging.
//!
//! Installs a global `tracing` subscriber with an `EnvFilter` and either a
//! pretty (development) or JSON (containers) formatter. JSON lines carry:
//! - `timestamp`, `level`, `target`
//! - `fields.message` plus any structured fields on the event
//! - `span` context for instrumented registry operations

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{TelemetryConfig, TelemetryError};

/// Result of logging initialization.
#[derive(Debug)]
pub struct StructuredLogger {
    installed: bool,
}

impl StructuredLogger {
    /// False when another subscriber was already installed.
    pub fn installed(&self) -> bool {
        self.installed
    }
}

/// Initialize the global subscriber.
///
/// Calling it again after a subscriber is installed is a no-op.
pub fn init_logging(config: &TelemetryConfig) -> Result<StructuredLogger, TelemetryError> {
    let env_filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;

    let installed = if !config.console_output {
        tracing_subscriber::registry()
            .with(env_filter)
            .try_init()
            .is_ok()
    } else if config.json_logs {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .try_init()
            .is_ok()
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_ansi(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .is_ok()
    };

    if installed {
        tracing::debug!(
            service = %config.service_name,
            json_logs = config.json_logs,
            "Structured logging configured"
        );
    }

    Ok(StructuredLogger { installed })
}

/// Helper to create structured log entries with a component field.
#[macro_export]
macro_rules! log_event {
    (info, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    (warn, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::warn!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    (error, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::error!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    (debug, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::debug!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };
}
