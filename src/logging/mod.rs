//! Logging infrastructure for sheets-export.
//!
//! Built on `tracing` with a console layer and an optional JSON
//! rolling-file layer. See [`init_logging`].

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log the start of an export
///
/// # Example
///
/// ```no_run
/// use sheets_export::log_export_start;
///
/// log_export_start!("res.partner", 3);
/// ```
#[macro_export]
macro_rules! log_export_start {
    ($model:expr, $field_count:expr) => {
        tracing::info!(
            model = %$model,
            field_count = $field_count,
            "Starting spreadsheet export"
        );
    };
}

/// Log the completion of an export
///
/// # Example
///
/// ```no_run
/// use sheets_export::log_export_complete;
/// use std::time::Duration;
///
/// log_export_complete!(42, Duration::from_millis(850));
/// ```
#[macro_export]
macro_rules! log_export_complete {
    ($count:expr, $duration:expr) => {
        tracing::info!(
            records_count = $count,
            duration_ms = $duration.as_millis() as u64,
            "Spreadsheet export completed"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use sheets_export::log_error_with_context;
/// use sheets_export::domain::ExportError;
///
/// log_error_with_context!(&ExportError::NoRecords, "Export failed");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
