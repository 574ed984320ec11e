//! Logging utilities for genmap.
//!
//! This module provides structured logging functionality to make logs more
//! searchable and analyzable.

use std::time::Instant;
use tracing::{debug, error, info, warn};

use uuid::Uuid;

use crate::colormaps::ColormapRegistry;
use crate::error::GenMapError;

/// Initialize the tracing subscriber with the given log level.
///
/// `RUST_LOG` wins over `log_level` when set. Logs go to stderr so JSON
/// printed on stdout stays clean.
pub fn init_tracing(log_level: &str) {
    let filter = match std::env::var("RUST_LOG") {
        Ok(val) => val,
        Err(_) => log_level.to_string(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();
}

/// Log a start message for a significant operation
pub fn log_operation_start(operation: &str, details: Option<&str>) {
    if let Some(details) = details {
        info!(
            operation = operation,
            details = details,
            "Starting operation"
        );
    } else {
        info!(operation = operation, "Starting operation");
    }
}

/// Log the completion of a significant operation
pub fn log_operation_end(operation: &str, start_time: Instant, success: bool) {
    let duration_ms = start_time.elapsed().as_secs_f64() * 1000.0;

    if success {
        info!(
            operation = operation,
            duration_ms = duration_ms,
            "Operation completed successfully"
        );
    } else {
        warn!(
            operation = operation,
            duration_ms = duration_ms,
            "Operation completed with warnings"
        );
    }
}

/// Log an operation with timing and result in a single statement
pub fn log_timed_operation<F, T, E>(operation: &str, f: F) -> std::result::Result<T, E>
where
    F: FnOnce() -> std::result::Result<T, E>,
    E: std::fmt::Display,
{
    let start = Instant::now();
    let operation_id = Uuid::new_v4();

    debug!(
        operation = operation,
        operation_id = %operation_id,
        "Starting operation"
    );

    let result = f();
    let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

    match &result {
        Ok(_) => info!(
            operation = operation,
            operation_id = %operation_id,
            duration_ms = duration_ms,
            "Operation completed"
        ),
        Err(e) => warn!(
            operation = operation,
            operation_id = %operation_id,
            duration_ms = duration_ms,
            error = %e,
            "Operation failed"
        ),
    }

    result
}

/// Log what the colormap registry holds
pub fn log_registry_stats(registry: &ColormapRegistry) {
    info!(
        operation = "registry_stats",
        colormaps = registry.len(),
        names = %registry.names().join(", "),
        "Colormap registry contents"
    );
}

/// Log an error with context
pub fn log_error(error: &GenMapError, context: &str) {
    error!(
        error = %error,
        context = context,
        error_type = error.kind(),
        "Error occurred"
    );
}
