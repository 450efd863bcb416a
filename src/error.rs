//! Error types and constructors for the query diagnostics engine.
//!
//! This module provides error construction functions that create properly
//! formatted [`AppError`] instances with context-specific messages.
//!
//! # Error Categories
//!
//! - **Unsafe query errors**: statements the execution guard refuses to
//!   analyze (writes, DDL, empty input)
//! - **Plan errors**: driver failures while fetching EXPLAIN output
//! - **File errors**: IO failures when reading query or capture files
//! - **Config errors**: invalid configuration files or values
//!
//! Recoverable conditions (`plan_unavailable`, parse warnings, invariant
//! repairs) are not errors at all: they surface as flags and
//! [`Diagnostic`](crate::report::Diagnostic) records on the report.

pub use masterror::{AppError, AppResult};

/// Create the terminal error for a statement the guard refuses to analyze.
///
/// # Arguments
///
/// * `keyword` - The leading keyword of the rejected statement, or an empty
///   string for empty input
pub fn unsafe_query_error(keyword: &str) -> AppError {
    if keyword.is_empty() {
        AppError::bad_request("unsafe_query: empty statement cannot be analyzed".to_string())
    } else {
        AppError::bad_request(format!(
            "unsafe_query: refusing to analyze '{}' statement, only read-only queries are \
             explained",
            keyword
        ))
    }
}

/// Create a driver error for a failed EXPLAIN round trip.
///
/// The engine downgrades this to a static-only report; it is surfaced as-is
/// only when the caller invokes the driver directly.
pub fn plan_fetch_error(driver: &str, message: impl Into<String>) -> AppError {
    AppError::service(format!(
        "EXPLAIN failed on driver '{}': {}",
        driver,
        message.into()
    ))
}

/// Create file read error with path context
pub fn file_read_error(path: &str, source: std::io::Error) -> AppError {
    AppError::internal(format!("Failed to read file '{}': {}", path, source))
}

/// Create capture log decode error
pub fn capture_log_error(message: impl Into<String>) -> AppError {
    AppError::bad_request(format!("Invalid capture log: {}", message.into()))
}

/// Create config error
pub fn config_error(message: impl Into<String>) -> AppError {
    AppError::bad_request(message.into())
}
