//! Runtime profiling collaborators.
//!
//! The pipeline itself lives in [`crate::engine`]; this module carries the
//! pieces that sit around it at runtime:
//!
//! - [`CaptureBuffer`]: a mutex-guarded buffer that concurrent hooks append
//!   observed queries into, with copy-on-read snapshots
//! - [`ThresholdGuard`]: the pure should-this-capture-be-logged decision
//! - [`DiagnoseTarget`]: the registration record for methods tagged for
//!   diagnosis, as handed over by whatever discovery layer the host
//!   application uses
//! - [`PerformanceViolation`]: the CI surface raised when a profile fails
//!   acceptance

use std::sync::Mutex;

use serde::Serialize;

use crate::{capture::QueryCapture, report::ProfileReport, scoring::Grade};

/// Thread-safe buffer of observed queries.
///
/// Insertions serialize under a mutex; [`snapshot`](Self::snapshot) copies
/// out so a `ProfileReport` observes a consistent set even while appenders
/// keep running.
#[derive(Debug, Default)]
pub struct CaptureBuffer {
    inner: Mutex<Vec<QueryCapture>>
}

impl CaptureBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one capture. A poisoned lock drops the capture rather than
    /// propagating the panic into the instrumented application.
    pub fn record(&self, capture: QueryCapture) {
        if let Ok(mut buffer) = self.inner.lock() {
            buffer.push(capture);
        }
    }

    /// Copy-on-read snapshot of everything captured so far.
    #[must_use]
    pub fn snapshot(&self) -> Vec<QueryCapture> {
        self.inner.lock().map(|buffer| buffer.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut buffer) = self.inner.lock() {
            buffer.clear();
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().map(|buffer| buffer.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Decides whether a capture is slow enough to log.
pub struct ThresholdGuard;

impl ThresholdGuard {
    /// The effective threshold is the larger of the per-method and global
    /// thresholds, with negatives treated as zero. A zero effective
    /// threshold logs everything.
    #[must_use]
    pub fn should_log(elapsed_ms: f64, method_threshold_ms: f64, global_threshold_ms: f64) -> bool {
        let effective = method_threshold_ms.max(0.0).max(global_threshold_ms.max(0.0));
        elapsed_ms >= effective
    }
}

/// A method registered for diagnosis.
///
/// The host ecosystem's discovery mechanism (attribute scan, build-time
/// registration, explicit call) produces these records; the profiler only
/// consumes them.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnoseTarget {
    pub class_name:  String,
    pub method_name: String,
    pub label:       String,
    pub description: String
}

impl DiagnoseTarget {
    #[must_use]
    pub fn new(class_name: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self {
            class_name:  class_name.into(),
            method_name: method_name.into(),
            label:       String::new(),
            description: String::new()
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Elapsed milliseconds above which a single query counts against the
/// profile on its own.
const SLOW_QUERY_MS: f64 = 500.0;

/// Raised by CI integration when a profile fails acceptance thresholds.
///
/// Carries the full report so the failure output can show everything the
/// analysis knows.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceViolation {
    pub report:      ProfileReport,
    pub reason:      String,
    pub class_name:  String,
    pub method_name: String
}

impl PerformanceViolation {
    /// Build the violation for a failed profile, deriving the reason text.
    ///
    /// Conditions are checked in order (worst grade F, slow query, N+1,
    /// full table scan) and concatenated with "; "; when none of them
    /// applies the failure is attributed to critical findings.
    #[must_use]
    pub fn from_report(
        report: ProfileReport,
        class_name: impl Into<String>,
        method_name: impl Into<String>
    ) -> Self {
        let mut reasons = Vec::new();
        if report.worst_grade() == Some(Grade::F) {
            reasons.push("grade F".to_string());
        }
        let slowest = report.slowest_elapsed_ms();
        if slowest >= SLOW_QUERY_MS {
            reasons.push(format!("slow query ({}ms)", slowest.round() as u64));
        }
        if report.n_plus_one_detected {
            reasons.push("N+1".to_string());
        }
        if report.has_table_scan() {
            reasons.push("full table scan".to_string());
        }
        if reasons.is_empty() {
            reasons.push("critical findings".to_string());
        }

        Self {
            report,
            reason: reasons.join("; "),
            class_name: class_name.into(),
            method_name: method_name.into()
        }
    }
}

impl std::fmt::Display for PerformanceViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Performance violation in {}::{}: {}",
            self.class_name, self.method_name, self.reason
        )
    }
}

impl std::error::Error for PerformanceViolation {}

impl From<PerformanceViolation> for masterror::AppError {
    fn from(violation: PerformanceViolation) -> Self {
        Self::bad_request(violation.to_string())
    }
}
