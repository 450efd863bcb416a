//! Report types: the analysis result for a single query and the aggregate
//! profiler result for a batch of captures.
//!
//! Reports are immutable snapshots: the engine assembles them once and
//! callers only read. Everything serializes with `serde` so the output
//! layer can render text, JSON, or YAML from the same value.

use std::time::{SystemTime, UNIX_EPOCH};

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::{
    capture::QueryCapture,
    metrics::Metrics,
    rootcause::RootCause,
    rules::{Finding, Severity},
    scoring::{Grade, ScoreReport},
    synth::IndexProposal
};

/// How the analysis was initiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    /// A single SQL statement handed to the engine directly
    Sql,
    /// A statement observed by the runtime profiler
    Profiler
}

impl std::fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sql => write!(f, "sql"),
            Self::Profiler => write!(f, "profiler")
        }
    }
}

/// Kind of a recovered internal condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// The plan parser met a shape it did not recognize
    ParseWarning,
    /// The reconciler corrected a contradictory metric
    InvariantRepair
}

/// An internal diagnostic attached to the report.
///
/// Diagnostics are never user-visible findings; they record what the
/// pipeline recovered from.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub kind:    DiagnosticKind,
    pub message: String
}

impl Diagnostic {
    pub fn parse_warning(message: impl Into<String>) -> Self {
        Self {
            kind:    DiagnosticKind::ParseWarning,
            message: message.into()
        }
    }

    pub fn invariant_repair(message: impl Into<String>) -> Self {
        Self {
            kind:    DiagnosticKind::InvariantRepair,
            message: message.into()
        }
    }
}

/// Result of analyzing a single query.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Original SQL exactly as received
    pub sql:           String,
    /// Canonical form after sanitization
    pub sanitized_sql: String,
    pub mode:          AnalysisMode,
    /// Driver the plan came from, when one was attached
    pub driver:        Option<String>,
    /// True when the report was produced from static analysis only
    pub plan_unavailable: bool,
    /// Echo of the raw EXPLAIN output that was ingested
    pub plan:          Option<Value>,

    pub metrics: Metrics,
    pub scores:  ScoreReport,

    pub findings:           Vec<Finding>,
    pub root_causes:        Vec<RootCause>,
    pub index_proposals:    Vec<IndexProposal>,
    pub top_recommendation: String,

    pub diagnostics: Vec<Diagnostic>,
    /// Unix timestamp in milliseconds
    pub analyzed_at_ms: u64
}

impl Report {
    #[must_use]
    pub fn grade(&self) -> Grade {
        self.scores.grade
    }

    #[must_use]
    pub fn composite_score(&self) -> f64 {
        self.scores.composite_score
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.scores.passed
    }

    #[must_use]
    pub fn has_critical_finding(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Critical)
    }

    /// Metrics as the dynamic mapping used by external consumers.
    #[must_use]
    pub fn metrics_map(&self) -> serde_json::Map<String, Value> {
        self.metrics.to_map()
    }
}

/// Wall clock now, as Unix milliseconds.
pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Result of analyzing a batch of captured queries.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileReport {
    pub mode: AnalysisMode,

    pub total_captures: usize,
    /// Captures whose query was analyzed (distinct queries analyzed once)
    pub analyzed: usize,
    /// Captures rejected by the execution guard
    pub skipped: usize,
    /// Sum of capture elapsed times in milliseconds
    pub total_time_ms: f64,

    /// Report for the single slowest capture
    pub slowest: Option<Report>,
    /// Report with the lowest composite score
    pub worst:   Option<Report>,

    /// Normalized SQL of queries captured more than once, with counts
    pub duplicate_queries: IndexMap<String, usize>,
    pub n_plus_one_detected: bool,

    /// One report per capture, in capture order
    pub reports:  Vec<Report>,
    /// The raw captures, in arrival order
    pub captures: Vec<QueryCapture>,
    /// Capture count per normalized SQL
    pub query_counts: IndexMap<String, usize>
}

impl ProfileReport {
    /// Elapsed milliseconds of the slowest capture, 0 when empty.
    #[must_use]
    pub fn slowest_elapsed_ms(&self) -> f64 {
        self.captures
            .iter()
            .map(QueryCapture::elapsed_ms)
            .fold(0.0, f64::max)
    }

    /// Grade of the worst individual report.
    #[must_use]
    pub fn worst_grade(&self) -> Option<Grade> {
        self.worst.as_ref().map(Report::grade)
    }

    #[must_use]
    pub fn has_table_scan(&self) -> bool {
        self.reports.iter().any(|r| r.metrics.has_table_scan)
    }

    #[must_use]
    pub fn has_critical_finding(&self) -> bool {
        self.reports.iter().any(Report::has_critical_finding)
    }
}
