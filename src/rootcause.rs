//! Root-cause classification over findings and metrics.
//!
//! After the rules fire, the classifier names the dominant cause(s), drops
//! findings that are mere symptoms of a cause, and derives the single top
//! recommendation for the report. The functions are plain and pure so each
//! stage can be tested on its own.

use serde::Serialize;

use crate::{
    metrics::Metrics,
    rules::{Finding, FindingCategory},
    synth::IndexProposal
};

/// Dominant cause explaining a cluster of findings.
///
/// Declared in priority order: when several causes are present, the first
/// one drives the top recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum RootCause {
    /// Nested loops multiply row counts quadratically or worse
    QuadraticBlowup,
    /// Sorting spills through a temporary table
    SortSpill,
    /// The join order is driven by stale planner statistics
    BadJoinOrder,
    /// No index supports the filter
    MissingIndex,
    /// The full scan is the query's purpose
    IntentionalScan
}

impl std::fmt::Display for RootCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::QuadraticBlowup => write!(f, "quadratic_blowup"),
            Self::SortSpill => write!(f, "sort_spill"),
            Self::BadJoinOrder => write!(f, "bad_join_order"),
            Self::MissingIndex => write!(f, "missing_index"),
            Self::IntentionalScan => write!(f, "intentional_scan")
        }
    }
}

/// Identify the dominant cause(s), sorted by priority.
#[must_use]
pub fn detect_root_causes(findings: &[Finding], metrics: &Metrics) -> Vec<RootCause> {
    let has = |category: FindingCategory| findings.iter().any(|f| f.category == category);
    let mut causes = Vec::new();

    if has(FindingCategory::QuadraticComplexity) {
        causes.push(RootCause::QuadraticBlowup);
    }
    if has(FindingCategory::TempTable) && metrics.has_filesort {
        causes.push(RootCause::SortSpill);
    }
    if has(FindingCategory::DeepNestedLoop) && has(FindingCategory::StaleStats) {
        causes.push(RootCause::BadJoinOrder);
    }
    if has(FindingCategory::NoIndex) && !metrics.is_intentional_scan {
        causes.push(RootCause::MissingIndex);
    }
    if metrics.is_intentional_scan {
        causes.push(RootCause::IntentionalScan);
    }

    causes.sort();
    causes
}

/// Drop findings subsumed by a detected root cause.
///
/// An intentional scan absorbs `no_index` and `full_table_scan` (the scan is
/// the point) while anti-pattern findings survive; a missing index absorbs
/// `full_table_scan`, keeping only the actionable `no_index` finding.
#[must_use]
pub fn suppress_by_root_cause(findings: Vec<Finding>, causes: &[RootCause]) -> Vec<Finding> {
    let intentional = causes.contains(&RootCause::IntentionalScan);
    let missing_index = causes.contains(&RootCause::MissingIndex);

    findings
        .into_iter()
        .filter(|finding| {
            if intentional
                && matches!(
                    finding.category,
                    FindingCategory::NoIndex | FindingCategory::FullTableScan
                )
            {
                return false;
            }
            if missing_index && finding.category == FindingCategory::FullTableScan {
                return false;
            }
            true
        })
        .collect()
}

/// Derive the single top recommendation for the report.
///
/// The first root cause in priority order decides the wording; without any
/// cause the highest-severity finding's recommendation is promoted.
#[must_use]
pub fn identify_top_recommendation(
    causes: &[RootCause],
    findings: &[Finding],
    proposals: &[IndexProposal]
) -> String {
    match causes.first() {
        Some(RootCause::QuadraticBlowup) => {
            "Nested loops repeat full scans, so work grows quadratically with table size. \
             Index the inner lookup or pre-aggregate the repeated side of the join."
                .to_string()
        }
        Some(RootCause::SortSpill) => {
            "Sorting spills into a temporary table. Add an index matching the ORDER BY columns \
             or shrink the sorted result before ordering it."
                .to_string()
        }
        Some(RootCause::BadJoinOrder) => {
            "The join order is based on stale planner statistics. Run ANALYZE TABLE on the \
             involved tables, then re-check the plan."
                .to_string()
        }
        Some(RootCause::MissingIndex) => match proposals.first() {
            Some(proposal) => format!(
                "Add an index on {} ({})",
                proposal.table,
                proposal
                    .columns
                    .iter()
                    .map(|c| c.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            None => "Add an index covering the filtered columns".to_string()
        },
        Some(RootCause::IntentionalScan) => {
            "This query reads the entire dataset by design. If the full result set is not \
             needed, add a LIMIT clause or paginate instead."
                .to_string()
        }
        None => findings
            .iter()
            .max_by_key(|f| f.severity)
            .map(|f| f.recommendation.clone())
            .unwrap_or_else(|| "No significant issues detected".to_string())
    }
}
