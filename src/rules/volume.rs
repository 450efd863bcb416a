//! Rules about row volume: stale planner statistics, ineffective LIMIT, and
//! quadratic blowup.

use super::{Finding, FindingCategory, Rule, RuleInfo, Severity};
use crate::metrics::{Complexity, Metrics};

/// Planner estimates drifting far from observed row counts.
pub struct StaleStatsRule {
    /// Drift factor above which statistics count as stale (10 = one order
    /// of magnitude)
    pub drift_factor: f64
}

impl Rule for StaleStatsRule {
    fn info(&self) -> RuleInfo {
        RuleInfo {
            name:     "Stale statistics",
            category: FindingCategory::StaleStats,
            severity: Severity::Warning
        }
    }

    fn evaluate(&self, metrics: &Metrics) -> Option<Finding> {
        let drifted = metrics.per_table_estimates.iter().find(|(_, estimate)| {
            match (estimate.actual_rows, estimate.estimated_rows) {
                (Some(actual), Some(estimated)) => {
                    // relative error catches overestimates, the magnitude
                    // ratio catches the classic underestimate
                    let relative = (actual - estimated).abs() / actual.max(1.0);
                    let magnitude =
                        actual.max(estimated) / actual.min(estimated).max(1.0);
                    relative > self.drift_factor || magnitude > self.drift_factor
                }
                _ => false
            }
        });
        let (table, estimate) = drifted?;
        Some(Finding {
            severity:       Severity::Warning,
            category:       FindingCategory::StaleStats,
            title:          "Stale planner statistics".to_string(),
            description:    format!(
                "Table '{}' was estimated at {:.0} rows but produced {:.0}; the planner is \
                 working from stale statistics.",
                table,
                estimate.estimated_rows.unwrap_or(0.0),
                estimate.actual_rows.unwrap_or(0.0)
            ),
            recommendation: format!("Run ANALYZE TABLE {} to refresh statistics", table)
        })
    }
}

/// Small result produced from a disproportionately large scan without early
/// termination.
pub struct LimitIneffectiveRule {
    /// Examined-to-returned ratio that triggers the rule
    pub examined_ratio:    u64,
    /// Result sizes above this are not considered "small"
    pub small_result_rows: u64
}

impl Rule for LimitIneffectiveRule {
    fn info(&self) -> RuleInfo {
        RuleInfo {
            name:     "LIMIT without early termination",
            category: FindingCategory::LimitIneffective,
            severity: Severity::Warning
        }
    }

    fn evaluate(&self, metrics: &Metrics) -> Option<Finding> {
        if metrics.has_early_termination {
            return None;
        }
        let returned = metrics.rows_returned?;
        let examined = metrics.rows_examined?;
        if returned > self.small_result_rows {
            return None;
        }
        let floor = (self.examined_ratio * returned).max(self.examined_ratio);
        if examined < floor {
            return None;
        }
        Some(Finding {
            severity:       Severity::Warning,
            category:       FindingCategory::LimitIneffective,
            title:          "Row limit is not limiting work".to_string(),
            description:    format!(
                "{} rows were examined to return {}; the limit does not stop the scan early.",
                examined, returned
            ),
            recommendation: "Add an index matching the filter and sort order so the engine can \
                             stop at the limit"
                .to_string()
        })
    }
}

/// Quadratic or worse complexity with a large observed loop count.
pub struct QuadraticComplexityRule {
    pub loop_threshold: u64
}

impl Rule for QuadraticComplexityRule {
    fn info(&self) -> RuleInfo {
        RuleInfo {
            name:     "Quadratic complexity",
            category: FindingCategory::QuadraticComplexity,
            severity: Severity::Critical
        }
    }

    fn evaluate(&self, metrics: &Metrics) -> Option<Finding> {
        let complexity = metrics.complexity?;
        if !matches!(complexity, Complexity::Quadratic | Complexity::Cubic) {
            return None;
        }
        if metrics.max_loops < self.loop_threshold {
            return None;
        }
        Some(Finding {
            severity:       Severity::Critical,
            category:       FindingCategory::QuadraticComplexity,
            title:          "Quadratic work growth".to_string(),
            description:    format!(
                "Estimated complexity is {} with {} observed inner loops; runtime will explode \
                 as tables grow.",
                complexity, metrics.max_loops
            ),
            recommendation: "Index the inner lookup or restructure the join to remove the \
                             repeated scan"
                .to_string()
        })
    }
}
