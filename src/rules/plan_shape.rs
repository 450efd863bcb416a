//! Rules about the shape of the plan: temporary tables, semi-join weedout,
//! index merges, and deep nested loops.

use super::{Finding, FindingCategory, Rule, RuleInfo, Severity};
use crate::metrics::Metrics;

/// Materialization into a temporary table, critical when it spills to disk.
pub struct TempTableRule;

impl Rule for TempTableRule {
    fn info(&self) -> RuleInfo {
        RuleInfo {
            name:     "Temporary table",
            category: FindingCategory::TempTable,
            severity: Severity::Warning
        }
    }

    fn evaluate(&self, metrics: &Metrics) -> Option<Finding> {
        if !metrics.has_temp_table {
            return None;
        }
        let (severity, description) = if metrics.has_disk_temp {
            (
                Severity::Critical,
                "The plan materializes an intermediate result into an on-disk temporary table."
            )
        } else {
            (
                Severity::Warning,
                "The plan materializes an intermediate result into an in-memory temporary table."
            )
        };
        Some(Finding {
            severity,
            category: FindingCategory::TempTable,
            title: "Temporary table in plan".to_string(),
            description: description.to_string(),
            recommendation: "Rework GROUP BY/ORDER BY so an index can provide the ordering, or \
                             reduce the intermediate result size"
                .to_string()
        })
    }
}

/// Semi-join duplicate weedout detected.
pub struct WeedoutRule;

impl Rule for WeedoutRule {
    fn info(&self) -> RuleInfo {
        RuleInfo {
            name:     "Semi-join weedout",
            category: FindingCategory::Weedout,
            severity: Severity::Warning
        }
    }

    fn evaluate(&self, metrics: &Metrics) -> Option<Finding> {
        if !metrics.has_weedout {
            return None;
        }
        Some(Finding {
            severity:       Severity::Warning,
            category:       FindingCategory::Weedout,
            title:          "Semi-join weedout".to_string(),
            description:    "The optimizer de-duplicates semi-join rows through a weedout \
                             temporary table."
                .to_string(),
            recommendation: "Rewrite IN/EXISTS subqueries as joins on unique keys where possible"
                .to_string()
        })
    }
}

/// Nested loop joins deeper than the configured threshold.
///
/// Critical two levels above the warning depth.
pub struct DeepNestedLoopRule {
    pub warn_depth: u32
}

impl Rule for DeepNestedLoopRule {
    fn info(&self) -> RuleInfo {
        RuleInfo {
            name:     "Deep nested loops",
            category: FindingCategory::DeepNestedLoop,
            severity: Severity::Warning
        }
    }

    fn evaluate(&self, metrics: &Metrics) -> Option<Finding> {
        if metrics.nested_loop_depth < self.warn_depth {
            return None;
        }
        let severity = if metrics.nested_loop_depth >= self.warn_depth + 2 {
            Severity::Critical
        } else {
            Severity::Warning
        };
        Some(Finding {
            severity,
            category: FindingCategory::DeepNestedLoop,
            title: "Deep nested loop join".to_string(),
            description: format!(
                "The plan nests {} loop joins; row counts multiply at every level.",
                metrics.nested_loop_depth
            ),
            recommendation: "Break the query apart or ensure every join level is driven by an \
                             index"
                .to_string()
        })
    }
}

/// Index merge: two indexes combined to satisfy one condition.
pub struct IndexMergeRule;

impl Rule for IndexMergeRule {
    fn info(&self) -> RuleInfo {
        RuleInfo {
            name:     "Index merge",
            category: FindingCategory::IndexMerge,
            severity: Severity::Warning
        }
    }

    fn evaluate(&self, metrics: &Metrics) -> Option<Finding> {
        if !metrics.has_index_merge {
            return None;
        }
        Some(Finding {
            severity:       Severity::Warning,
            category:       FindingCategory::IndexMerge,
            title:          "Index merge".to_string(),
            description:    "The optimizer combines multiple single-column indexes to satisfy \
                             the condition."
                .to_string(),
            recommendation: "Create one composite index covering the combined columns instead"
                .to_string()
        })
    }
}
