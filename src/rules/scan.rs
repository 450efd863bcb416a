//! Rules about how tables are reached: full scans and missing indexes.

use super::{Finding, FindingCategory, Rule, RuleInfo, Severity};
use crate::metrics::{AccessType, Metrics};

/// Full table scan that was not requested on purpose.
///
/// Escalates to critical once the examined row count crosses
/// `critical_rows`.
pub struct FullTableScanRule {
    pub critical_rows: u64
}

impl Rule for FullTableScanRule {
    fn info(&self) -> RuleInfo {
        RuleInfo {
            name:     "Full table scan",
            category: FindingCategory::FullTableScan,
            severity: Severity::Warning
        }
    }

    fn evaluate(&self, metrics: &Metrics) -> Option<Finding> {
        if !metrics.has_table_scan || metrics.is_intentional_scan {
            return None;
        }
        let examined = metrics.rows_examined.unwrap_or(0);
        let severity = if examined >= self.critical_rows {
            Severity::Critical
        } else {
            Severity::Warning
        };
        let description = match metrics.rows_examined {
            Some(examined) => format!(
                "The query reads the whole table ({} rows examined) even though it filters the \
                 result.",
                examined
            ),
            None => "The query reads the whole table even though it filters the result."
                .to_string()
        };
        Some(Finding {
            severity,
            category: FindingCategory::FullTableScan,
            title: "Full table scan".to_string(),
            description,
            recommendation: "Add an index supporting the filter columns so the scan becomes a \
                             lookup"
                .to_string()
        })
    }
}

/// Query touches tables without any usable index.
///
/// Requires plan evidence of the access path: a query analyzed statically,
/// with no access type and no observed scan, is not accused.
pub struct NoIndexRule;

impl Rule for NoIndexRule {
    fn info(&self) -> RuleInfo {
        RuleInfo {
            name:     "No index used",
            category: FindingCategory::NoIndex,
            severity: Severity::Critical
        }
    }

    fn evaluate(&self, metrics: &Metrics) -> Option<Finding> {
        if metrics.is_index_backed
            || !metrics.indexes_used.is_empty()
            || metrics.tables_accessed.is_empty()
            || metrics.is_intentional_scan
            || metrics.is_zero_row_const
        {
            return None;
        }
        if matches!(
            metrics.primary_access_type,
            Some(AccessType::ConstRow) | Some(AccessType::SingleRowLookup)
        ) {
            return None;
        }
        if metrics.primary_access_type.is_none() && !metrics.has_table_scan {
            return None;
        }
        Some(Finding {
            severity:       Severity::Critical,
            category:       FindingCategory::NoIndex,
            title:          "No index used".to_string(),
            description:    format!(
                "No index supports this query on {}; every row has to be inspected.",
                metrics
                    .tables_accessed
                    .iter()
                    .map(|t| t.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            recommendation: "Add an index on the columns in the WHERE and JOIN clauses"
                .to_string()
        })
    }
}
