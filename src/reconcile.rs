//! Consistency enforcement across metrics.
//!
//! Two operations, applied in sequence by the engine:
//!
//! 1. [`enrich_from_explain`] fills fields that are still unset from tabular
//!    EXPLAIN rows. A primary access type derived by the tree or text parser
//!    is never overridden here.
//! 2. [`validate_consistency`] repairs contradictions between observed and
//!    inferred features and coerces the complexity class.
//!
//! Repairs are recorded as internal diagnostics on the report, never as
//! user-visible findings. Both operations are idempotent: running either a
//! second time on its own output changes nothing.

use crate::{
    metrics::{AccessType, Complexity, Metrics, TableEstimate},
    plan::tabular::{self, ExplainRow},
    report::Diagnostic
};

/// Fill unset metrics from tabular EXPLAIN rows.
///
/// Empty input returns the metrics unchanged. The first mappable row is
/// treated as the driving table; later rows only contribute shape flags,
/// index names, and per-table estimates.
pub fn enrich_from_explain(metrics: &mut Metrics, rows: &[ExplainRow]) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    if rows.is_empty() {
        return diagnostics;
    }

    let mut examined_product: Option<f64> = None;
    let mut primary_candidate_seen = false;

    for row in rows {
        let flags = row.extra.as_deref().map(tabular::parse_extra).unwrap_or_default();
        if flags.covering {
            metrics.has_covering_index = true;
        }
        if flags.temp_table {
            metrics.has_temp_table = true;
        }
        if flags.filesort {
            metrics.has_filesort = true;
        }
        if flags.weedout {
            metrics.has_weedout = true;
        }
        if flags.early_exit {
            metrics.has_early_termination = true;
        }

        if let Some(table) = &row.table {
            if !metrics.tables_accessed.contains(table) {
                metrics.tables_accessed.push(table.clone());
            }
            metrics
                .per_table_estimates
                .entry(table.clone())
                .or_insert(TableEstimate {
                    estimated_rows: row.rows,
                    actual_rows:    None,
                    loops:          None
                });
        }
        if let Some(key) = &row.key {
            for name in tabular::split_keys(key) {
                if !metrics.indexes_used.contains(&name) {
                    metrics.indexes_used.push(name);
                }
            }
        }

        if let Some(rows_estimate) = row.rows {
            examined_product = Some(examined_product.unwrap_or(1.0) * rows_estimate.max(1.0));
        }

        let Some(raw) = &row.access_type else {
            continue;
        };
        match tabular::map_access(raw, flags) {
            Some((access, complexity)) => {
                if !primary_candidate_seen {
                    primary_candidate_seen = true;
                    if metrics.primary_access_type.is_none() {
                        metrics.primary_access_type = Some(access);
                        if metrics.mysql_access_type.is_none() {
                            metrics.mysql_access_type = Some(raw.clone());
                        }
                        if metrics.complexity.is_none() {
                            metrics.complexity = Some(complexity);
                        }
                        if access.is_index_backed() {
                            metrics.is_index_backed = true;
                        }
                    }
                }
                if access == AccessType::TableScan {
                    metrics.has_table_scan = true;
                }
                if access == AccessType::ZeroRowConst {
                    metrics.is_zero_row_const = true;
                    metrics.rows_examined.get_or_insert(0);
                    metrics.rows_returned.get_or_insert(0);
                }
                if raw.eq_ignore_ascii_case("index_merge") {
                    metrics.has_index_merge = true;
                }
            }
            None => diagnostics.push(Diagnostic::parse_warning(format!(
                "unrecognized EXPLAIN type '{}'",
                raw
            )))
        }
    }

    if rows.len() > 1 && metrics.nested_loop_depth == 0 {
        metrics.nested_loop_depth = (rows.len() - 1) as u32;
    }
    if metrics.rows_examined.is_none()
        && let Some(product) = examined_product
    {
        metrics.rows_examined = Some(product.round() as u64);
    }

    diagnostics
}

/// Enforce the metric invariants, repairing contradictions in place.
///
/// Invariants:
///
/// - an access type other than `table_scan` implies `is_index_backed`
/// - `is_zero_row_const` implies O(1) complexity and index backing
/// - zero rows examined without a table scan implies O(1)
/// - `rows_returned` ≤ `rows_examined` is soft: flagged, never rejected
pub fn validate_consistency(metrics: &mut Metrics) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    if let Some(access) = metrics.primary_access_type {
        if access != AccessType::TableScan && !metrics.is_index_backed {
            metrics.is_index_backed = true;
            diagnostics.push(Diagnostic::invariant_repair(format!(
                "access type {} implies index backing, is_index_backed set to true",
                access
            )));
        }
        if access == AccessType::TableScan && !metrics.has_table_scan {
            metrics.has_table_scan = true;
            diagnostics.push(Diagnostic::invariant_repair(
                "primary access is a table scan, has_table_scan set to true"
            ));
        }
    }

    if let Some(coerced) = coerce_complexity(metrics)
        && metrics.complexity != Some(coerced)
    {
        diagnostics.push(Diagnostic::invariant_repair(format!(
            "complexity coerced from {} to {}",
            metrics
                .complexity
                .map_or_else(|| "unset".to_string(), |c| c.to_string()),
            coerced
        )));
        metrics.complexity = Some(coerced);
    }

    if metrics.rows_examined == Some(0)
        && !metrics.has_table_scan
        && metrics.complexity != Some(Complexity::Constant)
    {
        metrics.complexity = Some(Complexity::Constant);
        diagnostics.push(Diagnostic::invariant_repair(
            "zero rows examined without a table scan, complexity reset to O(1)"
        ));
    }

    if metrics.is_zero_row_const {
        if metrics.complexity != Some(Complexity::Constant) {
            metrics.complexity = Some(Complexity::Constant);
            diagnostics.push(Diagnostic::invariant_repair(
                "zero-row const access, complexity reset to O(1)"
            ));
        }
        if !metrics.is_index_backed {
            metrics.is_index_backed = true;
            diagnostics.push(Diagnostic::invariant_repair(
                "zero-row const access is resolved through the index, is_index_backed set"
            ));
        }
    }

    if let (Some(returned), Some(examined)) = (metrics.rows_returned, metrics.rows_examined)
        && returned > examined
    {
        diagnostics.push(Diagnostic::invariant_repair(format!(
            "rows_returned {} exceeds rows_examined {}, estimates look inconsistent",
            returned, examined
        )));
    }

    diagnostics
}

/// Derive the complexity class the evidence supports.
///
/// Returns the class the metrics should carry; `None` when there is no
/// evidence at all. Upgrades only, relative to the access-type baseline:
/// repeated scans inside nested loops raise the class, a filesort on top of
/// a linear scan raises it to O(n log n).
fn coerce_complexity(metrics: &Metrics) -> Option<Complexity> {
    let base = metrics
        .complexity
        .or_else(|| metrics.primary_access_type.map(AccessType::default_complexity))
        .or_else(|| metrics.has_table_scan.then_some(Complexity::Linear))?;

    let mut coerced = base;
    let repeated_scan = metrics.has_table_scan && metrics.max_loops >= 2;
    if repeated_scan {
        coerced = coerced.max(if metrics.nested_loop_depth >= 2 {
            Complexity::Cubic
        } else {
            Complexity::Quadratic
        });
    }
    if coerced == Complexity::Linear && metrics.has_filesort {
        coerced = Complexity::Linearithmic;
    }
    Some(coerced)
}
