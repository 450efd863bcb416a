//! Plain-text EXPLAIN ANALYZE parsing.
//!
//! Handles the line-oriented tree format:
//!
//! ```text
//! -> Limit: 10 row(s)  (cost=105 rows=10) (actual time=0.05..1.20 rows=10 loops=1)
//!     -> Nested loop inner join  (cost=105 rows=200) (actual time=0.05..1.10 rows=10 loops=1)
//!         -> Table scan on users  (cost=10 rows=100) (actual time=0.02..0.40 rows=100 loops=1)
//!         -> Index lookup on orders using idx_user (user_id=users.id)  (actual time=0.01..0.01 rows=2 loops=100)
//! ```
//!
//! Indentation defines the tree; each line is classified by its operation
//! prefix. Unrecognized operations are skipped, counted, and reported as a
//! single parse warning.

use std::sync::OnceLock;

use compact_str::CompactString;
use indexmap::IndexSet;
use regex::Regex;

use crate::{
    metrics::{AccessType, Metrics, TableEstimate},
    report::Diagnostic,
    shape::compile
};

fn line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        compile(
            r"(?x)^(?P<indent>\s*)->\s*(?P<op>.+?)
              (?:\s+\(cost=(?P<cost>[0-9.eE+]+)(?:\.\.[0-9.eE+]+)?(?:\s+rows=(?P<est>[0-9.eE+]+))?\))?
              (?:\s+\(actual\ time=(?P<t0>[0-9.]+)\.\.(?P<t1>[0-9.]+)\s+rows=(?P<rows>[0-9.eE+]+)\s+loops=(?P<loops>[0-9.eE+]+)\))?\s*$"
        )
    })
}

fn on_table_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| compile(r"(?i)\bon\s+`?([A-Za-z_][A-Za-z0-9_.]*)`?"))
}

fn using_index_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| compile(r"(?i)\busing\s+`?([A-Za-z_][A-Za-z0-9_.]*)`?"))
}

/// Parse EXPLAIN ANALYZE text output into raw metrics.
#[must_use]
pub fn parse(text: &str) -> (Metrics, Vec<Diagnostic>) {
    let mut metrics = Metrics::default();
    let mut diagnostics = Vec::new();
    let mut indexes: IndexSet<CompactString> = IndexSet::new();

    // (indent, is_nested_loop) ancestors of the current line
    let mut stack: Vec<(usize, bool)> = Vec::new();
    let mut root_seen = false;
    let mut skipped = 0usize;
    let mut parsed_any = false;

    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let Some(caps) = line_re().captures(line) else {
            skipped += 1;
            continue;
        };
        parsed_any = true;

        let indent = caps.name("indent").map_or(0, |m| m.as_str().len());
        let op = caps.name("op").map_or("", |m| m.as_str());
        let estimated = caps.name("est").and_then(|m| m.as_str().parse::<f64>().ok());
        let actual_rows = caps.name("rows").and_then(|m| m.as_str().parse::<f64>().ok());
        let loops = caps.name("loops").and_then(|m| m.as_str().parse::<f64>().ok());
        let time_last = caps.name("t1").and_then(|m| m.as_str().parse::<f64>().ok());

        while stack.last().is_some_and(|(i, _)| *i >= indent) {
            stack.pop();
        }
        let join_ancestors = stack.iter().filter(|(_, nested)| *nested).count() as u32;

        if !root_seen {
            root_seen = true;
            if let Some(rows) = actual_rows {
                metrics.rows_returned = Some(rows.round() as u64);
            }
            if let Some(ms) = time_last {
                metrics.execution_time_ms = Some(ms);
            }
        }

        if let Some(loops_n) = loops {
            metrics.max_loops = metrics.max_loops.max(loops_n.round() as u64);
        }

        let lower = op.to_ascii_lowercase();
        let mut is_nested_loop = false;

        if lower.contains("nested loop") {
            is_nested_loop = true;
            metrics.nested_loop_depth = metrics.nested_loop_depth.max(join_ancestors + 1);
        } else if lower.starts_with("limit") {
            metrics.has_early_termination = true;
        } else if lower.starts_with("sort") {
            metrics.has_filesort = true;
        } else if lower.contains("temporary table") || lower.starts_with("materialize") {
            metrics.has_temp_table = true;
            if lower.contains("disk") {
                metrics.has_disk_temp = true;
            }
        } else if lower.contains("weedout") || lower.starts_with("remove duplicates") {
            metrics.has_weedout = true;
        } else if let Some(access) = classify_access(&lower) {
            record_access(
                &mut metrics,
                &mut indexes,
                op,
                access,
                estimated,
                actual_rows,
                loops
            );
            if lower.contains("covering") {
                metrics.has_covering_index = true;
            }
        } else if lower.starts_with("zero rows") || lower.contains("no matching row") {
            metrics.is_zero_row_const = true;
            metrics.rows_examined.get_or_insert(0);
            metrics.rows_returned.get_or_insert(0);
        } else if lower.starts_with("filter")
            || lower.starts_with("aggregate")
            || lower.starts_with("group aggregate")
            || lower.starts_with("stream results")
            || lower.starts_with("hash")
        {
            // structural noise, nothing to extract
        } else {
            skipped += 1;
        }

        stack.push((indent, is_nested_loop));
    }

    metrics.indexes_used = indexes.into_iter().collect();

    if !parsed_any && !text.trim().is_empty() {
        diagnostics.push(Diagnostic::parse_warning(
            "EXPLAIN text output did not match the tree format"
        ));
    } else if skipped > 0 {
        diagnostics.push(Diagnostic::parse_warning(format!(
            "{} unrecognized line(s) in EXPLAIN text output",
            skipped
        )));
    }

    (metrics, diagnostics)
}

fn classify_access(lower: &str) -> Option<AccessType> {
    if lower.starts_with("table scan on") {
        Some(AccessType::TableScan)
    } else if lower.starts_with("single-row index lookup")
        || lower.starts_with("single-row covering index lookup")
    {
        Some(AccessType::SingleRowLookup)
    } else if lower.starts_with("index range scan") {
        Some(AccessType::IndexRangeScan)
    } else if lower.starts_with("index lookup") || lower.starts_with("covering index lookup") {
        Some(AccessType::IndexLookup)
    } else if lower.starts_with("index scan") || lower.starts_with("covering index scan") {
        Some(AccessType::IndexScan)
    } else if lower.starts_with("constant row") || lower.starts_with("rows fetched before") {
        Some(AccessType::ConstRow)
    } else {
        None
    }
}

#[allow(clippy::too_many_arguments)]
fn record_access(
    metrics: &mut Metrics,
    indexes: &mut IndexSet<CompactString>,
    op: &str,
    access: AccessType,
    estimated: Option<f64>,
    actual_rows: Option<f64>,
    loops: Option<f64>
) {
    if metrics.primary_access_type.is_none() {
        metrics.primary_access_type = Some(access);
        metrics.is_index_backed = access.is_index_backed();
        metrics.complexity = Some(access.default_complexity());
    }
    if access == AccessType::TableScan {
        metrics.has_table_scan = true;
    }

    if let Some(caps) = on_table_re().captures(op)
        && let Some(table) = caps.get(1)
    {
        let name: CompactString = table.as_str().into();
        if !metrics.tables_accessed.contains(&name) {
            metrics.tables_accessed.push(name.clone());
        }
        metrics.per_table_estimates.insert(
            name,
            TableEstimate {
                estimated_rows: estimated,
                actual_rows,
                loops
            }
        );
    }
    if access != AccessType::TableScan
        && let Some(caps) = using_index_re().captures(op)
        && let Some(index) = caps.get(1)
    {
        indexes.insert(index.as_str().into());
    }

    let examined = match (actual_rows, loops) {
        (Some(rows), Some(loops_n)) => rows * loops_n.max(1.0),
        (Some(rows), None) => rows,
        (None, _) => estimated.unwrap_or(0.0)
    };
    if examined > 0.0 {
        *metrics.rows_examined.get_or_insert(0) += examined.round() as u64;
    }
}
