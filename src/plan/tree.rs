//! Tree/JSON EXPLAIN parsing.
//!
//! Accepts `EXPLAIN FORMAT=JSON` style documents: nested objects where plan
//! nodes carry an `access_type`, table/index names, row estimates, and
//! optionally runtime counters from ANALYZE. The walker is structural, not
//! schema-bound: it recognizes node fields wherever they appear, so wrapper
//! keys like `query_block` or `nested_loop` need no special casing to be
//! traversed.

use compact_str::CompactString;
use serde_json::Value;

use super::tabular::{self, ExtraFlags};
use crate::{
    metrics::{Metrics, TableEstimate},
    report::Diagnostic
};

/// Parse a JSON plan tree into raw metrics.
#[must_use]
pub fn parse(tree: &Value) -> (Metrics, Vec<Diagnostic>) {
    let mut walk = Walk::default();
    visit(tree, 0, &mut walk);

    let mut metrics = Metrics::default();
    let mut diagnostics = Vec::new();

    if let Some((raw, node)) = &walk.primary {
        metrics.mysql_access_type = Some(raw.clone());
        match tabular::map_access(raw, flags_for(node)) {
            Some((access, complexity)) => {
                metrics.primary_access_type = Some(access);
                metrics.complexity = Some(complexity);
                metrics.is_index_backed = access.is_index_backed();
                if access == crate::metrics::AccessType::ZeroRowConst {
                    metrics.is_zero_row_const = true;
                }
                if access == crate::metrics::AccessType::TableScan {
                    metrics.has_table_scan = true;
                }
            }
            None => diagnostics.push(Diagnostic::parse_warning(format!(
                "unrecognized access_type '{}' in plan tree",
                raw
            )))
        }
    }

    if walk.saw_table_scan {
        metrics.has_table_scan = true;
    }
    metrics.has_covering_index = walk.covering;
    metrics.has_index_merge = walk.index_merge;
    metrics.has_temp_table = walk.temp_table;
    metrics.has_disk_temp = walk.disk_temp;
    metrics.has_filesort = walk.filesort;
    metrics.has_weedout = walk.weedout;
    metrics.has_early_termination = walk.early_termination;
    metrics.nested_loop_depth = walk.nested_loop_depth;
    metrics.max_loops = walk.max_loops as u64;
    metrics.indexes_used = walk.indexes.into_iter().collect();
    metrics.per_table_estimates = walk.estimates.into_iter().collect();
    metrics.tables_accessed = walk.tables;

    if walk.examined > 0.0 {
        metrics.rows_examined = Some(walk.examined.round() as u64);
    } else if metrics.is_zero_row_const {
        metrics.rows_examined = Some(0);
    }
    let returned = walk
        .root_actual_rows
        .or_else(|| walk.primary.as_ref().and_then(|(_, node)| node.actual_rows));
    if let Some(returned) = returned {
        metrics.rows_returned = Some(returned.round() as u64);
    } else if metrics.is_zero_row_const {
        metrics.rows_returned = Some(0);
    }
    if let Some(ms) = walk.root_time_ms {
        metrics.execution_time_ms = Some(ms);
    }
    if let (Some(returned), Some(driving)) = (walk.root_actual_rows, walk.driving_rows)
        && driving > 0.0
    {
        metrics.fanout_factor = (returned / driving).max(1.0);
    }

    if walk.node_count == 0 {
        diagnostics.push(Diagnostic::parse_warning(
            "plan tree contained no recognizable nodes"
        ));
    }

    (metrics, diagnostics)
}

/// A plan node as far as the walker cares: the subset of keys recognized on
/// any JSON object that describes an access.
#[derive(Debug, Clone, Default)]
struct Node {
    table:          Option<CompactString>,
    key:            Option<CompactString>,
    estimated_rows: Option<f64>,
    actual_rows:    Option<f64>,
    loops:          Option<f64>,
    using_index:    bool,
    message:        Option<String>
}

#[derive(Default)]
struct Walk {
    node_count:        usize,
    primary:           Option<(CompactString, Node)>,
    saw_table_scan:    bool,
    covering:          bool,
    index_merge:       bool,
    temp_table:        bool,
    disk_temp:         bool,
    filesort:          bool,
    weedout:           bool,
    early_termination: bool,
    nested_loop_depth: u32,
    max_loops:         f64,
    examined:          f64,
    root_actual_rows:  Option<f64>,
    driving_rows:      Option<f64>,
    root_time_ms:      Option<f64>,
    indexes:           indexmap::IndexSet<CompactString>,
    estimates:         Vec<(CompactString, TableEstimate)>,
    tables:            Vec<CompactString>
}

fn visit(value: &Value, join_depth: u32, walk: &mut Walk) {
    match value {
        Value::Object(obj) => {
            let access = obj.get("access_type").and_then(Value::as_str);
            if let Some(raw) = access {
                let node = read_node(obj);
                record_node(raw, &node, join_depth, walk);
            }

            collect_shape_flags(obj, walk);

            for (key, child) in obj {
                let child_depth = match key.as_str() {
                    "nested_loop" => {
                        if let Value::Array(items) = child {
                            let joins = items.len().saturating_sub(1) as u32;
                            walk.nested_loop_depth =
                                walk.nested_loop_depth.max(join_depth + joins);
                        }
                        join_depth + 1
                    }
                    _ => join_depth
                };
                visit(child, child_depth, walk);
            }
        }
        Value::Array(items) => {
            for item in items {
                visit(item, join_depth, walk);
            }
        }
        _ => {}
    }
}

fn read_node(obj: &serde_json::Map<String, Value>) -> Node {
    Node {
        table:          str_field(obj, &["table_name", "table"]),
        key:            str_field(obj, &["key", "index", "used_key"]),
        estimated_rows: num_field(
            obj,
            &["rows_examined_per_scan", "estimated_rows", "rows"]
        ),
        actual_rows:    num_field(obj, &["actual_rows", "rows_produced"]),
        loops:          num_field(obj, &["actual_loops", "loops"]),
        using_index:    obj.get("using_index").and_then(Value::as_bool).unwrap_or(false),
        message:        obj.get("message").and_then(Value::as_str).map(str::to_string)
    }
}

fn flags_for(node: &Node) -> ExtraFlags {
    ExtraFlags {
        no_matching_row: node
            .message
            .as_deref()
            .is_some_and(|m| {
                let lower = m.to_ascii_lowercase();
                lower.contains("no matching row") || lower.contains("impossible where")
            }),
        ..ExtraFlags::default()
    }
}

fn record_node(raw: &str, node: &Node, join_depth: u32, walk: &mut Walk) {
    walk.node_count += 1;

    if walk.primary.is_none() {
        walk.primary = Some((raw.into(), node.clone()));
        walk.driving_rows = node.actual_rows.or(node.estimated_rows);
    }

    let lower = raw.to_ascii_lowercase();
    if lower == "all" {
        walk.saw_table_scan = true;
    }
    if lower == "index_merge" {
        walk.index_merge = true;
    }
    if node.using_index {
        walk.covering = true;
    }
    if join_depth > 0 {
        walk.nested_loop_depth = walk.nested_loop_depth.max(join_depth);
    }

    if let Some(key) = &node.key {
        for name in tabular::split_keys(key) {
            walk.indexes.insert(name);
        }
    }

    let loops = node.loops.unwrap_or(1.0).max(1.0);
    walk.max_loops = walk.max_loops.max(node.loops.unwrap_or(0.0));
    if let Some(actual) = node.actual_rows {
        walk.examined += actual * loops;
    } else if let Some(estimated) = node.estimated_rows {
        walk.examined += estimated;
    }

    if let Some(table) = &node.table {
        if !walk.tables.contains(table) {
            walk.tables.push(table.clone());
        }
        walk.estimates.push((
            table.clone(),
            TableEstimate {
                estimated_rows: node.estimated_rows,
                actual_rows:    node.actual_rows,
                loops:          node.loops
            }
        ));
    }
}

/// Plan-shape markers can appear on any object, not just access nodes.
fn collect_shape_flags(obj: &serde_json::Map<String, Value>, walk: &mut Walk) {
    if bool_field(obj, "using_temporary_table") {
        walk.temp_table = true;
    }
    if bool_field(obj, "using_disk_temporary_table") || bool_field(obj, "disk_based") {
        walk.temp_table = true;
        walk.disk_temp = true;
    }
    if bool_field(obj, "using_filesort") {
        walk.filesort = true;
    }
    if let Some(strategy) = str_field(obj, &["strategy", "semijoin_strategy"])
        && strategy.to_ascii_lowercase().contains("weedout")
    {
        walk.weedout = true;
    }
    if obj.contains_key("limit_offset") || obj.contains_key("limit") {
        walk.early_termination = true;
    }
    if let Some(operation) = str_field(obj, &["operation"]) {
        let lower = operation.to_ascii_lowercase();
        if lower.starts_with("limit") {
            walk.early_termination = true;
        }
        if lower.contains("weedout") || lower.contains("remove duplicates") {
            walk.weedout = true;
        }
    }
    if walk.root_actual_rows.is_none()
        && obj.get("access_type").is_none()
        && let Some(rows) = num_field(obj, &["actual_rows"])
    {
        walk.root_actual_rows = Some(rows);
    }
    if walk.root_time_ms.is_none()
        && let Some(ms) = num_field(obj, &["actual_time_ms", "execution_time_ms", "time_ms"])
    {
        walk.root_time_ms = Some(ms);
    }
}

fn str_field(
    obj: &serde_json::Map<String, Value>,
    names: &[&str]
) -> Option<CompactString> {
    names
        .iter()
        .find_map(|name| obj.get(*name).and_then(Value::as_str))
        .map(CompactString::from)
}

fn num_field(obj: &serde_json::Map<String, Value>, names: &[&str]) -> Option<f64> {
    names.iter().find_map(|name| {
        let value = obj.get(*name)?;
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None
        }
    })
}

fn bool_field(obj: &serde_json::Map<String, Value>, name: &str) -> bool {
    obj.get(name).and_then(Value::as_bool).unwrap_or(false)
}
