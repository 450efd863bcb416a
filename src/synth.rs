//! Composite index synthesis from query shape and metrics.
//!
//! Proposals follow the standard composite-index column order: equality
//! columns first (most selective first), then at most one range column,
//! then sort columns. Nothing is proposed for intentional full scans; an
//! index cannot help a query whose purpose is to read everything.

use compact_str::CompactString;
use indexmap::IndexSet;
use serde::Serialize;

use crate::{
    metrics::Metrics,
    shape::{Predicate, PredicateKind, QueryShape}
};

/// Expected payoff class of a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactClass {
    High,
    Medium,
    Low
}

impl std::fmt::Display for ImpactClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low")
        }
    }
}

/// A candidate composite index.
#[derive(Debug, Clone, Serialize)]
pub struct IndexProposal {
    pub table:     CompactString,
    pub columns:   Vec<CompactString>,
    pub rationale: String,
    pub impact:    ImpactClass,
    /// Ready-to-run DDL for the proposal
    pub statement: String
}

/// Propose composite indexes for the query.
///
/// Returns an empty list for intentional scans and for queries without
/// usable predicates. Proposals are de-duplicated by (table, column tuple).
#[must_use]
pub fn synthesize(shape: &QueryShape, metrics: &Metrics) -> Vec<IndexProposal> {
    if metrics.is_intentional_scan || shape.is_intentional_full_scan {
        return Vec::new();
    }
    let warranted =
        metrics.has_table_scan || !metrics.is_index_backed || metrics.has_index_merge;
    if !warranted {
        return Vec::new();
    }
    if shape.tables.is_empty() {
        return Vec::new();
    }

    let mut proposals = Vec::new();
    let mut seen: IndexSet<String> = IndexSet::new();

    for table in &shape.tables {
        let Some(columns) = columns_for_table(shape, table) else {
            continue;
        };
        let fingerprint = format!("{}:{}", table, columns.join(","));
        if !seen.insert(fingerprint) {
            continue;
        }
        let impact = if metrics.has_table_scan {
            ImpactClass::High
        } else if metrics.has_index_merge {
            ImpactClass::Medium
        } else {
            ImpactClass::Low
        };
        let column_list = columns
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        proposals.push(IndexProposal {
            table:     table.clone(),
            rationale: rationale_for(shape, &columns),
            impact,
            statement: format!(
                "CREATE INDEX idx_{}_{} ON {} ({})",
                table.replace('.', "_"),
                columns
                    .iter()
                    .map(|c| c.as_str())
                    .collect::<Vec<_>>()
                    .join("_"),
                table,
                column_list
            ),
            columns
        });
    }

    proposals
}

/// Column order for one table: equalities by ascending selectivity
/// estimate, then one range column, then sort columns.
fn columns_for_table(shape: &QueryShape, table: &CompactString) -> Option<Vec<CompactString>> {
    let relevant = |predicate: &&Predicate| applies_to(predicate, table, shape);

    let mut equalities: Vec<&Predicate> = shape
        .where_predicates
        .iter()
        .chain(shape.join_predicates.iter())
        .filter(|p| p.kind == PredicateKind::Equality)
        .filter(relevant)
        .collect();
    equalities.sort_by(|a, b| {
        selectivity_estimate(&a.column)
            .partial_cmp(&selectivity_estimate(&b.column))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let range = shape
        .where_predicates
        .iter()
        .filter(|p| p.kind == PredicateKind::Range)
        .find(relevant);

    let mut columns: Vec<CompactString> = Vec::new();
    for predicate in equalities {
        if !columns.contains(&predicate.column) {
            columns.push(predicate.column.clone());
        }
    }
    if let Some(range) = range
        && !columns.contains(&range.column)
    {
        columns.push(range.column.clone());
    }
    for order_column in &shape.order_columns {
        if !columns.contains(order_column) {
            columns.push(order_column.clone());
        }
    }

    if columns.is_empty() { None } else { Some(columns) }
}

/// Attribute a predicate to a table.
///
/// Qualified columns must match the table name or its leading alias
/// character sequence; unqualified columns fall to the first table.
fn applies_to(predicate: &Predicate, table: &CompactString, shape: &QueryShape) -> bool {
    match &predicate.qualifier {
        Some(qualifier) => {
            qualifier == table
                || table
                    .split('.')
                    .next_back()
                    .is_some_and(|base| qualifier == base)
                || table.starts_with(qualifier.as_str())
        }
        None => shape.tables.first() == Some(table)
    }
}

/// Crude selectivity ranking used to order equality columns; lower sorts
/// first. Identity-like columns beat status flags.
fn selectivity_estimate(column: &CompactString) -> f64 {
    let lower = column.to_ascii_lowercase();
    if lower == "id" || lower == "uuid" || lower.ends_with("_id") || lower.ends_with("_uuid") {
        0.001
    } else if lower.contains("email") || lower.contains("token") || lower.contains("hash") {
        0.01
    } else if lower.starts_with("is_")
        || lower.starts_with("has_")
        || lower == "active"
        || lower == "enabled"
        || lower == "deleted"
        || lower == "status"
        || lower == "state"
    {
        0.5
    } else {
        0.1
    }
}

fn rationale_for(shape: &QueryShape, columns: &[CompactString]) -> String {
    let mut parts = Vec::new();
    if shape
        .where_predicates
        .iter()
        .any(|p| columns.contains(&p.column))
    {
        parts.push("filters in WHERE");
    }
    if shape
        .join_predicates
        .iter()
        .any(|p| columns.contains(&p.column))
    {
        parts.push("join keys");
    }
    if shape.order_columns.iter().any(|c| columns.contains(c)) {
        parts.push("ORDER BY columns");
    }
    if parts.is_empty() {
        "covers the query's access pattern".to_string()
    } else {
        format!("covers the {} used by this query", parts.join(" and "))
    }
}
