//! Token-level extraction for statements `sqlparser` rejects.
//!
//! This path only sees SQL with literals already masked; it recovers table
//! names, rough predicate columns, and ORDER BY columns with regexes. The
//! goal is tolerance, not completeness.

use std::sync::OnceLock;

use compact_str::CompactString;
use regex::Regex;

use super::{Predicate, PredicateKind, QueryShape, compile};

fn from_segment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        compile(r"(?i)\bFROM\s+(.+?)(?:\s+WHERE\b|\s+GROUP\s+BY\b|\s+HAVING\b|\s+ORDER\s+BY\b|\s+LIMIT\b|\s*$)")
    })
}

fn join_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| compile(r"(?i)\bJOIN\s+`?([A-Za-z_][A-Za-z0-9_.]*)`?"))
}

fn comparison_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        compile(r"(?i)([A-Za-z_][A-Za-z0-9_.]*)\s*(=|!=|<>|>=|<=|>|<|\bLIKE\b|\bBETWEEN\b|\bIN\b)")
    })
}

fn order_segment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| compile(r"(?i)\bORDER\s+BY\s+(.+?)(?:\s+LIMIT\b|\s*$)"))
}

/// Populate tables, predicates, and order columns on a best-effort basis.
pub(super) fn extract_into(shape: &mut QueryShape, masked: &str) {
    if let Some(caps) = from_segment_re().captures(masked)
        && let Some(segment) = caps.get(1)
    {
        for part in segment.as_str().split(',') {
            let Some(name) = part.split_whitespace().next() else {
                continue;
            };
            let name = name.trim_matches('`');
            if !name.is_empty() && !name.starts_with('(') {
                let table: CompactString = name.into();
                if !shape.tables.contains(&table) {
                    shape.tables.push(table);
                }
            }
        }
    }
    for caps in join_re().captures_iter(masked) {
        if let Some(name) = caps.get(1) {
            let table: CompactString = name.as_str().into();
            if !shape.tables.contains(&table) {
                shape.tables.push(table);
            }
        }
    }

    if shape.has_where
        && let Some(where_pos) = masked.to_ascii_uppercase().find("WHERE")
    {
        let clause = &masked[where_pos..];
        for caps in comparison_re().captures_iter(clause) {
            let (Some(column), Some(op)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            let raw = column.as_str();
            if raw.eq_ignore_ascii_case("WHERE") || raw.eq_ignore_ascii_case("AND") {
                continue;
            }
            let kind = match op.as_str().to_ascii_uppercase().as_str() {
                "=" | "IN" => PredicateKind::Equality,
                _ => PredicateKind::Range
            };
            let (qualifier, column) = split_qualified(raw);
            shape.where_predicates.push(Predicate {
                qualifier,
                column,
                kind
            });
        }
    }

    if let Some(caps) = order_segment_re().captures(masked)
        && let Some(segment) = caps.get(1)
    {
        for part in segment.as_str().split(',') {
            let Some(name) = part.split_whitespace().next() else {
                continue;
            };
            let (_, column) = split_qualified(name.trim_matches('`'));
            if !column.is_empty() {
                shape.order_columns.push(column);
            }
        }
    }
}

fn split_qualified(raw: &str) -> (Option<CompactString>, CompactString) {
    match raw.rsplit_once('.') {
        Some((qualifier, column)) => (Some(qualifier.into()), column.into()),
        None => (None, raw.into())
    }
}
