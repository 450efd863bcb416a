//! Structural feature extraction from sanitized SQL.
//!
//! The shape parser is tolerant and feature-extracting, not grammatically
//! complete: it prefers a real `sqlparser` AST when the statement parses,
//! and degrades to token-level extraction when it does not. It never fails.
//!
//! Clause presence is decided by whole-word, case-insensitive matching with
//! string literals masked out, so `WHERE` inside a quoted value does not
//! count as a WHERE clause.

mod extract;
mod fallback;

use std::sync::OnceLock;

use compact_str::CompactString;
use regex::Regex;
use serde::Serialize;

use crate::guard;

/// Kind of statement, as far as shape analysis cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[non_exhaustive]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    #[default]
    Other
}

/// How a predicate constrains its column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PredicateKind {
    /// `=`, `IN`: a point constraint usable as an index prefix
    Equality,
    /// `<`, `>`, `BETWEEN`, `LIKE`: a range constraint
    Range
}

/// A column constraint found in WHERE or an ON clause.
#[derive(Debug, Clone, Serialize)]
pub struct Predicate {
    /// Table alias or name qualifying the column, when written
    pub qualifier: Option<CompactString>,
    pub column:    CompactString,
    pub kind:      PredicateKind
}

/// Query anti-patterns surfaced by shape analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum AntiPattern {
    SelectStar,
    LeadingWildcardLike,
    FunctionOnColumn,
    ImplicitCast
}

impl AntiPattern {
    pub fn title(self) -> &'static str {
        match self {
            Self::SelectStar => "SELECT * fetches every column",
            Self::LeadingWildcardLike => "Leading wildcard in LIKE",
            Self::FunctionOnColumn => "Function call on column in WHERE",
            Self::ImplicitCast => "Implicit cast in comparison"
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::SelectStar => {
                "The query selects all columns, which widens the row payload and defeats \
                 covering indexes."
            }
            Self::LeadingWildcardLike => {
                "A LIKE pattern starting with a wildcard cannot use an index on the matched \
                 column."
            }
            Self::FunctionOnColumn => {
                "Wrapping a column in a function inside WHERE prevents the optimizer from \
                 using an index on that column."
            }
            Self::ImplicitCast => {
                "Comparing a column against a quoted numeric literal forces a type conversion \
                 that can disable index usage."
            }
        }
    }

    pub fn recommendation(self) -> &'static str {
        match self {
            Self::SelectStar => "Select only the columns the caller actually reads",
            Self::LeadingWildcardLike => "Use full-text search or anchor the pattern prefix",
            Self::FunctionOnColumn => {
                "Rewrite the condition on the bare column or add a functional index"
            }
            Self::ImplicitCast => "Compare using the column's native type"
        }
    }
}

/// Structural features of one sanitized statement.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryShape {
    pub kind: StatementKind,
    /// Base tables in FROM/JOIN order, backticks stripped
    pub tables: Vec<CompactString>,
    pub has_where: bool,
    pub has_join: bool,
    pub has_group_by: bool,
    pub has_having: bool,
    pub has_order_by: bool,
    pub has_limit: bool,
    pub where_predicates: Vec<Predicate>,
    pub join_predicates: Vec<Predicate>,
    pub order_columns: Vec<CompactString>,
    pub anti_patterns: Vec<AntiPattern>,
    pub is_intentional_full_scan: bool
}

/// Extract structural features from sanitized SQL. Never fails.
#[must_use]
pub fn parse_shape(sql: &str) -> QueryShape {
    let mut shape = QueryShape {
        kind: statement_kind(sql),
        ..QueryShape::default()
    };

    let masked = mask_literals(sql);
    shape.has_where = where_re().is_match(&masked);
    shape.has_join = join_re().is_match(&masked);
    shape.has_group_by = group_by_re().is_match(&masked);
    shape.has_having = having_re().is_match(&masked);
    shape.has_order_by = order_by_re().is_match(&masked);
    shape.has_limit = limit_re().is_match(&masked);

    if let Some(ast) = extract::extract(sql) {
        shape.tables = ast.tables;
        shape.where_predicates = ast.where_predicates;
        shape.join_predicates = ast.join_predicates;
        shape.order_columns = ast.order_columns;
    } else {
        fallback::extract_into(&mut shape, &masked);
    }

    shape.anti_patterns = detect_anti_patterns(sql, &masked);
    shape.is_intentional_full_scan = intentional(&shape, sql);
    shape
}

/// Whether reading the whole table is the query's purpose.
///
/// True iff the statement begins with SELECT and contains none of WHERE,
/// JOIN, GROUP BY, HAVING, ORDER BY. A terminal LIMIT is permitted.
/// UPDATE and DELETE are never intentional scans.
#[must_use]
pub fn is_intentional_full_scan(sql: &str) -> bool {
    parse_shape(sql).is_intentional_full_scan
}

fn intentional(shape: &QueryShape, sql: &str) -> bool {
    let starts_with_select = sql
        .trim_start()
        .get(..6)
        .is_some_and(|head| head.eq_ignore_ascii_case("SELECT"));
    starts_with_select
        && !shape.has_where
        && !shape.has_join
        && !shape.has_group_by
        && !shape.has_having
        && !shape.has_order_by
        && shape.tables.len() <= 1
}

fn statement_kind(sql: &str) -> StatementKind {
    match guard::first_keyword(sql).as_deref() {
        Some("SELECT") | Some("WITH") => StatementKind::Select,
        Some("INSERT") | Some("REPLACE") => StatementKind::Insert,
        Some("UPDATE") => StatementKind::Update,
        Some("DELETE") => StatementKind::Delete,
        _ => StatementKind::Other
    }
}

/// Replace quoted literal contents with spaces so clause keywords inside
/// strings never match.
pub(crate) fn mask_literals(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut in_quote: Option<char> = None;
    for c in sql.chars() {
        match in_quote {
            Some(q) => {
                if c == q {
                    in_quote = None;
                }
                out.push(' ');
            }
            None => {
                if c == '\'' || c == '"' {
                    in_quote = Some(c);
                    out.push(' ');
                } else {
                    out.push(c);
                }
            }
        }
    }
    out
}

/// Compile a hardcoded pattern.
pub(crate) fn compile(pattern: &str) -> Regex {
    #[allow(clippy::expect_used)]
    Regex::new(pattern).expect("hardcoded pattern compiles")
}

macro_rules! clause_regex {
    ($name:ident, $pattern:literal) => {
        fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| compile($pattern))
        }
    };
}

clause_regex!(where_re, r"(?i)\bWHERE\b");
clause_regex!(join_re, r"(?i)\bJOIN\b");
clause_regex!(group_by_re, r"(?i)\bGROUP\s+BY\b");
clause_regex!(having_re, r"(?i)\bHAVING\b");
clause_regex!(order_by_re, r"(?i)\bORDER\s+BY\b");
clause_regex!(limit_re, r"(?i)\bLIMIT\b");
clause_regex!(select_star_re, r"(?i)\bSELECT\s+(?:\w+\.)?\*");
clause_regex!(leading_wildcard_re, r"(?i)\bLIKE\s+'%");
clause_regex!(
    function_on_column_re,
    r"(?i)\bWHERE\b.*\b(?:YEAR|MONTH|DAY|DATE|UPPER|LOWER|TRIM|SUBSTRING|CAST|CONVERT|COALESCE)\s*\("
);
clause_regex!(implicit_cast_re, r"(?:=|>=|<=|>|<)\s*'\d+(?:\.\d+)?'");

fn detect_anti_patterns(sql: &str, masked: &str) -> Vec<AntiPattern> {
    let mut found = Vec::new();
    if select_star_re().is_match(masked) {
        found.push(AntiPattern::SelectStar);
    }
    if leading_wildcard_re().is_match(sql) {
        found.push(AntiPattern::LeadingWildcardLike);
    }
    if function_on_column_re().is_match(masked) {
        found.push(AntiPattern::FunctionOnColumn);
    }
    if implicit_cast_re().is_match(sql) {
        found.push(AntiPattern::ImplicitCast);
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intentional_plain_select() {
        assert!(is_intentional_full_scan("SELECT id, name FROM users"));
    }

    #[test]
    fn test_intentional_allows_terminal_limit() {
        assert!(is_intentional_full_scan("SELECT id FROM users LIMIT 100"));
    }

    #[test]
    fn test_not_intentional_with_where() {
        assert!(!is_intentional_full_scan("SELECT id FROM users WHERE id = 1"));
    }

    #[test]
    fn test_not_intentional_with_order_by() {
        assert!(!is_intentional_full_scan("SELECT id FROM users ORDER BY id"));
    }

    #[test]
    fn test_not_intentional_for_update() {
        assert!(!is_intentional_full_scan("UPDATE users SET active = 0"));
    }

    #[test]
    fn test_clause_inside_string_does_not_count() {
        let shape = parse_shape("SELECT 'WHERE is a word' FROM notes");
        assert!(!shape.has_where);
        assert!(shape.is_intentional_full_scan);
    }

    #[test]
    fn test_tables_from_join() {
        let shape = parse_shape("SELECT u.id FROM users u JOIN orders o ON u.id = o.user_id");
        assert_eq!(shape.tables.len(), 2);
        assert!(shape.has_join);
        assert!(!shape.is_intentional_full_scan);
    }

    #[test]
    fn test_backtick_tables() {
        let shape = parse_shape("SELECT * FROM `users` WHERE `email` = 'x'");
        assert!(shape.tables.iter().any(|t| t == "users"));
    }

    #[test]
    fn test_anti_pattern_select_star() {
        let shape = parse_shape("SELECT * FROM users");
        assert!(shape.anti_patterns.contains(&AntiPattern::SelectStar));
    }

    #[test]
    fn test_anti_pattern_leading_wildcard() {
        let shape = parse_shape("SELECT id FROM users WHERE name LIKE '%smith'");
        assert!(shape.anti_patterns.contains(&AntiPattern::LeadingWildcardLike));
    }

    #[test]
    fn test_anti_pattern_function_on_column() {
        let shape = parse_shape("SELECT id FROM users WHERE YEAR(created_at) = 2024");
        assert!(shape.anti_patterns.contains(&AntiPattern::FunctionOnColumn));
    }

    #[test]
    fn test_anti_pattern_implicit_cast() {
        let shape = parse_shape("SELECT id FROM users WHERE id = '42'");
        assert!(shape.anti_patterns.contains(&AntiPattern::ImplicitCast));
    }

    #[test]
    fn test_predicates_classified() {
        let shape = parse_shape(
            "SELECT * FROM orders WHERE status = 'open' AND total > 100 ORDER BY created_at"
        );
        assert!(
            shape
                .where_predicates
                .iter()
                .any(|p| p.column == "status" && p.kind == PredicateKind::Equality)
        );
        assert!(
            shape
                .where_predicates
                .iter()
                .any(|p| p.column == "total" && p.kind == PredicateKind::Range)
        );
        assert!(shape.order_columns.iter().any(|c| c == "created_at"));
    }

    #[test]
    fn test_placeholder_sql_still_extracts() {
        let shape = parse_shape("SELECT id FROM users WHERE email = ? AND active = ?");
        assert!(shape.tables.iter().any(|t| t == "users"));
        assert!(shape.has_where);
    }
}
