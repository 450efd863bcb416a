//! Observed query invocations and their canonical forms.
//!
//! A [`QueryCapture`] is one statement the application actually ran:
//! placeholder SQL, ordered bindings, and the measured wall-clock time. It
//! is immutable after construction and provides two derived forms:
//!
//! - the *interpolated* form, with bindings substituted as SQL literals,
//!   which is what gets handed to EXPLAIN
//! - the *normalized* form, with every literal replaced by `?`, which is
//!   identical for calls differing only in parameters and therefore keys
//!   duplicate detection and N+1 analysis

use std::sync::OnceLock;

use compact_str::CompactString;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    sanitize::sanitize,
    shape::compile
};

/// A single bound parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BindValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String)
}

impl BindValue {
    /// Encode as a SQL literal: integers unquoted, strings single-quoted
    /// with `''` escaping, null as NULL, booleans as 0/1.
    #[must_use]
    pub fn to_sql_literal(&self) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            Self::Bool(true) => "1".to_string(),
            Self::Bool(false) => "0".to_string(),
            Self::Int(value) => value.to_string(),
            Self::Float(value) => value.to_string(),
            Self::Text(value) => format!("'{}'", value.replace('\'', "''"))
        }
    }
}

impl From<i64> for BindValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for BindValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for BindValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for BindValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for BindValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for BindValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// An observed query invocation. Immutable after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryCapture {
    sql:        String,
    #[serde(default)]
    bindings:   Vec<BindValue>,
    elapsed_ms: f64,
    #[serde(default)]
    connection: Option<CompactString>
}

impl QueryCapture {
    #[must_use]
    pub fn new(sql: impl Into<String>, bindings: Vec<BindValue>, elapsed_ms: f64) -> Self {
        Self {
            sql: sql.into(),
            bindings,
            elapsed_ms,
            connection: None
        }
    }

    #[must_use]
    pub fn with_connection(mut self, connection: &str) -> Self {
        self.connection = Some(connection.into());
        self
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn bindings(&self) -> &[BindValue] {
        &self.bindings
    }

    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    #[must_use]
    pub fn connection(&self) -> Option<&str> {
        self.connection.as_deref()
    }

    /// The sanitized statement with each `?` placeholder replaced by its
    /// binding, encoded as a SQL literal.
    ///
    /// Placeholders inside string literals are data and stay untouched;
    /// placeholders beyond the binding list remain `?`.
    #[must_use]
    pub fn to_interpolated_sql(&self) -> String {
        let sanitized = sanitize(&self.sql);
        let mut out = String::with_capacity(sanitized.len());
        let mut bindings = self.bindings.iter();
        let mut in_quote: Option<char> = None;

        for c in sanitized.chars() {
            match in_quote {
                Some(q) => {
                    if c == q {
                        in_quote = None;
                    }
                    out.push(c);
                }
                None => match c {
                    '\'' | '"' | '`' => {
                        in_quote = Some(c);
                        out.push(c);
                    }
                    '?' => match bindings.next() {
                        Some(binding) => out.push_str(&binding.to_sql_literal()),
                        None => out.push('?')
                    },
                    _ => out.push(c)
                }
            }
        }

        out
    }

    /// The sanitized statement with string and numeric literals replaced by
    /// `?`, so calls differing only in parameters collapse to one key.
    #[must_use]
    pub fn to_normalized_sql(&self) -> String {
        normalize_sql(&self.sql)
    }
}

fn string_literal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| compile(r"'(?:[^']|'')*'"))
}

fn number_literal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| compile(r"\b\d+(?:\.\d+)?\b"))
}

/// Normalize a statement for duplicate grouping.
///
/// Sanitizes, then replaces string literals and bare numeric literals with
/// `?`. Existing placeholders already read as `?`.
#[must_use]
pub fn normalize_sql(sql: &str) -> String {
    let sanitized = sanitize(sql);
    let without_strings = string_literal_re().replace_all(&sanitized, "?");
    number_literal_re().replace_all(&without_strings, "?").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolation_encodes_each_type() {
        let capture = QueryCapture::new(
            "SELECT * FROM users WHERE id = ? AND name = ? AND active = ?",
            vec![BindValue::from(1), BindValue::from("John"), BindValue::from(true)],
            2.0
        );
        assert_eq!(
            capture.to_interpolated_sql(),
            "SELECT * FROM users WHERE id = 1 AND name = 'John' AND active = 1"
        );
    }

    #[test]
    fn test_interpolation_escapes_quotes() {
        let capture = QueryCapture::new(
            "SELECT * FROM users WHERE name = ?",
            vec![BindValue::from("O'Brien")],
            1.0
        );
        assert_eq!(
            capture.to_interpolated_sql(),
            "SELECT * FROM users WHERE name = 'O''Brien'"
        );
    }

    #[test]
    fn test_interpolation_null() {
        let capture = QueryCapture::new(
            "SELECT * FROM users WHERE deleted_at = ?",
            vec![BindValue::Null],
            1.0
        );
        assert_eq!(
            capture.to_interpolated_sql(),
            "SELECT * FROM users WHERE deleted_at = NULL"
        );
    }

    #[test]
    fn test_question_mark_inside_string_is_data() {
        let capture = QueryCapture::new(
            "SELECT * FROM faq WHERE question = 'why?' AND id = ?",
            vec![BindValue::from(7)],
            1.0
        );
        assert_eq!(
            capture.to_interpolated_sql(),
            "SELECT * FROM faq WHERE question = 'why?' AND id = 7"
        );
    }

    #[test]
    fn test_normalization_collapses_literals() {
        let a = normalize_sql("SELECT * FROM users WHERE id = 42 AND name = 'Ada'");
        let b = normalize_sql("SELECT * FROM users WHERE id = 7 AND name = 'Grace'");
        assert_eq!(a, b);
        assert_eq!(a, "SELECT * FROM users WHERE id = ? AND name = ?");
    }

    #[test]
    fn test_normalization_keeps_identifiers_with_digits() {
        let normalized = normalize_sql("SELECT col2 FROM t2 WHERE x = 5");
        assert_eq!(normalized, "SELECT col2 FROM t2 WHERE x = ?");
    }
}
