//! Execution guard: classifies SQL as safe to EXPLAIN or destructive.
//!
//! A statement is *safe* iff its first keyword after sanitization is one of
//! SELECT, WITH, EXPLAIN, SHOW, DESCRIBE, or DESC. Everything else, including
//! empty input, is refused before the driver is ever contacted.

use crate::{
    error::{AppResult, unsafe_query_error},
    sanitize::sanitize
};

const SAFE_KEYWORDS: [&str; 6] = ["SELECT", "WITH", "EXPLAIN", "SHOW", "DESCRIBE", "DESC"];

/// Extract the first keyword of a statement, uppercased.
///
/// Returns `None` for empty or comment-only input.
pub fn first_keyword(sql: &str) -> Option<String> {
    let sanitized = sanitize(sql);
    let word: String = sanitized
        .chars()
        .take_while(|c| c.is_ascii_alphabetic() || *c == '_')
        .collect();
    if word.is_empty() {
        None
    } else {
        Some(word.to_ascii_uppercase())
    }
}

/// Whether the statement is read-only and safe to hand to EXPLAIN.
#[must_use]
pub fn is_safe(sql: &str) -> bool {
    match first_keyword(sql) {
        Some(kw) => SAFE_KEYWORDS.contains(&kw.as_str()),
        None => false
    }
}

/// Whether the statement produces a result set (SELECT or WITH only).
#[must_use]
pub fn is_select(sql: &str) -> bool {
    matches!(first_keyword(sql).as_deref(), Some("SELECT") | Some("WITH"))
}

/// Fail with `unsafe_query` unless the statement is safe.
pub fn validate(sql: &str) -> AppResult<()> {
    if is_safe(sql) {
        Ok(())
    } else {
        Err(unsafe_query_error(&first_keyword(sql).unwrap_or_default()))
    }
}
