// SPDX-FileCopyrightText: 2025 RAprogramm
// SPDX-License-Identifier: MIT

use query_sentinel::capture::{BindValue, QueryCapture, normalize_sql};

#[test]
fn test_interpolation_of_mixed_bindings() {
    let capture = QueryCapture::new(
        "SELECT * FROM users WHERE id = ? AND name = ? AND active = ?",
        vec![BindValue::from(1), BindValue::from("John"), BindValue::from(true)],
        12.5
    );
    assert_eq!(
        capture.to_interpolated_sql(),
        "SELECT * FROM users WHERE id = 1 AND name = 'John' AND active = 1"
    );
}

#[test]
fn test_interpolation_boolean_false_and_null() {
    let capture = QueryCapture::new(
        "SELECT * FROM t WHERE a = ? AND b = ?",
        vec![BindValue::from(false), BindValue::Null],
        1.0
    );
    assert_eq!(
        capture.to_interpolated_sql(),
        "SELECT * FROM t WHERE a = 0 AND b = NULL"
    );
}

#[test]
fn test_interpolation_float() {
    let capture = QueryCapture::new(
        "SELECT * FROM t WHERE price > ?",
        vec![BindValue::from(19.5)],
        1.0
    );
    assert_eq!(capture.to_interpolated_sql(), "SELECT * FROM t WHERE price > 19.5");
}

#[test]
fn test_extra_placeholders_survive() {
    let capture =
        QueryCapture::new("SELECT * FROM t WHERE a = ? AND b = ?", vec![BindValue::from(1)], 1.0);
    assert_eq!(capture.to_interpolated_sql(), "SELECT * FROM t WHERE a = 1 AND b = ?");
}

#[test]
fn test_normalized_form_is_parameter_independent() {
    let a = QueryCapture::new("SELECT * FROM users WHERE id = 42", vec![], 1.0);
    let b = QueryCapture::new("SELECT * FROM users WHERE id = 99", vec![], 2.0);
    assert_eq!(a.to_normalized_sql(), b.to_normalized_sql());
}

#[test]
fn test_normalized_form_collapses_strings_and_numbers() {
    assert_eq!(
        normalize_sql("SELECT * FROM users WHERE name = 'Ada' AND age > 30"),
        "SELECT * FROM users WHERE name = ? AND age > ?"
    );
}

#[test]
fn test_normalized_form_strips_comments() {
    assert_eq!(
        normalize_sql("SELECT id FROM users -- trailing\nWHERE id = 5"),
        "SELECT id FROM users WHERE id = ?"
    );
}

#[test]
fn test_normalization_handles_quoted_quote() {
    let normalized = normalize_sql("SELECT * FROM t WHERE name = 'O''Brien' AND id = 3");
    assert_eq!(normalized, "SELECT * FROM t WHERE name = ? AND id = ?");
}

#[test]
fn test_capture_accessors() {
    let capture = QueryCapture::new("SELECT 1", vec![], 7.0).with_connection("replica");
    assert_eq!(capture.sql(), "SELECT 1");
    assert_eq!(capture.elapsed_ms(), 7.0);
    assert_eq!(capture.connection(), Some("replica"));
    assert!(capture.bindings().is_empty());
}

#[test]
fn test_capture_deserializes_from_json_log() {
    let json = r#"{"sql": "SELECT * FROM t WHERE id = ?", "bindings": [5], "elapsed_ms": 3.2}"#;
    let capture: QueryCapture = serde_json::from_str(json).unwrap();
    assert_eq!(capture.to_interpolated_sql(), "SELECT * FROM t WHERE id = 5");
}
