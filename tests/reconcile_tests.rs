// SPDX-FileCopyrightText: 2025 RAprogramm
// SPDX-License-Identifier: MIT

use query_sentinel::{
    metrics::{AccessType, Complexity, Metrics},
    plan::ExplainRow,
    reconcile::{enrich_from_explain, validate_consistency}
};

#[test]
fn test_empty_rows_leave_metrics_unchanged() {
    let mut metrics = Metrics::default();
    let before = serde_json::to_value(&metrics).unwrap();
    let diagnostics = enrich_from_explain(&mut metrics, &[]);
    assert!(diagnostics.is_empty());
    assert_eq!(serde_json::to_value(&metrics).unwrap(), before);
}

#[test]
fn test_enrich_only_fills_unset_fields() {
    let mut metrics = Metrics {
        primary_access_type: Some(AccessType::IndexLookup),
        is_index_backed: true,
        complexity: Some(Complexity::Logarithmic),
        rows_examined: Some(42),
        ..Metrics::default()
    };
    let rows = vec![ExplainRow::new("ALL").with_table("users").with_rows(100000.0)];
    enrich_from_explain(&mut metrics, &rows);
    assert_eq!(metrics.primary_access_type, Some(AccessType::IndexLookup));
    assert_eq!(metrics.rows_examined, Some(42));
    // the row still contributes what it alone observes
    assert!(metrics.has_table_scan);
}

#[test]
fn test_index_backing_invariant_repair() {
    let mut metrics = Metrics {
        primary_access_type: Some(AccessType::IndexLookup),
        is_index_backed: false,
        ..Metrics::default()
    };
    let diagnostics = validate_consistency(&mut metrics);
    assert!(metrics.is_index_backed);
    assert!(!diagnostics.is_empty());
}

#[test]
fn test_zero_row_const_invariant_repair() {
    let mut metrics = Metrics {
        is_zero_row_const: true,
        is_index_backed: false,
        complexity: Some(Complexity::Linear),
        ..Metrics::default()
    };
    validate_consistency(&mut metrics);
    assert_eq!(metrics.complexity, Some(Complexity::Constant));
    assert!(metrics.is_index_backed);
}

#[test]
fn test_zero_examined_without_scan_is_constant() {
    let mut metrics = Metrics {
        rows_examined: Some(0),
        complexity: Some(Complexity::Logarithmic),
        primary_access_type: Some(AccessType::IndexLookup),
        is_index_backed: true,
        ..Metrics::default()
    };
    validate_consistency(&mut metrics);
    assert_eq!(metrics.complexity, Some(Complexity::Constant));
}

#[test]
fn test_table_scan_access_sets_scan_flag() {
    let mut metrics = Metrics {
        primary_access_type: Some(AccessType::TableScan),
        ..Metrics::default()
    };
    validate_consistency(&mut metrics);
    assert!(metrics.has_table_scan);
}

#[test]
fn test_returned_above_examined_is_flagged_not_rejected() {
    let mut metrics = Metrics {
        rows_examined: Some(10),
        rows_returned: Some(50),
        primary_access_type: Some(AccessType::IndexLookup),
        is_index_backed: true,
        ..Metrics::default()
    };
    let diagnostics = validate_consistency(&mut metrics);
    assert_eq!(metrics.rows_returned, Some(50));
    assert!(diagnostics.iter().any(|d| d.message.contains("rows_returned")));
}

#[test]
fn test_repeated_scan_coerces_quadratic() {
    let mut metrics = Metrics {
        primary_access_type: Some(AccessType::TableScan),
        has_table_scan: true,
        max_loops: 500,
        nested_loop_depth: 1,
        ..Metrics::default()
    };
    validate_consistency(&mut metrics);
    assert_eq!(metrics.complexity, Some(Complexity::Quadratic));
}

#[test]
fn test_deep_repeated_scan_coerces_cubic() {
    let mut metrics = Metrics {
        primary_access_type: Some(AccessType::TableScan),
        has_table_scan: true,
        max_loops: 500,
        nested_loop_depth: 2,
        ..Metrics::default()
    };
    validate_consistency(&mut metrics);
    assert_eq!(metrics.complexity, Some(Complexity::Cubic));
}

#[test]
fn test_scan_with_filesort_is_linearithmic() {
    let mut metrics = Metrics {
        primary_access_type: Some(AccessType::TableScan),
        has_table_scan: true,
        has_filesort: true,
        ..Metrics::default()
    };
    validate_consistency(&mut metrics);
    assert_eq!(metrics.complexity, Some(Complexity::Linearithmic));
}

#[test]
fn test_validate_consistency_is_idempotent() {
    let mut metrics = Metrics {
        primary_access_type: Some(AccessType::TableScan),
        has_table_scan: true,
        has_filesort: true,
        max_loops: 100,
        nested_loop_depth: 1,
        rows_examined: Some(1000),
        rows_returned: Some(10),
        ..Metrics::default()
    };
    validate_consistency(&mut metrics);
    let after_first = serde_json::to_value(&metrics).unwrap();
    validate_consistency(&mut metrics);
    assert_eq!(serde_json::to_value(&metrics).unwrap(), after_first);
}

#[test]
fn test_enrich_then_validate_round_trip() {
    let mut metrics = Metrics::default();
    let rows = vec![
        ExplainRow::new("const")
            .with_table("users")
            .with_extra("no matching row in const table"),
    ];
    enrich_from_explain(&mut metrics, &rows);
    validate_consistency(&mut metrics);
    assert!(metrics.is_zero_row_const);
    assert!(metrics.is_index_backed);
    assert_eq!(metrics.complexity, Some(Complexity::Constant));
    assert_eq!(metrics.rows_examined, Some(0));
}
