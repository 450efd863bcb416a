// SPDX-FileCopyrightText: 2025 RAprogramm
// SPDX-License-Identifier: MIT

use compact_str::CompactString;
use query_sentinel::{
    metrics::{AccessType, Complexity, Metrics, TableEstimate},
    rootcause::{RootCause, detect_root_causes, identify_top_recommendation, suppress_by_root_cause},
    rules::{Finding, FindingCategory, RuleRegistry, Severity},
    shape::parse_shape,
    synth
};

fn finding(category: FindingCategory, severity: Severity) -> Finding {
    Finding {
        severity,
        category,
        title: category.to_string(),
        description: String::new(),
        recommendation: format!("fix {}", category)
    }
}

#[test]
fn test_intentional_scan_cause() {
    let metrics = Metrics {
        is_intentional_scan: true,
        ..Metrics::default()
    };
    let causes = detect_root_causes(&[], &metrics);
    assert_eq!(causes, vec![RootCause::IntentionalScan]);
}

#[test]
fn test_missing_index_cause() {
    let findings = vec![finding(FindingCategory::NoIndex, Severity::Critical)];
    let causes = detect_root_causes(&findings, &Metrics::default());
    assert_eq!(causes, vec![RootCause::MissingIndex]);
}

#[test]
fn test_missing_index_not_detected_when_intentional() {
    let metrics = Metrics {
        is_intentional_scan: true,
        ..Metrics::default()
    };
    let findings = vec![finding(FindingCategory::NoIndex, Severity::Critical)];
    let causes = detect_root_causes(&findings, &metrics);
    assert_eq!(causes, vec![RootCause::IntentionalScan]);
}

#[test]
fn test_bad_join_order_cause() {
    let findings = vec![
        finding(FindingCategory::DeepNestedLoop, Severity::Warning),
        finding(FindingCategory::StaleStats, Severity::Warning),
    ];
    let causes = detect_root_causes(&findings, &Metrics::default());
    assert_eq!(causes, vec![RootCause::BadJoinOrder]);
}

#[test]
fn test_sort_spill_cause() {
    let metrics = Metrics {
        has_filesort: true,
        ..Metrics::default()
    };
    let findings = vec![finding(FindingCategory::TempTable, Severity::Warning)];
    let causes = detect_root_causes(&findings, &metrics);
    assert_eq!(causes, vec![RootCause::SortSpill]);
}

#[test]
fn test_quadratic_blowup_cause_and_priority() {
    let metrics = Metrics {
        has_filesort: true,
        ..Metrics::default()
    };
    let findings = vec![
        finding(FindingCategory::NoIndex, Severity::Critical),
        finding(FindingCategory::TempTable, Severity::Warning),
        finding(FindingCategory::QuadraticComplexity, Severity::Critical),
    ];
    let causes = detect_root_causes(&findings, &metrics);
    assert_eq!(causes[0], RootCause::QuadraticBlowup);
    assert!(causes.contains(&RootCause::SortSpill));
    assert!(causes.contains(&RootCause::MissingIndex));
}

#[test]
fn test_intentional_suppresses_scan_findings_keeps_anti_patterns() {
    let findings = vec![
        finding(FindingCategory::NoIndex, Severity::Critical),
        finding(FindingCategory::FullTableScan, Severity::Critical),
        finding(FindingCategory::AntiPattern, Severity::Info),
    ];
    let kept = suppress_by_root_cause(findings, &[RootCause::IntentionalScan]);
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].category, FindingCategory::AntiPattern);
}

#[test]
fn test_missing_index_suppresses_full_table_scan() {
    let findings = vec![
        finding(FindingCategory::NoIndex, Severity::Critical),
        finding(FindingCategory::FullTableScan, Severity::Critical),
        finding(FindingCategory::TempTable, Severity::Warning),
    ];
    let kept = suppress_by_root_cause(findings, &[RootCause::MissingIndex]);
    let categories: Vec<_> = kept.iter().map(|f| f.category).collect();
    assert!(categories.contains(&FindingCategory::NoIndex));
    assert!(!categories.contains(&FindingCategory::FullTableScan));
    assert!(categories.contains(&FindingCategory::TempTable));
}

#[test]
fn test_no_causes_leaves_findings_untouched() {
    let findings = vec![finding(FindingCategory::Weedout, Severity::Warning)];
    let kept = suppress_by_root_cause(findings, &[]);
    assert_eq!(kept.len(), 1);
}

#[test]
fn test_intentional_recommendation_wording() {
    let recommendation =
        identify_top_recommendation(&[RootCause::IntentionalScan], &[], &[]);
    assert!(recommendation.contains("entire dataset by design"));
    assert!(recommendation.contains("LIMIT"));
    assert!(!recommendation.contains("Add an index"));
}

#[test]
fn test_missing_index_recommendation_uses_proposal() {
    let shape = parse_shape("SELECT * FROM users WHERE email = 'x'");
    let metrics = Metrics {
        primary_access_type: Some(AccessType::TableScan),
        has_table_scan: true,
        tables_accessed: vec![CompactString::from("users")],
        ..Metrics::default()
    };
    let proposals = synth::synthesize(&shape, &metrics);
    let recommendation =
        identify_top_recommendation(&[RootCause::MissingIndex], &[], &proposals);
    assert!(recommendation.contains("Add an index on users (email)"));
}

#[test]
fn test_generic_recommendation_falls_back_to_worst_finding() {
    let findings = vec![
        finding(FindingCategory::Weedout, Severity::Warning),
        finding(FindingCategory::AntiPattern, Severity::Info),
    ];
    let recommendation = identify_top_recommendation(&[], &findings, &[]);
    assert_eq!(recommendation, "fix weedout");
}

#[test]
fn test_no_issues_recommendation() {
    let recommendation = identify_top_recommendation(&[], &[], &[]);
    assert_eq!(recommendation, "No significant issues detected");
}

#[test]
fn test_stale_stats_drift_triggers_bad_join_order_end_to_end() {
    let mut metrics = Metrics {
        nested_loop_depth: 4,
        ..Metrics::default()
    };
    metrics.per_table_estimates.insert(
        CompactString::from("orders"),
        TableEstimate {
            estimated_rows: Some(10.0),
            actual_rows:    Some(100_000.0),
            loops:          Some(1.0)
        }
    );
    metrics.complexity = Some(Complexity::Linear);
    let findings = RuleRegistry::default().evaluate(&metrics);
    let causes = detect_root_causes(&findings, &metrics);
    assert!(causes.contains(&RootCause::BadJoinOrder));
}
