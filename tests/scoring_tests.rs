// SPDX-FileCopyrightText: 2025 RAprogramm
// SPDX-License-Identifier: MIT

use query_sentinel::{
    metrics::{AccessType, Complexity, Metrics},
    rules::{Finding, FindingCategory, Severity},
    scoring::{Grade, ScoringEngine}
};

fn critical_finding() -> Finding {
    Finding {
        severity:       Severity::Critical,
        category:       FindingCategory::NoIndex,
        title:          "No index used".to_string(),
        description:    String::new(),
        recommendation: String::new()
    }
}

#[test]
fn test_intentional_scan_composite_at_least_95() {
    let metrics = Metrics {
        is_intentional_scan: true,
        has_table_scan: true,
        primary_access_type: Some(AccessType::TableScan),
        complexity: Some(Complexity::Linear),
        rows_examined: Some(100_000),
        rows_returned: Some(100_000),
        ..Metrics::default()
    };
    let report = ScoringEngine::new().score(&metrics, &[]);
    assert_eq!(report.breakdown.index_quality.score, 100.0);
    assert_eq!(report.breakdown.scalability.score, 100.0);
    assert!(report.composite_score >= 95.0);
    assert!(report.passed);
}

#[test]
fn test_zero_row_const_scores_perfect() {
    let metrics = Metrics {
        is_zero_row_const: true,
        is_index_backed: true,
        primary_access_type: Some(AccessType::ZeroRowConst),
        complexity: Some(Complexity::Constant),
        rows_examined: Some(0),
        rows_returned: Some(0),
        ..Metrics::default()
    };
    let report = ScoringEngine::new().score(&metrics, &[]);
    assert_eq!(report.composite_score, 100.0);
    assert_eq!(report.grade, Grade::APlus);
    assert!(report.passed);
}

#[test]
fn test_table_scan_index_quality() {
    let metrics = Metrics {
        has_table_scan: true,
        primary_access_type: Some(AccessType::TableScan),
        ..Metrics::default()
    };
    let report = ScoringEngine::new().score(&metrics, &[]);
    assert_eq!(report.breakdown.index_quality.score, 30.0);
}

#[test]
fn test_index_scan_without_covering_scores_60() {
    let metrics = Metrics {
        primary_access_type: Some(AccessType::IndexScan),
        is_index_backed: true,
        ..Metrics::default()
    };
    let report = ScoringEngine::new().score(&metrics, &[]);
    assert_eq!(report.breakdown.index_quality.score, 60.0);
}

#[test]
fn test_index_merge_penalty() {
    let metrics = Metrics {
        primary_access_type: Some(AccessType::IndexLookup),
        is_index_backed: true,
        has_index_merge: true,
        ..Metrics::default()
    };
    let report = ScoringEngine::new().score(&metrics, &[]);
    assert_eq!(report.breakdown.index_quality.score, 90.0);
}

#[test]
fn test_efficiency_ratio_and_floor() {
    let engine = ScoringEngine::new();

    let perfect = Metrics {
        rows_examined: Some(100),
        rows_returned: Some(100),
        ..Metrics::default()
    };
    assert_eq!(engine.score(&perfect, &[]).breakdown.efficiency.score, 100.0);

    let wasteful = Metrics {
        rows_examined: Some(100_000),
        rows_returned: Some(1),
        ..Metrics::default()
    };
    // raw ratio would be far below the floor
    assert_eq!(engine.score(&wasteful, &[]).breakdown.efficiency.score, 10.0);

    let nothing_returned = Metrics {
        rows_examined: Some(100_000),
        rows_returned: Some(0),
        ..Metrics::default()
    };
    assert_eq!(engine.score(&nothing_returned, &[]).breakdown.efficiency.score, 0.0);
}

#[test]
fn test_scalability_ladder() {
    let engine = ScoringEngine::new();
    let expectations = [
        (Complexity::Constant, 100.0),
        (Complexity::Logarithmic, 90.0),
        (Complexity::LogRange, 80.0),
        (Complexity::Linear, 50.0),
        (Complexity::Linearithmic, 30.0),
        (Complexity::Quadratic, 10.0),
        (Complexity::Cubic, 0.0),
    ];
    for (complexity, expected) in expectations {
        let metrics = Metrics {
            complexity: Some(complexity),
            ..Metrics::default()
        };
        assert_eq!(
            engine.score(&metrics, &[]).breakdown.scalability.score,
            expected,
            "complexity {}",
            complexity
        );
    }
}

#[test]
fn test_execution_bands() {
    let engine = ScoringEngine::new();
    let expectations = [
        (0.5, 100.0),
        (5.0, 95.0),
        (30.0, 85.0),
        (80.0, 70.0),
        (300.0, 50.0),
        (800.0, 30.0),
        (5000.0, 10.0),
    ];
    for (elapsed, expected) in expectations {
        let metrics = Metrics {
            execution_time_ms: Some(elapsed),
            ..Metrics::default()
        };
        assert_eq!(
            engine.score(&metrics, &[]).breakdown.execution.score,
            expected,
            "elapsed {}",
            elapsed
        );
    }
}

#[test]
fn test_cost_penalties_stack() {
    let metrics = Metrics {
        has_temp_table: true,
        has_disk_temp: true,
        has_weedout: true,
        nested_loop_depth: 4,
        ..Metrics::default()
    };
    let report = ScoringEngine::new().score(&metrics, &[]);
    // 100 - 15 - 25 - 10 - 5*2
    assert_eq!(report.breakdown.cost.score, 40.0);
}

#[test]
fn test_critical_finding_blocks_pass_despite_high_score() {
    let metrics = Metrics {
        primary_access_type: Some(AccessType::IndexLookup),
        is_index_backed: true,
        complexity: Some(Complexity::Logarithmic),
        rows_examined: Some(10),
        rows_returned: Some(10),
        ..Metrics::default()
    };
    let report = ScoringEngine::new().score(&metrics, &[critical_finding()]);
    assert!(report.composite_score >= 70.0);
    assert!(!report.passed);
}

#[test]
fn test_grade_bands() {
    assert_eq!(Grade::from_score(97.0), Grade::APlus);
    assert_eq!(Grade::from_score(92.0), Grade::A);
    assert_eq!(Grade::from_score(87.0), Grade::BPlus);
    assert_eq!(Grade::from_score(82.0), Grade::B);
    assert_eq!(Grade::from_score(75.0), Grade::C);
    assert_eq!(Grade::from_score(65.0), Grade::D);
    assert_eq!(Grade::from_score(30.0), Grade::F);
}

#[test]
fn test_grade_display() {
    assert_eq!(Grade::APlus.to_string(), "A+");
    assert_eq!(Grade::BPlus.to_string(), "B+");
    assert_eq!(Grade::F.to_string(), "F");
}

#[test]
fn test_static_only_metrics_score_neutral() {
    let report = ScoringEngine::new().score(&Metrics::default(), &[]);
    assert_eq!(report.breakdown.efficiency.score, 100.0);
    assert_eq!(report.breakdown.scalability.score, 70.0);
    assert_eq!(report.breakdown.execution.score, 100.0);
}
