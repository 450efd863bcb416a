// SPDX-FileCopyrightText: 2025 RAprogramm
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use query_sentinel::{
    capture::{BindValue, QueryCapture},
    engine::Engine,
    profiler::{CaptureBuffer, DiagnoseTarget, PerformanceViolation, ThresholdGuard}
};

fn lookup_capture(id: i64, elapsed_ms: f64) -> QueryCapture {
    QueryCapture::new(
        "SELECT * FROM users WHERE id = ?",
        vec![BindValue::from(id)],
        elapsed_ms
    )
}

#[tokio::test]
async fn test_n_plus_one_detected_at_five_repetitions() {
    let engine = Engine::new();
    let captures: Vec<QueryCapture> = (0..6).map(|i| lookup_capture(i, 2.0)).collect();
    let profile = engine.profile(&captures).await;

    assert!(profile.n_plus_one_detected);
    assert_eq!(profile.total_captures, 6);
    assert_eq!(profile.analyzed, 6);
    assert_eq!(profile.skipped, 0);
    assert_eq!(profile.duplicate_queries.len(), 1);
    assert_eq!(profile.query_counts.values().copied().max(), Some(6));
}

#[tokio::test]
async fn test_distinct_queries_not_flagged() {
    let engine = Engine::new();
    let captures = vec![
        QueryCapture::new("SELECT id FROM users WHERE id = 1", vec![], 1.0),
        QueryCapture::new("SELECT id FROM orders WHERE id = 2", vec![], 2.0),
    ];
    let profile = engine.profile(&captures).await;
    assert!(!profile.n_plus_one_detected);
    assert!(profile.duplicate_queries.is_empty());
    assert_eq!(profile.reports.len(), 2);
}

#[tokio::test]
async fn test_duplicates_analyzed_once_but_reported_per_capture() {
    let engine = Engine::new();
    let captures: Vec<QueryCapture> = (0..4).map(|i| lookup_capture(i, 1.0)).collect();
    let profile = engine.profile(&captures).await;
    assert_eq!(profile.reports.len(), 4);
    assert_eq!(profile.query_counts.len(), 1);
}

#[tokio::test]
async fn test_unsafe_captures_are_skipped() {
    let engine = Engine::new();
    let captures = vec![
        QueryCapture::new("SELECT id FROM users WHERE id = 1", vec![], 1.0),
        QueryCapture::new("UPDATE users SET seen = 1 WHERE id = 2", vec![], 1.0),
    ];
    let profile = engine.profile(&captures).await;
    assert_eq!(profile.analyzed, 1);
    assert_eq!(profile.skipped, 1);
    assert_eq!(profile.reports.len(), 1);
}

#[tokio::test]
async fn test_slowest_and_totals() {
    let engine = Engine::new();
    let captures = vec![
        QueryCapture::new("SELECT id FROM users WHERE id = 1", vec![], 10.0),
        QueryCapture::new("SELECT id FROM orders WHERE id = 2", vec![], 700.0),
    ];
    let profile = engine.profile(&captures).await;
    assert_eq!(profile.total_time_ms, 710.0);
    assert_eq!(profile.slowest_elapsed_ms(), 700.0);
    let slowest = profile.slowest.as_ref().unwrap();
    assert!(slowest.sanitized_sql.contains("orders"));
}

#[tokio::test]
async fn test_violation_reason_slow_query() {
    let engine = Engine::new();
    let captures = vec![QueryCapture::new("SELECT id FROM users WHERE id = 1", vec![], 750.0)];
    let profile = engine.profile(&captures).await;
    let violation = PerformanceViolation::from_report(profile, "UserRepository", "findById");
    assert!(violation.reason.contains("slow query (750ms)"));
    assert!(violation.to_string().contains("UserRepository::findById"));
}

#[tokio::test]
async fn test_violation_reason_n_plus_one() {
    let engine = Engine::new();
    let captures: Vec<QueryCapture> = (0..6).map(|i| lookup_capture(i, 2.0)).collect();
    let profile = engine.profile(&captures).await;
    let violation = PerformanceViolation::from_report(profile, "OrderService", "loadAll");
    assert!(violation.reason.contains("N+1"));
    assert!(violation.to_string().contains("N+1"));
}

#[tokio::test]
async fn test_violation_reasons_concatenate() {
    let engine = Engine::new();
    let mut captures: Vec<QueryCapture> = (0..6).map(|i| lookup_capture(i, 2.0)).collect();
    captures.push(QueryCapture::new("SELECT id FROM events WHERE id = 9", vec![], 900.0));
    let profile = engine.profile(&captures).await;
    let violation = PerformanceViolation::from_report(profile, "Svc", "run");
    assert!(violation.reason.contains("slow query"));
    assert!(violation.reason.contains("N+1"));
    assert!(violation.reason.contains("; "));
}

#[tokio::test]
async fn test_violation_fallback_reason() {
    let engine = Engine::new();
    let captures = vec![QueryCapture::new("SELECT id FROM users WHERE id = 1", vec![], 1.0)];
    let profile = engine.profile(&captures).await;
    let violation = PerformanceViolation::from_report(profile, "Svc", "run");
    assert_eq!(violation.reason, "critical findings");
}

#[test]
fn test_threshold_guard_scenarios() {
    assert!(!ThresholdGuard::should_log(75.0, 50.0, 100.0));
    assert!(ThresholdGuard::should_log(100.0, 100.0, 0.0));
    assert!(ThresholdGuard::should_log(0.0, 0.0, 0.0));
}

#[test]
fn test_threshold_guard_negative_treated_as_zero() {
    assert!(ThresholdGuard::should_log(0.0, -5.0, -10.0));
    assert!(ThresholdGuard::should_log(10.0, -5.0, 5.0));
    assert!(!ThresholdGuard::should_log(4.0, -5.0, 5.0));
}

#[test]
fn test_capture_buffer_concurrent_recording() {
    let buffer = Arc::new(CaptureBuffer::new());
    let mut handles = Vec::new();
    for i in 0..8 {
        let buffer = buffer.clone();
        handles.push(std::thread::spawn(move || {
            for j in 0..50 {
                buffer.record(lookup_capture(i * 50 + j, 1.0));
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(buffer.len(), 400);

    let snapshot = buffer.snapshot();
    assert_eq!(snapshot.len(), 400);
    buffer.record(lookup_capture(9999, 1.0));
    // the snapshot is a copy, unaffected by later appends
    assert_eq!(snapshot.len(), 400);
    assert_eq!(buffer.len(), 401);

    buffer.clear();
    assert!(buffer.is_empty());
}

#[test]
fn test_diagnose_target_defaults() {
    let target = DiagnoseTarget::new("UserRepository", "findActive");
    assert_eq!(target.class_name, "UserRepository");
    assert_eq!(target.method_name, "findActive");
    assert_eq!(target.label, "");
    assert_eq!(target.description, "");

    let labeled = DiagnoseTarget::new("A", "b")
        .with_label("hot path")
        .with_description("runs per request");
    assert_eq!(labeled.label, "hot path");
    assert_eq!(labeled.description, "runs per request");
}
