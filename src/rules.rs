//! Threshold-driven diagnostic rules over the metrics vector.
//!
//! Rules are pure and independent: each sees only the reconciled
//! [`Metrics`] and returns at most one [`Finding`]. No rule sees another
//! rule's output; contradictions between findings are resolved later by the
//! root-cause classifier, not here.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌─────────────┐
//! │   Metrics   │────▶│ RuleRegistry │────▶│  Findings   │
//! └─────────────┘     └──────────────┘     └─────────────┘
//!                            │
//!                     ┌──────┴──────┐
//!                     │   Rules     │
//!                     │  (parallel) │
//!                     └─────────────┘
//! ```
//!
//! The registry executes all rules in parallel using [`rayon`] and returns
//! the findings sorted by severity. Each rule carries its thresholds as
//! construction parameters, so tests inject custom values by building the
//! rule directly:
//!
//! ```
//! use query_sentinel::{
//!     metrics::Metrics,
//!     rules::{FullTableScanRule, Rule, Severity}
//! };
//!
//! let rule = FullTableScanRule {
//!     critical_rows: 100
//! };
//! let metrics = Metrics {
//!     has_table_scan: true,
//!     rows_examined: Some(500),
//!     ..Metrics::default()
//! };
//!
//! let finding = rule.evaluate(&metrics).unwrap();
//! assert_eq!(finding.severity, Severity::Critical);
//! ```

mod plan_shape;
mod scan;
mod types;
mod volume;

pub use plan_shape::{DeepNestedLoopRule, IndexMergeRule, TempTableRule, WeedoutRule};
use rayon::prelude::*;
pub use scan::{FullTableScanRule, NoIndexRule};
pub use types::{Finding, FindingCategory, RuleInfo, Severity};
pub use volume::{LimitIneffectiveRule, QuadraticComplexityRule, StaleStatsRule};

use crate::{config::Thresholds, metrics::Metrics};

/// Trait for diagnostic rules.
///
/// Rules are stateless beyond their thresholds and must be `Send + Sync`
/// for parallel execution.
pub trait Rule: Send + Sync {
    /// Returns metadata about this rule.
    fn info(&self) -> RuleInfo;

    /// Evaluates the rule against reconciled metrics.
    ///
    /// Returns `None` when the rule does not fire.
    fn evaluate(&self, metrics: &Metrics) -> Option<Finding>;
}

/// Ordered collection of rules, immutable after construction.
pub struct RuleRegistry {
    rules: Vec<Box<dyn Rule>>
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::with_thresholds(&Thresholds::default())
    }
}

impl RuleRegistry {
    /// Create the core rule set with the given thresholds.
    pub fn with_thresholds(thresholds: &Thresholds) -> Self {
        let rules: Vec<Box<dyn Rule>> = vec![
            Box::new(FullTableScanRule {
                critical_rows: thresholds.full_scan_critical_rows
            }),
            Box::new(NoIndexRule),
            Box::new(TempTableRule),
            Box::new(WeedoutRule),
            Box::new(DeepNestedLoopRule {
                warn_depth: thresholds.deep_loop_warn_depth
            }),
            Box::new(IndexMergeRule),
            Box::new(StaleStatsRule {
                drift_factor: thresholds.stale_stats_drift
            }),
            Box::new(LimitIneffectiveRule {
                examined_ratio:    thresholds.limit_ineffective_ratio,
                small_result_rows: 100
            }),
            Box::new(QuadraticComplexityRule {
                loop_threshold: thresholds.quadratic_loop_threshold
            }),
        ];
        Self {
            rules
        }
    }

    /// Create the core rule set, dropping disabled categories.
    pub fn with_config(thresholds: &Thresholds, disabled: &[String]) -> Self {
        let mut registry = Self::with_thresholds(thresholds);
        registry.rules.retain(|rule| {
            let slug = rule.info().category.to_string();
            !disabled.iter().any(|d| d.eq_ignore_ascii_case(&slug))
        });
        registry
    }

    /// Build a registry from an explicit rule list (test injection).
    #[must_use]
    pub fn custom(rules: Vec<Box<dyn Rule>>) -> Self {
        Self {
            rules
        }
    }

    /// The rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[Box<dyn Rule>] {
        &self.rules
    }

    /// Run every rule against the metrics (parallel execution).
    ///
    /// Findings come back sorted by severity, most severe first, with the
    /// registration order preserved within a severity.
    #[must_use]
    pub fn evaluate(&self, metrics: &Metrics) -> Vec<Finding> {
        let mut findings: Vec<Finding> = self
            .rules
            .par_iter()
            .filter_map(|rule| rule.evaluate(metrics))
            .collect();
        findings.sort_by(|a, b| b.severity.cmp(&a.severity));
        findings
    }
}
