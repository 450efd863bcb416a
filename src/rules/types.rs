//! Type definitions for the diagnostic rule system.
//!
//! - [`Severity`] - finding severity levels (Info, Warning, Critical)
//! - [`FindingCategory`] - stable category slugs used for suppression
//! - [`Finding`] - a single diagnostic event
//! - [`RuleInfo`] - rule metadata

use serde::Serialize;

use crate::shape::AntiPattern;

/// Severity level of a finding.
///
/// Ordered from lowest to highest severity for sorting purposes. A report
/// with any critical finding cannot pass, regardless of its score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational note, never blocks acceptance
    Info,
    /// A problem worth fixing
    Warning,
    /// An issue that fails the query outright
    Critical
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Critical => write!(f, "CRITICAL")
        }
    }
}

/// Stable category slug of a finding.
///
/// The root-cause classifier matches on these, so the slugs are part of the
/// public contract and must not change between releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum FindingCategory {
    FullTableScan,
    NoIndex,
    TempTable,
    Weedout,
    DeepNestedLoop,
    IndexMerge,
    StaleStats,
    LimitIneffective,
    QuadraticComplexity,
    AntiPattern
}

impl std::fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FullTableScan => write!(f, "full_table_scan"),
            Self::NoIndex => write!(f, "no_index"),
            Self::TempTable => write!(f, "temp_table"),
            Self::Weedout => write!(f, "weedout"),
            Self::DeepNestedLoop => write!(f, "deep_nested_loop"),
            Self::IndexMerge => write!(f, "index_merge"),
            Self::StaleStats => write!(f, "stale_stats"),
            Self::LimitIneffective => write!(f, "limit_ineffective"),
            Self::QuadraticComplexity => write!(f, "quadratic_complexity"),
            Self::AntiPattern => write!(f, "anti_pattern")
        }
    }
}

/// A single diagnostic event. Immutable after construction.
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub severity:       Severity,
    pub category:       FindingCategory,
    pub title:          String,
    pub description:    String,
    pub recommendation: String
}

impl Finding {
    /// Build the finding for a shape-level anti-pattern.
    #[must_use]
    pub fn from_anti_pattern(pattern: AntiPattern) -> Self {
        Self {
            severity:       Severity::Info,
            category:       FindingCategory::AntiPattern,
            title:          pattern.title().to_string(),
            description:    pattern.description().to_string(),
            recommendation: pattern.recommendation().to_string()
        }
    }
}

/// Metadata about a rule for identification and configuration.
#[derive(Debug, Clone)]
pub struct RuleInfo {
    /// Human-readable rule name
    pub name:     &'static str,
    /// Category this rule's findings carry
    pub category: FindingCategory,
    /// Severity when no escalation applies
    pub severity: Severity
}
