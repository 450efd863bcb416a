//! Multi-dimensional scoring of a reconciled metrics vector.
//!
//! Five sub-scores in `[0, 100]` combine into a weighted composite with a
//! letter grade:
//!
//! | Dimension | Weight | Measures |
//! |---|---|---|
//! | index_quality | 0.25 | access path quality |
//! | efficiency | 0.15 | rows examined vs returned |
//! | scalability | 0.25 | algorithmic complexity |
//! | execution | 0.20 | observed wall-clock time |
//! | cost | 0.15 | plan-shape penalties |
//!
//! Intentional full scans are neutralized: reading everything on purpose is
//! not an indexing failure, so index quality and scalability both score 100
//! and a clean intentional scan lands at composite ≥ 95.

use serde::Serialize;

use crate::{
    metrics::{AccessType, Complexity, Metrics},
    rules::{Finding, Severity}
};

/// One scored dimension with the reasoning behind the number.
#[derive(Debug, Clone, Serialize)]
pub struct DimensionScore {
    pub score:     f64,
    pub rationale: String
}

impl DimensionScore {
    fn new(score: f64, rationale: impl Into<String>) -> Self {
        Self {
            score:     score.clamp(0.0, 100.0),
            rationale: rationale.into()
        }
    }
}

/// Per-dimension breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreBreakdown {
    pub index_quality: DimensionScore,
    pub efficiency:    DimensionScore,
    pub scalability:   DimensionScore,
    pub execution:     DimensionScore,
    pub cost:          DimensionScore
}

/// Complete scoring result.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreReport {
    pub breakdown:       ScoreBreakdown,
    pub composite_score: f64,
    pub grade:           Grade,
    pub passed:          bool
}

/// Letter grade for the composite score.
///
/// Ordered worst to best so grades compare naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Grade {
    F,
    D,
    C,
    B,
    BPlus,
    A,
    APlus
}

impl Serialize for Grade {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl Grade {
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 95.0 {
            Self::APlus
        } else if score >= 90.0 {
            Self::A
        } else if score >= 85.0 {
            Self::BPlus
        } else if score >= 80.0 {
            Self::B
        } else if score >= 70.0 {
            Self::C
        } else if score >= 60.0 {
            Self::D
        } else {
            Self::F
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::APlus => write!(f, "A+"),
            Self::A => write!(f, "A"),
            Self::BPlus => write!(f, "B+"),
            Self::B => write!(f, "B"),
            Self::C => write!(f, "C"),
            Self::D => write!(f, "D"),
            Self::F => write!(f, "F")
        }
    }
}

/// Dimension weights, normalized at use.
#[derive(Debug, Clone, Copy)]
pub struct ScoreWeights {
    pub index_quality: f64,
    pub efficiency:    f64,
    pub scalability:   f64,
    pub execution:     f64,
    pub cost:          f64
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            index_quality: 0.25,
            efficiency:    0.15,
            scalability:   0.25,
            execution:     0.20,
            cost:          0.15
        }
    }
}

/// Scoring engine, immutable after construction.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    weights: ScoreWeights
}

impl ScoringEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_weights(weights: ScoreWeights) -> Self {
        Self {
            weights
        }
    }

    /// Score the metrics; `passed` requires composite ≥ 70 and no critical
    /// finding.
    #[must_use]
    pub fn score(&self, metrics: &Metrics, findings: &[Finding]) -> ScoreReport {
        let breakdown = ScoreBreakdown {
            index_quality: index_quality(metrics),
            efficiency:    efficiency(metrics),
            scalability:   scalability(metrics),
            execution:     execution(metrics),
            cost:          cost(metrics)
        };

        let w = self.weights;
        let total_weight =
            w.index_quality + w.efficiency + w.scalability + w.execution + w.cost;
        let composite = (breakdown.index_quality.score * w.index_quality
            + breakdown.efficiency.score * w.efficiency
            + breakdown.scalability.score * w.scalability
            + breakdown.execution.score * w.execution
            + breakdown.cost.score * w.cost)
            / total_weight.max(f64::EPSILON);
        let composite = (composite * 10.0).round() / 10.0;

        let has_critical = findings.iter().any(|f| f.severity == Severity::Critical);

        ScoreReport {
            breakdown,
            composite_score: composite,
            grade: Grade::from_score(composite),
            passed: composite >= 70.0 && !has_critical
        }
    }
}

fn index_quality(metrics: &Metrics) -> DimensionScore {
    if metrics.is_intentional_scan {
        return DimensionScore::new(
            100.0,
            "full scan is intentional, index usage is not expected"
        );
    }
    if metrics.is_zero_row_const {
        return DimensionScore::new(100.0, "resolved as a zero-row const lookup");
    }
    if metrics.has_table_scan && !metrics.is_index_backed {
        return DimensionScore::new(30.0, "table scan without any index backing");
    }
    if metrics.primary_access_type == Some(AccessType::IndexScan)
        && !metrics.has_covering_index
    {
        return DimensionScore::new(60.0, "full index scan without a covering index");
    }
    if metrics.is_index_backed && !metrics.has_table_scan {
        let penalty = if metrics.has_index_merge { 10.0 } else { 0.0 };
        let rationale = if metrics.has_index_merge {
            "index backed, penalized for relying on an index merge"
        } else if metrics.has_covering_index {
            "index backed with a covering index"
        } else {
            "index backed access path"
        };
        return DimensionScore::new(100.0 - penalty, rationale);
    }
    if metrics.is_index_backed {
        return DimensionScore::new(50.0, "index present but part of the plan still scans");
    }
    DimensionScore::new(50.0, "no plan evidence about index usage")
}

fn efficiency(metrics: &Metrics) -> DimensionScore {
    let Some(examined) = metrics.rows_examined else {
        return DimensionScore::new(100.0, "rows examined not measured");
    };
    if examined == 0 {
        return DimensionScore::new(100.0, "no rows examined");
    }
    let Some(returned) = metrics.rows_returned else {
        return DimensionScore::new(70.0, "rows returned not measured");
    };
    let ratio = (returned as f64 / examined as f64).min(1.0);
    let raw = 100.0 * ratio;
    let score = if returned == 0 { raw } else { raw.max(10.0) };
    DimensionScore::new(
        score,
        format!("{} of {} examined rows were returned", returned, examined)
    )
}

fn scalability(metrics: &Metrics) -> DimensionScore {
    if metrics.is_intentional_scan {
        return DimensionScore::new(100.0, "linear cost is accepted for an intentional scan");
    }
    let Some(complexity) = metrics.complexity else {
        return DimensionScore::new(70.0, "complexity unknown without a plan");
    };
    let score = match complexity {
        Complexity::Constant => 100.0,
        Complexity::Logarithmic => 90.0,
        Complexity::LogRange => 80.0,
        Complexity::Linear => 50.0,
        Complexity::Linearithmic => 30.0,
        Complexity::Quadratic => 10.0,
        Complexity::Cubic => 0.0
    };
    DimensionScore::new(score, format!("estimated complexity {}", complexity))
}

fn execution(metrics: &Metrics) -> DimensionScore {
    let Some(elapsed) = metrics.execution_time_ms else {
        return DimensionScore::new(100.0, "execution time not measured");
    };
    let score = if elapsed <= 1.0 {
        100.0
    } else if elapsed <= 10.0 {
        95.0
    } else if elapsed <= 50.0 {
        85.0
    } else if elapsed <= 100.0 {
        70.0
    } else if elapsed <= 500.0 {
        50.0
    } else if elapsed <= 1000.0 {
        30.0
    } else {
        10.0
    };
    DimensionScore::new(score, format!("executed in {:.1} ms", elapsed))
}

fn cost(metrics: &Metrics) -> DimensionScore {
    let mut score = 100.0;
    let mut penalties = Vec::new();
    if metrics.has_temp_table {
        score -= 15.0;
        penalties.push("temporary table");
    }
    if metrics.has_disk_temp {
        score -= 25.0;
        penalties.push("on-disk temporary table");
    }
    if metrics.has_weedout {
        score -= 10.0;
        penalties.push("semi-join weedout");
    }
    if metrics.nested_loop_depth > 2 {
        score -= 5.0 * f64::from(metrics.nested_loop_depth - 2);
        penalties.push("deep nested loops");
    }
    let rationale = if penalties.is_empty() {
        "no plan-shape penalties".to_string()
    } else {
        format!("penalized for {}", penalties.join(", "))
    };
    DimensionScore::new(score, rationale)
}
