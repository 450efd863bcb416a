//! EXPLAIN plan ingestion into the canonical [`Metrics`] vector.
//!
//! Three input forms are supported, matching what real drivers return:
//!
//! - **Tabular rows**: classic `EXPLAIN` output, one row per table
//! - **Tree/JSON**: `EXPLAIN FORMAT=JSON` style nested nodes
//! - **Plain text**: `EXPLAIN ANALYZE` line-oriented tree output
//!
//! The tree and text parsers are authoritative: whatever they derive is
//! never overridden by the tabular fallback, which only fills fields that
//! are still unset (see [`crate::reconcile::enrich_from_explain`]).
//!
//! Unrecognized shapes degrade to parse-warning diagnostics, never errors.

pub mod tabular;
pub mod text;
pub mod tree;

use serde::Serialize;
use serde_json::Value;
pub use tabular::ExplainRow;

use crate::{metrics::Metrics, reconcile, report::Diagnostic};

/// Raw EXPLAIN output as returned by a driver or captured in a file.
///
/// Any of the three forms may be absent; an engine that supports only one
/// form simply leaves the others empty.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlanOutput {
    pub rows: Vec<ExplainRow>,
    pub tree: Option<Value>,
    pub text: Option<String>
}

impl PlanOutput {
    #[must_use]
    pub fn from_rows(rows: Vec<ExplainRow>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn from_tree(tree: Value) -> Self {
        Self {
            tree: Some(tree),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.tree.is_none() && self.text.is_none()
    }

    /// Echo of the raw plan for the report, `None` when nothing was ingested.
    #[must_use]
    pub fn to_value(&self) -> Option<Value> {
        if self.is_empty() {
            return None;
        }
        serde_json::to_value(self).ok()
    }
}

/// Parse EXPLAIN output into raw metrics.
///
/// Tree input wins over text input; tabular rows then enrich whatever is
/// still unset. Returns the metrics plus any parse-warning diagnostics.
#[must_use]
pub fn parse(plan: &PlanOutput) -> (Metrics, Vec<Diagnostic>) {
    let (mut metrics, mut diagnostics) = if let Some(tree_value) = &plan.tree {
        tree::parse(tree_value)
    } else if let Some(text_value) = &plan.text {
        text::parse(text_value)
    } else {
        (Metrics::default(), Vec::new())
    };

    diagnostics.extend(reconcile::enrich_from_explain(&mut metrics, &plan.rows));
    (metrics, diagnostics)
}
