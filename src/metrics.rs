//! The canonical feature vector produced by plan parsing and reconciliation.
//!
//! [`Metrics`] is a structured record with explicit optional fields for each
//! documented key; it serializes to a dynamic string-keyed mapping only at
//! report boundaries via [`Metrics::to_map`].
//!
//! Key families:
//!
//! - **Access**: how tables are read (`primary_access_type`, index usage)
//! - **Volume**: rows examined vs returned, per-table estimates
//! - **Shape**: plan-shape booleans (scans, temp tables, filesort, weedout)
//! - **Complexity**: algorithmic class and risk
//! - **Context**: accessed tables and wall-clock time

use compact_str::CompactString;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value, json};
use smallvec::SmallVec;

/// Type alias for small index-name vectors (typically < 4 elements)
pub type IndexVec = SmallVec<[CompactString; 4]>;

/// The shape of how the driving table is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum AccessType {
    /// Single constant row (`system`/`const`)
    ConstRow,
    /// `const` access that matched no row at all
    ZeroRowConst,
    /// Unique-key lookup returning at most one row (`eq_ref`)
    SingleRowLookup,
    /// Non-unique index lookup (`ref`, `ref_or_null`, `index_merge`)
    IndexLookup,
    /// Bounded range over an index (`range`)
    IndexRangeScan,
    /// Full scan of the table heap (`ALL`)
    TableScan,
    /// Full scan of an index (`index`)
    IndexScan
}

impl AccessType {
    /// Whether this access path goes through an index at all.
    ///
    /// Only a heap scan is index-free; even `index` (full index scan) is
    /// backed by an index structure.
    #[must_use]
    pub fn is_index_backed(self) -> bool {
        !matches!(self, Self::TableScan)
    }

    /// Default algorithmic complexity for this access path.
    #[must_use]
    pub fn default_complexity(self) -> Complexity {
        match self {
            Self::ConstRow | Self::ZeroRowConst | Self::SingleRowLookup => Complexity::Constant,
            Self::IndexLookup => Complexity::Logarithmic,
            Self::IndexRangeScan => Complexity::LogRange,
            Self::TableScan | Self::IndexScan => Complexity::Linear
        }
    }
}

impl std::fmt::Display for AccessType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConstRow => write!(f, "const_row"),
            Self::ZeroRowConst => write!(f, "zero_row_const"),
            Self::SingleRowLookup => write!(f, "single_row_lookup"),
            Self::IndexLookup => write!(f, "index_lookup"),
            Self::IndexRangeScan => write!(f, "index_range_scan"),
            Self::TableScan => write!(f, "table_scan"),
            Self::IndexScan => write!(f, "index_scan")
        }
    }
}

/// Algorithmic complexity class of the access plan.
///
/// Ordered from cheapest to most expensive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Complexity {
    /// O(1)
    Constant,
    /// O(log n)
    Logarithmic,
    /// O(log n + k)
    LogRange,
    /// O(n)
    Linear,
    /// O(n log n)
    Linearithmic,
    /// O(n²)
    Quadratic,
    /// O(n³)
    Cubic
}

impl Complexity {
    /// Risk band for the complexity class.
    #[must_use]
    pub fn risk(self) -> ComplexityRisk {
        match self {
            Self::Constant | Self::Logarithmic | Self::LogRange => ComplexityRisk::Low,
            Self::Linear => ComplexityRisk::Medium,
            Self::Linearithmic => ComplexityRisk::High,
            Self::Quadratic | Self::Cubic => ComplexityRisk::Critical
        }
    }
}

impl std::fmt::Display for Complexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Constant => write!(f, "O(1)"),
            Self::Logarithmic => write!(f, "O(log n)"),
            Self::LogRange => write!(f, "O(log n + k)"),
            Self::Linear => write!(f, "O(n)"),
            Self::Linearithmic => write!(f, "O(n log n)"),
            Self::Quadratic => write!(f, "O(n²)"),
            Self::Cubic => write!(f, "O(n³)")
        }
    }
}

/// Risk band derived from [`Complexity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ComplexityRisk {
    Low,
    Medium,
    High,
    Critical
}

impl std::fmt::Display for ComplexityRisk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
            Self::Critical => write!(f, "CRITICAL")
        }
    }
}

/// Planner vs runtime row counts for one table in the plan.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct TableEstimate {
    pub estimated_rows: Option<f64>,
    pub actual_rows:    Option<f64>,
    pub loops:          Option<f64>
}

/// The canonical feature vector.
///
/// Produced by the plan parser, enriched and repaired by the reconciler,
/// consumed by rules, scoring, and the index synthesizer.
#[derive(Debug, Clone, Serialize)]
pub struct Metrics {
    pub primary_access_type: Option<AccessType>,
    /// Raw `type` string as reported by EXPLAIN, before mapping
    pub mysql_access_type:   Option<CompactString>,
    pub is_index_backed:     bool,
    pub is_zero_row_const:   bool,
    pub indexes_used:        IndexVec,
    pub has_covering_index:  bool,
    pub has_index_merge:     bool,

    pub rows_examined:       Option<u64>,
    pub rows_returned:       Option<u64>,
    pub per_table_estimates: IndexMap<CompactString, TableEstimate>,

    pub has_table_scan:        bool,
    pub has_temp_table:        bool,
    pub has_disk_temp:         bool,
    pub has_weedout:           bool,
    pub has_filesort:          bool,
    pub has_early_termination: bool,
    pub is_intentional_scan:   bool,
    pub nested_loop_depth:     u32,
    pub max_loops:             u64,
    pub fanout_factor:         f64,

    pub complexity: Option<Complexity>,

    pub tables_accessed:   Vec<CompactString>,
    pub execution_time_ms: Option<f64>
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            primary_access_type:   None,
            mysql_access_type:     None,
            is_index_backed:       false,
            is_zero_row_const:     false,
            indexes_used:          IndexVec::new(),
            has_covering_index:    false,
            has_index_merge:       false,
            rows_examined:         None,
            rows_returned:         None,
            per_table_estimates:   IndexMap::new(),
            has_table_scan:        false,
            has_temp_table:        false,
            has_disk_temp:         false,
            has_weedout:           false,
            has_filesort:          false,
            has_early_termination: false,
            is_intentional_scan:   false,
            nested_loop_depth:     0,
            max_loops:             0,
            fanout_factor:         1.0,
            complexity:            None,
            tables_accessed:       Vec::new(),
            execution_time_ms:     None
        }
    }
}

impl Metrics {
    /// Risk band of the current complexity, `None` when complexity is unset.
    #[must_use]
    pub fn complexity_risk(&self) -> Option<ComplexityRisk> {
        self.complexity.map(Complexity::risk)
    }

    /// Serialize to the dynamic string-keyed mapping used at the report
    /// boundary.
    ///
    /// The key set is fixed and versioned; unset scalars serialize as null.
    #[must_use]
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(
            "primary_access_type".into(),
            json!(self.primary_access_type.map(|a| a.to_string()))
        );
        map.insert("mysql_access_type".into(), json!(self.mysql_access_type));
        map.insert("is_index_backed".into(), json!(self.is_index_backed));
        map.insert("is_zero_row_const".into(), json!(self.is_zero_row_const));
        map.insert("indexes_used".into(), json!(self.indexes_used));
        map.insert("has_covering_index".into(), json!(self.has_covering_index));
        map.insert("has_index_merge".into(), json!(self.has_index_merge));
        map.insert("rows_examined".into(), json!(self.rows_examined));
        map.insert("rows_returned".into(), json!(self.rows_returned));
        map.insert("per_table_estimates".into(), json!(self.per_table_estimates));
        map.insert("has_table_scan".into(), json!(self.has_table_scan));
        map.insert("has_temp_table".into(), json!(self.has_temp_table));
        map.insert("has_disk_temp".into(), json!(self.has_disk_temp));
        map.insert("has_weedout".into(), json!(self.has_weedout));
        map.insert("has_filesort".into(), json!(self.has_filesort));
        map.insert("has_early_termination".into(), json!(self.has_early_termination));
        map.insert("is_intentional_scan".into(), json!(self.is_intentional_scan));
        map.insert("nested_loop_depth".into(), json!(self.nested_loop_depth));
        map.insert("max_loops".into(), json!(self.max_loops));
        map.insert("fanout_factor".into(), json!(self.fanout_factor));
        map.insert("complexity".into(), json!(self.complexity.map(|c| c.to_string())));
        map.insert("complexity_label".into(), json!(self.complexity.map(|c| c.to_string())));
        map.insert(
            "complexity_risk".into(),
            json!(self.complexity_risk().map(|r| r.to_string()))
        );
        map.insert("tables_accessed".into(), json!(self.tables_accessed));
        map.insert("execution_time_ms".into(), json!(self.execution_time_ms));
        map
    }
}
