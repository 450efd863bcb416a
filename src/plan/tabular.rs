//! Tabular EXPLAIN rows and the canonical access-type mapping.
//!
//! | EXPLAIN `type` | access type | complexity |
//! |---|---|---|
//! | `system`, `const` | `const_row` (or `zero_row_const`) | O(1) |
//! | `eq_ref` | `single_row_lookup` | O(1) |
//! | `ref`, `ref_or_null`, `fulltext` | `index_lookup` | O(log n) |
//! | `range` | `index_range_scan` | O(log n + k) |
//! | `index_merge` | `index_lookup` + merge flag | O(log n + k) |
//! | `index` | `index_scan` | O(n) |
//! | `ALL` | `table_scan` | O(n) |

use compact_str::CompactString;
use serde::{Deserialize, Deserializer, Serialize};

use crate::metrics::{AccessType, Complexity};

/// One row of tabular EXPLAIN output.
///
/// Column names follow MySQL conventions; numeric columns tolerate string
/// encoding because drivers frequently return everything as text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExplainRow {
    #[serde(default, rename = "type", alias = "access_type")]
    pub access_type:   Option<CompactString>,
    #[serde(default)]
    pub select_type:   Option<CompactString>,
    #[serde(default)]
    pub table:         Option<CompactString>,
    #[serde(default)]
    pub key:           Option<CompactString>,
    #[serde(default)]
    pub possible_keys: Option<CompactString>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub rows:          Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub filtered:      Option<f64>,
    #[serde(default, alias = "Extra")]
    pub extra:         Option<String>
}

impl ExplainRow {
    /// Shorthand used by tests and fixtures.
    #[must_use]
    pub fn new(access_type: &str) -> Self {
        Self {
            access_type: Some(access_type.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_table(mut self, table: &str) -> Self {
        self.table = Some(table.into());
        self
    }

    #[must_use]
    pub fn with_key(mut self, key: &str) -> Self {
        self.key = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_rows(mut self, rows: f64) -> Self {
        self.rows = Some(rows);
        self
    }

    #[must_use]
    pub fn with_extra(mut self, extra: &str) -> Self {
        self.extra = Some(extra.to_string());
        self
    }
}

/// Accept numbers encoded as JSON numbers or as strings.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None
    }))
}

/// Booleans decoded from the `Extra` column.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ExtraFlags {
    pub covering:        bool,
    pub temp_table:      bool,
    pub filesort:        bool,
    pub weedout:         bool,
    pub no_matching_row: bool,
    pub early_exit:      bool
}

/// Decode the canonical MySQL `Extra` token set.
///
/// Tokens compose ("Using where; Using index"), so the column is split on
/// `;` and each token is matched on its own. "Using index condition" is an
/// index-condition pushdown marker, not a covering read.
pub(crate) fn parse_extra(extra: &str) -> ExtraFlags {
    let mut flags = ExtraFlags::default();
    for token in extra.to_ascii_lowercase().split(';') {
        match token.trim() {
            "using index" => flags.covering = true,
            "using temporary" => flags.temp_table = true,
            "using filesort" => flags.filesort = true,
            "start temporary" | "end temporary" => flags.weedout = true,
            token if token.starts_with("using index for group-by") => {
                flags.covering = true;
                flags.early_exit = true;
            }
            token
                if token.contains("no matching row in const table")
                    || token.contains("impossible where")
                    || token.contains("select tables optimized away") =>
            {
                flags.no_matching_row = true;
            }
            _ => {}
        }
    }
    flags
}

/// Map a raw EXPLAIN `type` to the canonical access type and complexity.
///
/// `None` means the value is unrecognized and should surface as a parse
/// warning rather than a guess.
pub(crate) fn map_access(raw: &str, flags: ExtraFlags) -> Option<(AccessType, Complexity)> {
    match raw.to_ascii_lowercase().as_str() {
        "system" | "const" => {
            if flags.no_matching_row {
                Some((AccessType::ZeroRowConst, Complexity::Constant))
            } else {
                Some((AccessType::ConstRow, Complexity::Constant))
            }
        }
        "eq_ref" => Some((AccessType::SingleRowLookup, Complexity::Constant)),
        "ref" | "ref_or_null" | "fulltext" => {
            Some((AccessType::IndexLookup, Complexity::Logarithmic))
        }
        "range" => Some((AccessType::IndexRangeScan, Complexity::LogRange)),
        "index_merge" => Some((AccessType::IndexLookup, Complexity::LogRange)),
        "index" => Some((AccessType::IndexScan, Complexity::Linear)),
        "all" => Some((AccessType::TableScan, Complexity::Linear)),
        _ => None
    }
}

/// Split a `key` column value into individual index names.
///
/// `index_merge` rows report keys like `union(idx_a,idx_b)`; plain rows
/// report a single name.
pub(crate) fn split_keys(key: &str) -> Vec<CompactString> {
    if let Some(open) = key.find('(')
        && let Some(close) = key.rfind(')')
        && close > open
    {
        key[open + 1..close]
            .split(',')
            .map(|k| k.trim().into())
            .filter(|k: &CompactString| !k.is_empty())
            .collect()
    } else {
        let trimmed = key.trim();
        if trimmed.is_empty() {
            Vec::new()
        } else {
            vec![trimmed.into()]
        }
    }
}
