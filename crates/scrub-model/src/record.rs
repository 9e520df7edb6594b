//! Wire-facing records: suggestions, schema descriptors and the step log.

use serde::{Deserialize, Serialize};

use crate::actions::Stage;
use crate::ids::{ColumnId, ColumnKind};
use crate::plan::StagePlan;

/// Diagnostic statistics supporting a suggestion. Each engine fills in the
/// fields it computes and leaves the rest unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_fraction: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_fraction: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skewness: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outlier_fraction: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lower_fence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper_fence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distinct_count: Option<usize>,
}

/// Computed diagnostic plus recommended action for one column, before any
/// user override. Recomputed fresh on every stage entry, never cached across
/// dataset versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionRecord<A> {
    /// Current display name of the column.
    pub column: String,
    /// Recommended action from the stage vocabulary.
    pub action: A,
    /// Supporting statistics.
    pub stats: Diagnostics,
}

/// One column of the current schema, as reported to collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub id: ColumnId,
    pub name: String,
    pub kind: ColumnKind,
    /// Distinct values as a fraction of rows.
    pub unique_fraction: f64,
    /// Nulls as a fraction of rows.
    pub missing_fraction: f64,
}

/// Shape and per-column descriptors of the latest committed dataset version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaReport {
    pub columns: Vec<ColumnDescriptor>,
    pub rows: usize,
}

impl SchemaReport {
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

/// One committed step of a session's history. The ordered log is sufficient
/// to replay or export the whole transformation sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Dataset version this step produced.
    pub version: u64,
    pub stage: Stage,
    /// The plan exactly as applied (after deduplication).
    pub plan: StagePlan,
    pub rows_after: usize,
    pub columns_after: usize,
}
