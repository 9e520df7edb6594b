#![deny(unsafe_code)]

use std::fmt;

use serde::{Deserialize, Serialize};

/// A stable integer handle for a column, independent of its current name.
///
/// Ids are assigned by the [`IdentityMap`](crate::IdentityMap): positional at
/// upload, monotonically increasing afterwards, and never reused within a
/// session. A UI can therefore hold on to a `ColumnId` across renames and
/// drops and either resolve it or get a clean `ColumnNotFound`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ColumnId(u32);

impl ColumnId {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ColumnId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Broad column type as the pipeline sees it.
///
/// Classified once from the polars dtype at ingest and re-derived whenever a
/// stage changes a column's physical type (label encoding, one-hot fan-out).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Integer or floating point.
    Numeric,
    /// Free text or categorical.
    Categorical,
    /// Date, datetime or time.
    Datetime,
}

impl ColumnKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Categorical => "categorical",
            Self::Datetime => "datetime",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Numeric)
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
