//! Categorical-encoding suggestion engine.

use std::collections::BTreeMap;

use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use tracing::debug;

use scrub_common::{distinct_non_null, unique_fraction};
use scrub_model::{
    ColumnId, ColumnKind, Diagnostics, EncodingAction, IdentityMap, Result, SuggestionRecord,
};

/// Cardinality cutoff for one-hot encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingConfig {
    /// One-hot encode up to and including this many distinct values; above
    /// it, label encode to keep the column count in check.
    pub one_hot_max_cardinality: usize,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            one_hot_max_cardinality: 10,
        }
    }
}

/// Recommend an encoding for every categorical column.
///
/// `Skip` is never recommended automatically; it exists for user overrides.
pub fn suggest_encoding(
    df: &DataFrame,
    map: &IdentityMap,
    config: &EncodingConfig,
) -> Result<BTreeMap<ColumnId, SuggestionRecord<EncodingAction>>> {
    let mut out = BTreeMap::new();
    for (id, entry) in map.iter() {
        if entry.kind != ColumnKind::Categorical {
            continue;
        }
        let column = df.column(&entry.name)?;
        let distinct = distinct_non_null(column).len();
        if distinct == 0 {
            continue;
        }

        let action = if distinct <= config.one_hot_max_cardinality {
            EncodingAction::OneHot
        } else {
            EncodingAction::Label
        };

        debug!(column = %entry.name, %id, distinct, ?action, "encoding suggestion");
        out.insert(
            id,
            SuggestionRecord {
                column: entry.name.clone(),
                action,
                stats: Diagnostics {
                    distinct_count: Some(distinct),
                    unique_fraction: Some(unique_fraction(column)),
                    ..Diagnostics::default()
                },
            },
        );
    }
    Ok(out)
}
