//! Numeric-scaling suggestion engine.

use std::collections::BTreeMap;

use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use tracing::debug;

use scrub_common::{distinct_non_null, non_null_numeric, skewness};
use scrub_model::{
    ColumnId, Diagnostics, IdentityMap, Result, ScalingAction, SuggestionRecord,
};

/// Skewness cutoff for scaler selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalingConfig {
    /// Absolute skewness up to and including this prefers standardization;
    /// above it min-max scaling distorts the distribution less.
    pub skew_cutoff: f64,
}

impl Default for ScalingConfig {
    fn default() -> Self {
        Self { skew_cutoff: 1.0 }
    }
}

/// Recommend a scaler for every numeric column with more than two distinct
/// values. Binary and constant columns gain nothing from scaling and are
/// omitted.
pub fn suggest_scaling(
    df: &DataFrame,
    map: &IdentityMap,
    config: &ScalingConfig,
) -> Result<BTreeMap<ColumnId, SuggestionRecord<ScalingAction>>> {
    let mut out = BTreeMap::new();
    for (id, entry) in map.iter() {
        if !entry.kind.is_numeric() {
            continue;
        }
        let column = df.column(&entry.name)?;
        if distinct_non_null(column).len() <= 2 {
            continue;
        }

        let skew = skewness(&non_null_numeric(column)).unwrap_or(0.0);
        let action = if skew.abs() <= config.skew_cutoff {
            ScalingAction::Standard
        } else {
            ScalingAction::MinMax
        };

        debug!(column = %entry.name, %id, skew, ?action, "scaling suggestion");
        out.insert(
            id,
            SuggestionRecord {
                column: entry.name.clone(),
                action,
                stats: Diagnostics {
                    skewness: Some(skew),
                    ..Diagnostics::default()
                },
            },
        );
    }
    Ok(out)
}
