//! Missing-value suggestion engine.

use std::collections::BTreeMap;

use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use tracing::debug;

use scrub_common::{missing_fraction, non_null_numeric, skewness};
use scrub_model::{
    ColumnId, Diagnostics, IdentityMap, MissingAction, Result, SuggestionRecord,
};

/// Thresholds for missing-value recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MissingConfig {
    /// Missing fraction strictly above this recommends dropping the column.
    pub drop_col_threshold: f64,
    /// Missing fraction strictly below this recommends dropping the few
    /// affected rows instead of imputing.
    pub drop_row_threshold: f64,
    /// Absolute skewness above this prefers the median over the mean.
    pub skew_cutoff: f64,
}

impl Default for MissingConfig {
    fn default() -> Self {
        Self {
            drop_col_threshold: 0.5,
            drop_row_threshold: 0.01,
            skew_cutoff: 1.0,
        }
    }
}

/// Recommend a repair action for every column with at least one null.
///
/// Decision order: drop the column when more than `drop_col_threshold` is
/// missing; drop the rows when less than `drop_row_threshold` is missing;
/// otherwise impute with the mode (non-numeric) or with the mean/median
/// depending on skewness.
pub fn suggest_missing(
    df: &DataFrame,
    map: &IdentityMap,
    config: &MissingConfig,
) -> Result<BTreeMap<ColumnId, SuggestionRecord<MissingAction>>> {
    let mut out = BTreeMap::new();
    for (id, entry) in map.iter() {
        let column = df.column(&entry.name)?;
        let fraction = missing_fraction(column);
        if fraction <= 0.0 {
            continue;
        }

        let mut stats = Diagnostics {
            missing_fraction: Some(fraction),
            ..Diagnostics::default()
        };

        let action = if fraction > config.drop_col_threshold {
            MissingAction::DropCol
        } else if fraction < config.drop_row_threshold {
            MissingAction::DropRow
        } else if !entry.kind.is_numeric() {
            MissingAction::Mode
        } else {
            let skew = skewness(&non_null_numeric(column)).unwrap_or(0.0);
            stats.skewness = Some(skew);
            if skew.abs() > config.skew_cutoff {
                MissingAction::Median
            } else {
                MissingAction::Mean
            }
        };

        debug!(column = %entry.name, %id, fraction, ?action, "missing suggestion");
        out.insert(
            id,
            SuggestionRecord {
                column: entry.name.clone(),
                action,
                stats,
            },
        );
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::Column;
    use scrub_model::ColumnKind;

    fn map_for(df: &DataFrame) -> IdentityMap {
        IdentityMap::from_schema(df.get_columns().iter().map(|c| {
            let kind = if matches!(c.dtype(), polars::prelude::DataType::Float64) {
                ColumnKind::Numeric
            } else {
                ColumnKind::Categorical
            };
            (c.name().to_string(), kind)
        }))
    }

    #[test]
    fn complete_columns_are_omitted() {
        let df = DataFrame::new(vec![Column::new("x".into(), vec![1.0, 2.0, 3.0])]).unwrap();
        let map = map_for(&df);
        let suggestions = suggest_missing(&df, &map, &MissingConfig::default()).unwrap();
        assert!(suggestions.is_empty());
    }

    #[test]
    fn mostly_missing_column_is_dropped() {
        let values: Vec<Option<f64>> = (0..10).map(|i| (i >= 6).then_some(1.0)).collect();
        let df = DataFrame::new(vec![Column::new("x".into(), values)]).unwrap();
        let map = map_for(&df);
        let suggestions = suggest_missing(&df, &map, &MissingConfig::default()).unwrap();
        assert_eq!(
            suggestions[&ColumnId::new(0)].action,
            MissingAction::DropCol
        );
    }

    #[test]
    fn exactly_half_missing_is_not_drop_col() {
        // 50% missing sits on the boundary; the comparison is strict.
        let values: Vec<Option<f64>> = (0..10).map(|i| (i >= 5).then_some(f64::from(i))).collect();
        let df = DataFrame::new(vec![Column::new("x".into(), values)]).unwrap();
        let map = map_for(&df);
        let suggestions = suggest_missing(&df, &map, &MissingConfig::default()).unwrap();
        assert_ne!(
            suggestions[&ColumnId::new(0)].action,
            MissingAction::DropCol
        );
    }

    #[test]
    fn tiny_missing_fraction_prefers_row_drop() {
        let mut values: Vec<Option<f64>> = (0..1000).map(|i| Some(f64::from(i))).collect();
        values[3] = None;
        let df = DataFrame::new(vec![Column::new("x".into(), values)]).unwrap();
        let map = map_for(&df);
        let suggestions = suggest_missing(&df, &map, &MissingConfig::default()).unwrap();
        assert_eq!(
            suggestions[&ColumnId::new(0)].action,
            MissingAction::DropRow
        );
    }

    #[test]
    fn skewed_numeric_prefers_median() {
        // Heavy right tail, ~10% missing.
        let mut values: Vec<Option<f64>> = vec![Some(1.0); 17];
        values.extend([Some(2.0), Some(500.0), None, None]);
        let df = DataFrame::new(vec![Column::new("x".into(), values)]).unwrap();
        let map = map_for(&df);
        let suggestions = suggest_missing(&df, &map, &MissingConfig::default()).unwrap();
        let record = &suggestions[&ColumnId::new(0)];
        assert_eq!(record.action, MissingAction::Median);
        assert!(record.stats.skewness.unwrap() > 1.0);
    }

    #[test]
    fn symmetric_numeric_prefers_mean_and_text_prefers_mode() {
        let numeric: Vec<Option<f64>> = vec![
            Some(1.0),
            Some(2.0),
            Some(3.0),
            Some(4.0),
            Some(5.0),
            None,
            Some(3.0),
            Some(3.0),
            Some(2.0),
            Some(4.0),
        ];
        let text: Vec<Option<&str>> = vec![
            Some("a"),
            Some("b"),
            None,
            Some("a"),
            Some("a"),
            Some("b"),
            Some("a"),
            Some("b"),
            Some("a"),
            Some("a"),
        ];
        let df = DataFrame::new(vec![
            Column::new("num".into(), numeric),
            Column::new("cat".into(), text),
        ])
        .unwrap();
        let map = map_for(&df);
        let suggestions = suggest_missing(&df, &map, &MissingConfig::default()).unwrap();
        assert_eq!(suggestions[&ColumnId::new(0)].action, MissingAction::Mean);
        assert_eq!(suggestions[&ColumnId::new(1)].action, MissingAction::Mode);
    }
}
