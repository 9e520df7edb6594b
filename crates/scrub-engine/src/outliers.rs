//! Outlier suggestion engine (IQR method).

use std::collections::BTreeMap;

use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use tracing::debug;

use scrub_common::{fences, numeric_values};
use scrub_model::{
    ColumnId, Diagnostics, IdentityMap, OutlierAction, Result, SuggestionRecord,
};

/// Thresholds for outlier recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierConfig {
    /// Fence multiplier: fences sit at `Q1 - k*IQR` and `Q3 + k*IQR`.
    pub iqr_multiplier: f64,
    /// Out-of-fence fraction at or below this recommends dropping the
    /// offending rows.
    pub remove_row_max: f64,
    /// Out-of-fence fraction at or below this (but above `remove_row_max`)
    /// recommends capping. Above it the values are too pervasive to treat
    /// as anomalies and the recommendation is to skip.
    pub cap_max: f64,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            iqr_multiplier: 1.5,
            remove_row_max: 0.01,
            cap_max: 0.30,
        }
    }
}

/// Flag numeric columns with out-of-fence values and recommend a treatment.
///
/// Columns with no outliers (including zero-variance columns) are omitted.
pub fn suggest_outliers(
    df: &DataFrame,
    map: &IdentityMap,
    config: &OutlierConfig,
) -> Result<BTreeMap<ColumnId, SuggestionRecord<OutlierAction>>> {
    let rows = df.height();
    let mut out = BTreeMap::new();
    for (id, entry) in map.iter() {
        if !entry.kind.is_numeric() {
            continue;
        }
        let column = df.column(&entry.name)?;
        let values: Vec<f64> = numeric_values(column).into_iter().flatten().collect();
        let Some(fences) = fences(&values, config.iqr_multiplier) else {
            continue;
        };

        let outliers = values.iter().filter(|v| !fences.contains(**v)).count();
        if outliers == 0 || rows == 0 {
            continue;
        }
        let fraction = outliers as f64 / rows as f64;

        let action = if fraction <= config.remove_row_max {
            OutlierAction::RemoveRow
        } else if fraction <= config.cap_max {
            OutlierAction::Cap
        } else {
            OutlierAction::Skip
        };

        debug!(column = %entry.name, %id, fraction, ?action, "outlier suggestion");
        out.insert(
            id,
            SuggestionRecord {
                column: entry.name.clone(),
                action,
                stats: Diagnostics {
                    outlier_fraction: Some(fraction),
                    lower_fence: Some(fences.lower),
                    upper_fence: Some(fences.upper),
                    ..Diagnostics::default()
                },
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

    fn numeric_map(df: &DataFrame) -> IdentityMap {
        IdentityMap::from_schema(
            df.get_columns()
                .iter()
                .map(|c| (c.name().to_string(), ColumnKind::Numeric)),
        )
    }

    /// Q1=10, Q3=20 gives fences [-5, 35]: 36 is out, 35 is exactly on the
    /// fence and must not be flagged.
    #[test]
    fn fence_boundary_is_exclusive() {
        // Five points: quantiles of [10, 12, 15, 18, 20] are Q1=12, Q3=18.
        // Use a shape whose quartiles land exactly on 10 and 20 instead.
        let values = [10.0, 10.0, 10.0, 20.0, 20.0, 20.0];
        let f = fences(&values, 1.5).unwrap();
        assert_eq!(f.lower, -5.0);
        assert_eq!(f.upper, 35.0);
        assert!(f.contains(35.0));
        assert!(!f.contains(36.0));
        assert!(f.contains(-5.0));
        assert!(!f.contains(-5.1));
    }

    #[test]
    fn zero_variance_column_is_omitted() {
        let df = DataFrame::new(vec![Column::new("x".into(), vec![5.0; 50])]).unwrap();
        let map = numeric_map(&df);
        let suggestions = suggest_outliers(&df, &map, &OutlierConfig::default()).unwrap();
        assert!(suggestions.is_empty());
    }

    #[test]
    fn rare_outliers_prefer_row_removal() {
        let mut values: Vec<f64> = (0..1000).map(|i| f64::from(i % 100)).collect();
        values[0] = 1e6;
        let df = DataFrame::new(vec![Column::new("x".into(), values)]).unwrap();
        let map = numeric_map(&df);
        let suggestions = suggest_outliers(&df, &map, &OutlierConfig::default()).unwrap();
        let record = &suggestions[&ColumnId::new(0)];
        assert_eq!(record.action, OutlierAction::RemoveRow);
        assert_eq!(record.stats.outlier_fraction, Some(0.001));
    }

    #[test]
    fn moderate_outliers_prefer_capping() {
        // 10% of rows far outside the fences.
        let mut values: Vec<f64> = (0..100).map(|i| f64::from(i % 10)).collect();
        for v in values.iter_mut().take(10) {
            *v = 1e4;
        }
        let df = DataFrame::new(vec![Column::new("x".into(), values)]).unwrap();
        let map = numeric_map(&df);
        let suggestions = suggest_outliers(&df, &map, &OutlierConfig::default()).unwrap();
        assert_eq!(
            suggestions[&ColumnId::new(0)].action,
            OutlierAction::Cap
        );
    }

    #[test]
    fn non_numeric_columns_are_ignored() {
        let df = DataFrame::new(vec![Column::new("x".into(), &["a", "b", "c"])]).unwrap();
        let map = IdentityMap::from_schema(vec![("x".to_string(), ColumnKind::Categorical)]);
        let suggestions = suggest_outliers(&df, &map, &OutlierConfig::default()).unwrap();
        assert!(suggestions.is_empty());
    }
}
