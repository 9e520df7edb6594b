//! Row and cell primitives shared by the stage appliers.

use std::collections::BTreeMap;

use polars::prelude::{AnyValue, BooleanChunked, Column, DataFrame, NewChunkedArray};

use scrub_common::{numeric_values, rendered_values};
use scrub_model::{ColumnKind, Result};

/// Filter the frame down to the rows flagged `true`.
pub fn keep_rows(df: &DataFrame, keep: &[bool]) -> Result<DataFrame> {
    let mask = BooleanChunked::from_slice("keep".into(), keep);
    Ok(df.filter(&mask)?)
}

/// Drop every row that is null in at least one of the named columns.
pub fn drop_rows_with_nulls(df: &DataFrame, names: &[&str]) -> Result<DataFrame> {
    let mut keep = vec![true; df.height()];
    for name in names {
        let column = df.column(name)?;
        for (idx, slot) in keep.iter_mut().enumerate() {
            if matches!(column.get(idx).unwrap_or(AnyValue::Null), AnyValue::Null) {
                *slot = false;
            }
        }
    }
    keep_rows(df, &keep)
}

/// Numeric view of a column, casting when the recorded kind is not numeric.
///
/// For a numeric column this is just the cell values. For any other kind the
/// cast succeeds only when every non-null cell parses as a number; otherwise
/// `None`, and the caller decides whether that is a skip or an error.
pub fn numeric_view(column: &Column, kind: ColumnKind) -> Option<Vec<Option<f64>>> {
    let values = numeric_values(column);
    if kind.is_numeric() {
        return Some(values);
    }
    let parsed = values.iter().flatten().count();
    let non_null = column.len() - column.null_count();
    (parsed == non_null).then_some(values)
}

/// Most frequent non-null rendered value. Ties resolve to the
/// lexicographically smallest candidate; `None` for an all-null column.
pub fn mode_value(column: &Column) -> Option<String> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for value in rendered_values(column).into_iter().flatten() {
        *counts.entry(value).or_insert(0) += 1;
    }
    let mut best: Option<(String, usize)> = None;
    for (value, count) in counts {
        match &best {
            Some((_, top)) if *top >= count => {}
            _ => best = Some((value, count)),
        }
    }
    best.map(|(value, _)| value)
}
