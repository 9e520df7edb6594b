//! Polars `AnyValue` extraction utilities.
//!
//! The engines and the applier work on per-row `f64`/string views of columns
//! rather than on polars expressions, so that decision thresholds stay
//! exactly testable.

use std::collections::BTreeSet;

use polars::prelude::{AnyValue, Column};

/// Convert an `AnyValue` to `f64`, `None` for null or non-numeric values.
pub fn any_to_f64(value: AnyValue<'_>) -> Option<f64> {
    match value {
        AnyValue::Null => None,
        AnyValue::Int8(v) => Some(f64::from(v)),
        AnyValue::Int16(v) => Some(f64::from(v)),
        AnyValue::Int32(v) => Some(f64::from(v)),
        AnyValue::Int64(v) => Some(v as f64),
        AnyValue::UInt8(v) => Some(f64::from(v)),
        AnyValue::UInt16(v) => Some(f64::from(v)),
        AnyValue::UInt32(v) => Some(f64::from(v)),
        AnyValue::UInt64(v) => Some(v as f64),
        AnyValue::Float32(v) => Some(f64::from(v)),
        AnyValue::Float64(v) => Some(v),
        AnyValue::Boolean(b) => Some(if b { 1.0 } else { 0.0 }),
        AnyValue::String(s) => s.trim().parse().ok(),
        AnyValue::StringOwned(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Convert an `AnyValue` to a display string. Null renders as empty; floats
/// drop trailing zeros so that `1.0` and `1` compare equal as categories.
pub fn any_to_string(value: AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::Int8(v) => v.to_string(),
        AnyValue::Int16(v) => v.to_string(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::UInt8(v) => v.to_string(),
        AnyValue::UInt16(v) => v.to_string(),
        AnyValue::UInt32(v) => v.to_string(),
        AnyValue::UInt64(v) => v.to_string(),
        AnyValue::Float32(v) => format_numeric(f64::from(v)),
        AnyValue::Float64(v) => format_numeric(v),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Boolean(b) => if b { "true" } else { "false" }.to_string(),
        other => other.to_string(),
    }
}

/// Format a float without trailing zeros.
pub fn format_numeric(v: f64) -> String {
    let s = format!("{v}");
    let trimmed = s.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Per-row numeric view of a column, `None` where the cell is null or not
/// parseable as a number.
pub fn numeric_values(column: &Column) -> Vec<Option<f64>> {
    (0..column.len())
        .map(|idx| any_to_f64(column.get(idx).unwrap_or(AnyValue::Null)))
        .collect()
}

/// Non-null numeric values of a column, in row order.
pub fn non_null_numeric(column: &Column) -> Vec<f64> {
    numeric_values(column).into_iter().flatten().collect()
}

/// Per-row rendered view of a column, `None` where the cell is null.
pub fn rendered_values(column: &Column) -> Vec<Option<String>> {
    (0..column.len())
        .map(|idx| match column.get(idx).unwrap_or(AnyValue::Null) {
            AnyValue::Null => None,
            value => Some(any_to_string(value)),
        })
        .collect()
}

/// Sorted distinct non-null values, rendered as strings.
pub fn distinct_non_null(column: &Column) -> Vec<String> {
    let set: BTreeSet<String> = rendered_values(column).into_iter().flatten().collect();
    set.into_iter().collect()
}

/// Nulls as a fraction of rows. Zero for an empty column.
pub fn missing_fraction(column: &Column) -> f64 {
    if column.is_empty() {
        return 0.0;
    }
    column.null_count() as f64 / column.len() as f64
}

/// Distinct non-null values as a fraction of rows. Zero for an empty column.
pub fn unique_fraction(column: &Column) -> f64 {
    if column.is_empty() {
        return 0.0;
    }
    distinct_non_null(column).len() as f64 / column.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::Column;

    #[test]
    fn numeric_view_parses_strings_and_skips_nulls() {
        let col = Column::new("x".into(), &[Some("1.5"), None, Some("oops")]);
        assert_eq!(numeric_values(&col), vec![Some(1.5), None, None]);
        assert_eq!(non_null_numeric(&col), vec![1.5]);
    }

    #[test]
    fn fractions_on_mixed_column() {
        let col = Column::new("x".into(), &[Some("a"), Some("a"), None, Some("b")]);
        assert_eq!(missing_fraction(&col), 0.25);
        assert_eq!(unique_fraction(&col), 0.5);
    }

    #[test]
    fn distinct_values_are_sorted() {
        let col = Column::new("x".into(), &[Some("b"), Some("a"), Some("b"), None]);
        assert_eq!(distinct_non_null(&col), vec!["a", "b"]);
    }

    #[test]
    fn format_numeric_trims_trailing_zeros() {
        assert_eq!(format_numeric(1.0), "1");
        assert_eq!(format_numeric(1.50), "1.5");
        assert_eq!(format_numeric(0.0), "0");
    }
}
