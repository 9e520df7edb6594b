#![deny(unsafe_code)]

//! Shared helpers for the scrub pipeline.
//!
//! - **values**: extracting `f64`/string views of polars columns
//! - **stats**: the statistics kernel (moments, quantiles, correlations)

pub mod stats;
pub mod values;

pub use stats::{
    Fences, fences, mean, pearson, population_std, quantile, ranks, sample_std, skewness, spearman,
};
pub use values::{
    any_to_f64, any_to_string, distinct_non_null, format_numeric, missing_fraction,
    non_null_numeric, numeric_values, rendered_values, unique_fraction,
};
