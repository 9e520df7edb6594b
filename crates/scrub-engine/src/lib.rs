#![deny(unsafe_code)]

//! Suggestion engines for the scrub pipeline.
//!
//! Each engine is a pure function of `(dataset, identity map, config)`
//! returning a map of column id to [`SuggestionRecord`]. Columns that do not
//! qualify for a stage are omitted entirely; an empty map signals the stage
//! should be auto-skipped. Engines never mutate the dataset and are
//! deterministic for a given snapshot.
//!
//! - **missing**: repair recommendations for columns with nulls
//! - **outliers**: IQR-fence detection on numeric columns
//! - **encoding**: one-hot vs label for categoricals
//! - **scaling**: standard vs min-max for numerics
//! - **correlate**: redundancy-graph pruning over the correlation matrix

pub mod correlate;
pub mod encoding;
pub mod missing;
pub mod outliers;
pub mod scaling;

use serde::{Deserialize, Serialize};

pub use correlate::{
    CorrMethod, CorrelatedPair, CorrelationConfig, CorrelationPreview, preview_correlation,
};
pub use encoding::{EncodingConfig, suggest_encoding};
pub use missing::{MissingConfig, suggest_missing};
pub use outliers::{OutlierConfig, suggest_outliers};
pub use scaling::{ScalingConfig, suggest_scaling};

/// All stage configurations in one place, with the documented defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub missing: MissingConfig,
    pub outliers: OutlierConfig,
    pub encoding: EncodingConfig,
    pub scaling: ScalingConfig,
    pub correlation: CorrelationConfig,
}
