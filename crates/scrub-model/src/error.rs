use thiserror::Error;

use crate::actions::Stage;
use crate::ids::ColumnId;

/// Error taxonomy for the cleaning pipeline.
///
/// Validation errors are raised before any mutation, so a failed call always
/// leaves the session at its last committed version.
#[derive(Debug, Error)]
pub enum ScrubError {
    /// Unknown or expired session id. Fatal to the request.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// A plan referenced a column id that is absent or retired. Recoverable:
    /// refetch the schema and resubmit.
    #[error("column not found: id {0}")]
    ColumnNotFound(ColumnId),

    /// A plan used an action token outside the stage's vocabulary.
    #[error("unknown action '{token}' for stage '{stage}'")]
    UnknownAction { stage: Stage, token: String },

    /// Correlation threshold outside the half-open interval (0, 1].
    #[error("correlation threshold {0} is outside (0, 1]")]
    InvalidThreshold(f64),

    /// The dataset has no rows or no columns.
    #[error("dataset is empty")]
    EmptyDataset,

    /// A physical column has no identity-map entry. This is the stale-map bug
    /// class the map exists to prevent; it indicates a retire/allocate call
    /// was skipped during an apply.
    #[error("identity map out of sync: column '{0}' has no id")]
    IdentityDesync(String),

    #[error(transparent)]
    Polars(#[from] polars::error::PolarsError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ScrubError>;
