#![deny(unsafe_code)]

//! Core data model for the scrub cleaning pipeline.
//!
//! This crate defines the vocabulary shared by every other crate:
//!
//! - **ids**: stable column identifiers and column kinds
//! - **identity**: the column identity map (name/kind per id, lineage on fan-out)
//! - **actions**: pipeline stages and their closed per-stage action enums
//! - **plan**: user-approved action plans and their deduplication rules
//! - **record**: suggestion records, schema descriptors and the step log
//! - **error**: the error taxonomy

pub mod actions;
pub mod error;
pub mod identity;
pub mod ids;
pub mod plan;
pub mod record;

pub use actions::{
    EncodingAction, MissingAction, OutlierAction, ScalingAction, Stage, StageAction,
};
pub use error::{Result, ScrubError};
pub use identity::{ColumnEntry, IdentityMap};
pub use ids::{ColumnId, ColumnKind};
pub use plan::{Plan, PlanEntry, StagePlan};
pub use record::{ColumnDescriptor, Diagnostics, SchemaReport, StepRecord, SuggestionRecord};
