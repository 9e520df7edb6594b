#![deny(unsafe_code)]

//! In-memory session registry.
//!
//! A session owns one dataset, its identity map and the log of applied
//! steps. The store maps [`SessionId`]s to sessions behind an `RwLock`'d
//! registry; each session sits behind its own mutex, which is held for the
//! whole read-modify-write of an apply. One apply is in flight per session
//! at a time, sessions never block each other, and a reader always observes
//! a fully committed version.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use polars::prelude::{CsvWriter, DataFrame, SerWriter};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use scrub_apply::ApplyOptions;
use scrub_common::{missing_fraction, unique_fraction};
use scrub_engine::{CorrelationConfig, CorrelationPreview, PipelineConfig, preview_correlation};
use scrub_model::{
    ColumnDescriptor, ColumnId, EncodingAction, IdentityMap, MissingAction, OutlierAction, Result,
    ScalingAction, SchemaReport, ScrubError, Stage, StagePlan, StepRecord, SuggestionRecord,
};

/// Opaque session handle, freshly minted per upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// One stage's suggestions, tagged for rendering and JSON export.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum StageSuggestions {
    /// Manual stage: the user picks columns, there is nothing to suggest.
    Prune,
    Missing {
        suggestions: BTreeMap<ColumnId, SuggestionRecord<MissingAction>>,
    },
    Outliers {
        suggestions: BTreeMap<ColumnId, SuggestionRecord<OutlierAction>>,
    },
    Correlation {
        preview: CorrelationPreview,
    },
    Encoding {
        suggestions: BTreeMap<ColumnId, SuggestionRecord<EncodingAction>>,
    },
    Scaling {
        suggestions: BTreeMap<ColumnId, SuggestionRecord<ScalingAction>>,
    },
}

impl StageSuggestions {
    /// An empty stage has nothing for the user to decide and can be
    /// auto-advanced.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Prune => true,
            Self::Missing { suggestions } => suggestions.is_empty(),
            Self::Outliers { suggestions } => suggestions.is_empty(),
            Self::Correlation { preview } => preview.drop.is_empty(),
            Self::Encoding { suggestions } => suggestions.is_empty(),
            Self::Scaling { suggestions } => suggestions.is_empty(),
        }
    }
}

/// One uploaded dataset and everything committed against it.
#[derive(Debug)]
struct Session {
    df: DataFrame,
    identity: IdentityMap,
    log: Vec<StepRecord>,
    version: u64,
}

impl Session {
    fn schema(&self) -> Result<SchemaReport> {
        let names = self.df.get_column_names_owned();
        let mut columns = Vec::with_capacity(names.len());
        for (id, entry) in self.identity.ordered_by(&names)? {
            let column = self.df.column(&entry.name)?;
            columns.push(ColumnDescriptor {
                id,
                name: entry.name.clone(),
                kind: entry.kind,
                unique_fraction: unique_fraction(column),
                missing_fraction: missing_fraction(column),
            });
        }
        Ok(SchemaReport {
            columns,
            rows: self.df.height(),
        })
    }

    /// Apply a validated plan and advance the committed version. The caller
    /// holds the session lock; any error leaves `self` untouched.
    fn commit(&mut self, plan: StagePlan, options: &ApplyOptions) -> Result<SchemaReport> {
        let stage = plan.stage();
        let applied = scrub_apply::apply_plan(&self.df, &self.identity, &plan, options)?;
        self.version += 1;
        self.log.push(StepRecord {
            version: self.version,
            stage,
            plan,
            rows_after: applied.df.height(),
            columns_after: applied.df.width(),
        });
        self.df = applied.df;
        self.identity = applied.map;
        self.schema()
    }
}

/// Registry of live sessions.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dataset and hand back its id and initial schema.
    pub fn create_session(&self, df: DataFrame) -> Result<(SessionId, SchemaReport)> {
        let identity = scrub_ingest::initial_identity(&df)?;
        let session = Session {
            df,
            identity,
            log: Vec::new(),
            version: 0,
        };
        let schema = session.schema()?;
        let id = SessionId::new();
        self.sessions
            .write()
            .insert(id, Arc::new(Mutex::new(session)));
        info!(session = %id, rows = schema.rows, columns = schema.column_count(), "session created");
        Ok((id, schema))
    }

    pub fn create_session_from_csv_bytes(&self, bytes: &[u8]) -> Result<(SessionId, SchemaReport)> {
        self.create_session(scrub_ingest::read_csv_bytes(bytes)?)
    }

    pub fn create_session_from_csv_path(&self, path: &Path) -> Result<(SessionId, SchemaReport)> {
        self.create_session(scrub_ingest::read_csv_path(path)?)
    }

    fn session(&self, id: SessionId) -> Result<Arc<Mutex<Session>>> {
        self.sessions
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| ScrubError::SessionNotFound(id.to_string()))
    }

    /// Ordered column descriptors and row count of the committed version.
    pub fn schema(&self, id: SessionId) -> Result<SchemaReport> {
        self.session(id)?.lock().schema()
    }

    /// Run the suggestion engine for one stage against the committed version.
    pub fn suggestions(
        &self,
        id: SessionId,
        stage: Stage,
        config: &PipelineConfig,
    ) -> Result<StageSuggestions> {
        let handle = self.session(id)?;
        let session = handle.lock();
        let out = match stage {
            Stage::Prune => StageSuggestions::Prune,
            Stage::Missing => StageSuggestions::Missing {
                suggestions: scrub_engine::suggest_missing(
                    &session.df,
                    &session.identity,
                    &config.missing,
                )?,
            },
            Stage::Outliers => StageSuggestions::Outliers {
                suggestions: scrub_engine::suggest_outliers(
                    &session.df,
                    &session.identity,
                    &config.outliers,
                )?,
            },
            Stage::Correlation => StageSuggestions::Correlation {
                preview: preview_correlation(&session.df, &session.identity, &config.correlation)?,
            },
            Stage::Encoding => StageSuggestions::Encoding {
                suggestions: scrub_engine::suggest_encoding(
                    &session.df,
                    &session.identity,
                    &config.encoding,
                )?,
            },
            Stage::Scaling => StageSuggestions::Scaling {
                suggestions: scrub_engine::suggest_scaling(
                    &session.df,
                    &session.identity,
                    &config.scaling,
                )?,
            },
        };
        Ok(out)
    }

    /// Correlation drop set for the committed version, no mutation.
    pub fn preview_correlation_drop(
        &self,
        id: SessionId,
        config: &CorrelationConfig,
    ) -> Result<CorrelationPreview> {
        let handle = self.session(id)?;
        let session = handle.lock();
        preview_correlation(&session.df, &session.identity, config)
    }

    /// Validate and apply a plan. On error the session keeps its previous
    /// committed version; on success the new schema is returned.
    pub fn apply_plan(
        &self,
        id: SessionId,
        plan: StagePlan,
        options: &ApplyOptions,
    ) -> Result<SchemaReport> {
        let handle = self.session(id)?;
        let mut session = handle.lock();
        let schema = session.commit(plan, options)?;
        info!(session = %id, version = session.version, "plan committed");
        Ok(schema)
    }

    /// Compute the correlation drop set and, when `auto_drop` is set and the
    /// set is non-empty, commit it in the same lock hold.
    pub fn apply_correlation_drop(
        &self,
        id: SessionId,
        config: &CorrelationConfig,
        auto_drop: bool,
    ) -> Result<SchemaReport> {
        let handle = self.session(id)?;
        let mut session = handle.lock();
        let preview = preview_correlation(&session.df, &session.identity, config)?;
        if !auto_drop || preview.drop.is_empty() {
            return session.schema();
        }
        let plan = StagePlan::Correlation {
            drop: preview.drop,
            threshold: config.threshold,
        };
        let schema = session.commit(plan, &ApplyOptions::default())?;
        info!(session = %id, version = session.version, "correlation drop committed");
        Ok(schema)
    }

    /// CSV bytes of the committed version.
    pub fn export_csv(&self, id: SessionId) -> Result<Vec<u8>> {
        let handle = self.session(id)?;
        let mut df = handle.lock().df.clone();
        let mut buf = Vec::new();
        CsvWriter::new(&mut buf)
            .include_header(true)
            .finish(&mut df)?;
        Ok(buf)
    }

    /// Every step committed against the session, in order.
    pub fn step_log(&self, id: SessionId) -> Result<Vec<StepRecord>> {
        Ok(self.session(id)?.lock().log.clone())
    }

    pub fn remove_session(&self, id: SessionId) -> Result<()> {
        self.sessions
            .write()
            .remove(&id)
            .map(|_| info!(session = %id, "session removed"))
            .ok_or_else(|| ScrubError::SessionNotFound(id.to_string()))
    }
}
