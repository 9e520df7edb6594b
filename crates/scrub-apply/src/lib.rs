#![deny(unsafe_code)]

//! Atomic plan application.
//!
//! [`apply_plan`] takes the current dataset and identity map, validates a
//! stage plan against them, and produces a fully transformed copy. Nothing is
//! mutated in place: on any error the caller still holds the last committed
//! `(dataset, map)` pair, so a failed apply never leaves a half-transformed
//! session behind.
//!
//! Within one plan the per-action order is fixed so results do not depend on
//! bucket declaration order: row-level removals run first (against fence or
//! null checks on the incoming data), cell rewrites second, column drops and
//! fan-outs last.

mod ops;

use polars::prelude::{Column, DataFrame};
use tracing::{debug, warn};

use scrub_common::{
    Fences, distinct_non_null, fences, mean, non_null_numeric, numeric_values, population_std,
    quantile, rendered_values,
};
use scrub_model::{
    ColumnId, ColumnKind, EncodingAction, IdentityMap, MissingAction, OutlierAction, Plan, Result,
    ScalingAction, ScrubError, Stage, StagePlan,
};

/// Knobs the applier shares with the suggestion engines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApplyOptions {
    /// IQR fence multiplier used when executing outlier plans.
    pub iqr_multiplier: f64,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            iqr_multiplier: 1.5,
        }
    }
}

/// Result of one successful apply: the replacement dataset and map, plus the
/// id churn for the step log.
#[derive(Debug, Clone)]
pub struct Applied {
    pub df: DataFrame,
    pub map: IdentityMap,
    /// Ids retired by this step (dropped or fanned-out columns).
    pub dropped: Vec<ColumnId>,
    /// Ids allocated by this step (one-hot outputs).
    pub added: Vec<ColumnId>,
}

/// Validate and execute a stage plan against a dataset snapshot.
///
/// Every column id the plan references must resolve in `map`, otherwise the
/// call fails with [`ScrubError::ColumnNotFound`] before any work is done.
/// Ids listed under more than one action keep only the last assignment.
pub fn apply_plan(
    df: &DataFrame,
    map: &IdentityMap,
    plan: &StagePlan,
    options: &ApplyOptions,
) -> Result<Applied> {
    match plan {
        StagePlan::Prune { drop } => apply_drop(df, map, drop, Stage::Prune),
        StagePlan::Correlation { drop, .. } => apply_drop(df, map, drop, Stage::Correlation),
        StagePlan::Missing { plan } => apply_missing(df, map, plan),
        StagePlan::Outliers { plan } => apply_outliers(df, map, plan, options),
        StagePlan::Encoding { plan } => apply_encoding(df, map, plan),
        StagePlan::Scaling { plan } => apply_scaling(df, map, plan),
    }
}

/// Drop a set of columns wholesale (manual pruning and correlation pruning).
fn apply_drop(
    df: &DataFrame,
    map: &IdentityMap,
    drop: &[ColumnId],
    stage: Stage,
) -> Result<Applied> {
    let mut ids = drop.to_vec();
    ids.sort_unstable();
    ids.dedup();

    let mut names = Vec::with_capacity(ids.len());
    for id in &ids {
        names.push(map.resolve(*id)?.name.clone());
    }

    let mut working = df.clone();
    for name in &names {
        working = working.drop(name)?;
    }
    let mut new_map = map.clone();
    new_map.retire(&ids);
    finish(stage, working, new_map, ids, Vec::new())
}

fn apply_missing(df: &DataFrame, map: &IdentityMap, plan: &Plan<MissingAction>) -> Result<Applied> {
    let mut targets = Vec::new();
    for (id, action) in plan.assignments() {
        let entry = map.resolve(id)?;
        targets.push((id, entry.name.clone(), entry.kind, action));
    }

    let mut working = df.clone();
    let mut new_map = map.clone();
    let mut dropped = Vec::new();

    // Row drops first, so fill statistics are computed over the rows that
    // actually survive the step.
    let row_cols: Vec<&str> = targets
        .iter()
        .filter(|(_, _, _, action)| *action == MissingAction::DropRow)
        .map(|(_, name, _, _)| name.as_str())
        .collect();
    if !row_cols.is_empty() {
        working = ops::drop_rows_with_nulls(&working, &row_cols)?;
    }

    for (id, name, kind, action) in &targets {
        match action {
            MissingAction::Mean | MissingAction::Median => {
                let values = {
                    let column = working.column(name)?;
                    ops::numeric_view(column, *kind)
                };
                let Some(values) = values else {
                    warn!(column = %name, "column is not numeric and does not cast, fill skipped");
                    continue;
                };
                let complete: Vec<f64> = values.iter().flatten().copied().collect();
                let fill = if *action == MissingAction::Mean {
                    mean(&complete)
                } else {
                    quantile(&complete, 0.5)
                };
                let Some(fill) = fill else {
                    warn!(column = %name, "no observed values to fill from, fill skipped");
                    continue;
                };
                let filled: Vec<f64> = values.iter().map(|v| v.unwrap_or(fill)).collect();
                working.with_column(Column::new(name.as_str().into(), filled))?;
                if !kind.is_numeric() {
                    new_map.set_kind(*id, ColumnKind::Numeric)?;
                }
            }
            MissingAction::Mode => {
                let (mode, rendered) = {
                    let column = working.column(name)?;
                    (ops::mode_value(column), rendered_values(column))
                };
                let Some(mode) = mode else {
                    warn!(column = %name, "no observed values to fill from, fill skipped");
                    continue;
                };
                if kind.is_numeric() {
                    let Ok(fill) = mode.parse::<f64>() else {
                        warn!(column = %name, "mode of numeric column did not render numerically");
                        continue;
                    };
                    let values = {
                        let column = working.column(name)?;
                        numeric_values(column)
                    };
                    let filled: Vec<f64> = values.iter().map(|v| v.unwrap_or(fill)).collect();
                    working.with_column(Column::new(name.as_str().into(), filled))?;
                } else {
                    let filled: Vec<String> = rendered
                        .into_iter()
                        .map(|v| v.unwrap_or_else(|| mode.clone()))
                        .collect();
                    working.with_column(Column::new(name.as_str().into(), filled))?;
                }
            }
            MissingAction::DropRow => {}
            MissingAction::DropCol => {
                working = working.drop(name)?;
                new_map.retire(&[*id]);
                dropped.push(*id);
            }
        }
    }

    finish(Stage::Missing, working, new_map, dropped, Vec::new())
}

fn apply_outliers(
    df: &DataFrame,
    map: &IdentityMap,
    plan: &Plan<OutlierAction>,
    options: &ApplyOptions,
) -> Result<Applied> {
    // Fences come from the incoming dataset, before any row is removed, so
    // every bucket in the plan sees the same boundaries.
    let mut targets: Vec<(String, OutlierAction, Fences)> = Vec::new();
    for (id, action) in plan.assignments() {
        let entry = map.resolve(id)?;
        if action == OutlierAction::Skip {
            continue;
        }
        if !entry.kind.is_numeric() {
            warn!(column = %entry.name, "outlier action on a non-numeric column, skipped");
            continue;
        }
        let values = non_null_numeric(df.column(&entry.name)?);
        let Some(fences) = fences(&values, options.iqr_multiplier) else {
            continue;
        };
        targets.push((entry.name.clone(), action, fences));
    }

    let mut working = df.clone();

    // One combined pass for row removal: a row survives only if it is inside
    // the fences (or null) in every remove_row column.
    let removals: Vec<&(String, OutlierAction, Fences)> = targets
        .iter()
        .filter(|(_, action, _)| *action == OutlierAction::RemoveRow)
        .collect();
    if !removals.is_empty() {
        let mut keep = vec![true; working.height()];
        for (name, _, fences) in removals {
            let values = numeric_values(working.column(name)?);
            for (slot, value) in keep.iter_mut().zip(&values) {
                if let Some(v) = value
                    && !fences.contains(*v)
                {
                    *slot = false;
                }
            }
        }
        working = ops::keep_rows(&working, &keep)?;
    }

    for (name, action, fences) in &targets {
        if *action != OutlierAction::Cap {
            continue;
        }
        let values = numeric_values(working.column(name)?);
        let capped: Vec<Option<f64>> = values
            .into_iter()
            .map(|v| v.map(|v| fences.clamp(v)))
            .collect();
        working.with_column(Column::new(name.as_str().into(), capped))?;
    }

    finish(Stage::Outliers, working, map.clone(), Vec::new(), Vec::new())
}

fn apply_encoding(
    df: &DataFrame,
    map: &IdentityMap,
    plan: &Plan<EncodingAction>,
) -> Result<Applied> {
    let mut targets = Vec::new();
    for (id, action) in plan.assignments() {
        let entry = map.resolve(id)?;
        targets.push((id, entry.name.clone(), action));
    }

    let mut working = df.clone();
    let mut new_map = map.clone();
    let mut dropped = Vec::new();
    let mut added = Vec::new();
    let mut live_names: Vec<String> = working
        .get_column_names()
        .into_iter()
        .map(|n| n.to_string())
        .collect();

    for (id, name, action) in &targets {
        match action {
            EncodingAction::Label => {
                let codes: Vec<Option<i64>> = {
                    let column = working.column(name)?;
                    let ordered = distinct_non_null(column);
                    rendered_values(column)
                        .into_iter()
                        .map(|v| {
                            v.and_then(|v| ordered.iter().position(|d| *d == v))
                                .map(|code| code as i64)
                        })
                        .collect()
                };
                working.with_column(Column::new(name.as_str().into(), codes))?;
                new_map.set_kind(*id, ColumnKind::Numeric)?;
            }
            EncodingAction::OneHot => {
                let (ordered, rendered) = {
                    let column = working.column(name)?;
                    (distinct_non_null(column), rendered_values(column))
                };
                // First category is the all-zeros baseline and gets no
                // dummy column.
                for value in ordered.iter().skip(1) {
                    let mut dummy = format!("{name}_{value}");
                    while live_names.iter().any(|n| n == &dummy) {
                        dummy.push('_');
                    }
                    let flags: Vec<i64> = rendered
                        .iter()
                        .map(|v| i64::from(v.as_deref() == Some(value)))
                        .collect();
                    working.with_column(Column::new(dummy.as_str().into(), flags))?;
                    let new_id = new_map.allocate(&dummy, ColumnKind::Numeric, Some(*id));
                    added.push(new_id);
                    live_names.push(dummy);
                }
                working = working.drop(name)?;
                live_names.retain(|n| n != name);
                new_map.retire(&[*id]);
                dropped.push(*id);
            }
            EncodingAction::Skip => {}
        }
    }

    finish(Stage::Encoding, working, new_map, dropped, added)
}

fn apply_scaling(df: &DataFrame, map: &IdentityMap, plan: &Plan<ScalingAction>) -> Result<Applied> {
    let mut targets = Vec::new();
    for (id, action) in plan.assignments() {
        let entry = map.resolve(id)?;
        targets.push((entry.name.clone(), entry.kind, action));
    }

    let mut working = df.clone();
    for (name, kind, action) in &targets {
        if *action == ScalingAction::Skip {
            continue;
        }
        let values = {
            let column = working.column(name)?;
            ops::numeric_view(column, *kind)
        };
        let Some(values) = values else {
            warn!(column = %name, "scaling a non-numeric column, skipped");
            continue;
        };
        let complete: Vec<f64> = values.iter().flatten().copied().collect();
        if complete.is_empty() {
            continue;
        }
        // Zero-spread columns collapse to 0.0 instead of dividing by zero.
        let scaled: Vec<Option<f64>> = match action {
            ScalingAction::Standard => {
                let m = mean(&complete).unwrap_or_default();
                let s = population_std(&complete).unwrap_or_default();
                values
                    .iter()
                    .map(|v| v.map(|v| if s > 0.0 { (v - m) / s } else { 0.0 }))
                    .collect()
            }
            ScalingAction::MinMax => {
                let lo = complete.iter().copied().fold(f64::INFINITY, f64::min);
                let hi = complete.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let range = hi - lo;
                values
                    .iter()
                    .map(|v| v.map(|v| if range > 0.0 { (v - lo) / range } else { 0.0 }))
                    .collect()
            }
            ScalingAction::Skip => unreachable!(),
        };
        working.with_column(Column::new(name.as_str().into(), scaled))?;
    }

    finish(Stage::Scaling, working, map.clone(), Vec::new(), Vec::new())
}

/// Seal an apply: check the map/dataset bijection and log the outcome.
fn finish(
    stage: Stage,
    df: DataFrame,
    map: IdentityMap,
    dropped: Vec<ColumnId>,
    added: Vec<ColumnId>,
) -> Result<Applied> {
    let names = df.get_column_names_owned();
    if !map.is_bijective_with(names.iter().map(|n| n.as_str())) {
        let orphan = names
            .iter()
            .map(|n| n.as_str())
            .find(|n| map.id_of(n).is_none())
            .unwrap_or("<retired entry still mapped>");
        return Err(ScrubError::IdentityDesync(orphan.to_string()));
    }
    debug!(
        stage = stage.name(),
        rows = df.height(),
        columns = df.width(),
        dropped = dropped.len(),
        added = added.len(),
        "plan applied"
    );
    Ok(Applied {
        df,
        map,
        dropped,
        added,
    })
}
