//! Correlation-based redundancy pruning.
//!
//! Builds a redundancy graph over the numeric columns (an edge where the
//! absolute pairwise correlation strictly exceeds the threshold) and greedily
//! selects a drop set: repeatedly remove the highest-degree column until no
//! edges remain. Exact minimum vertex cover is NP-hard; this greedy
//! approximation is an accepted trade-off, not a bug.

use std::collections::{BTreeMap, BTreeSet};

use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use tracing::debug;

use scrub_common::{numeric_values, pearson, spearman};
use scrub_model::{ColumnId, IdentityMap, Result, ScrubError};

/// Correlation estimator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrMethod {
    /// Linear (Pearson) correlation.
    #[default]
    Pearson,
    /// Rank-based (Spearman) correlation.
    Spearman,
}

impl CorrMethod {
    pub fn name(self) -> &'static str {
        match self {
            Self::Pearson => "pearson",
            Self::Spearman => "spearman",
        }
    }
}

/// Threshold and estimator for redundancy detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Pairs with |r| strictly above this are redundant. Must lie in (0, 1].
    pub threshold: f64,
    pub method: CorrMethod,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            threshold: 0.90,
            method: CorrMethod::Pearson,
        }
    }
}

/// One redundant pair, reported for explainability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelatedPair {
    pub left: ColumnId,
    pub right: ColumnId,
    pub correlation: f64,
}

/// The computed drop set and the pairs that forced it. Produced without
/// mutating the dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationPreview {
    /// Columns to drop, in greedy selection order (most redundant first).
    pub drop: Vec<ColumnId>,
    /// Redundant pairs above the threshold.
    pub pairs: Vec<CorrelatedPair>,
}

/// Compute the redundancy drop set for the current dataset.
///
/// Fewer than two numeric columns yields an empty preview. A threshold
/// outside (0, 1] is a configuration error.
pub fn preview_correlation(
    df: &DataFrame,
    map: &IdentityMap,
    config: &CorrelationConfig,
) -> Result<CorrelationPreview> {
    if !config.threshold.is_finite() || config.threshold <= 0.0 || config.threshold > 1.0 {
        return Err(ScrubError::InvalidThreshold(config.threshold));
    }

    // Numeric columns with their per-row values, in id order.
    let mut columns: Vec<(ColumnId, Vec<Option<f64>>)> = Vec::new();
    for (id, entry) in map.iter() {
        if entry.kind.is_numeric() {
            columns.push((id, numeric_values(df.column(&entry.name)?)));
        }
    }
    if columns.len() < 2 {
        return Ok(CorrelationPreview::default());
    }

    // Pairwise |r| over pairwise-complete observations.
    let mut correlations: BTreeMap<(ColumnId, ColumnId), f64> = BTreeMap::new();
    let mut pairs = Vec::new();
    for i in 0..columns.len() {
        for j in (i + 1)..columns.len() {
            let (left, xs) = &columns[i];
            let (right, ys) = &columns[j];
            let Some(r) = pairwise_correlation(xs, ys, config.method) else {
                continue;
            };
            correlations.insert((*left, *right), r.abs());
            if r.abs() > config.threshold {
                pairs.push(CorrelatedPair {
                    left: *left,
                    right: *right,
                    correlation: r,
                });
            }
        }
    }

    // Redundancy graph.
    let mut adjacency: BTreeMap<ColumnId, BTreeSet<ColumnId>> = BTreeMap::new();
    for pair in &pairs {
        adjacency.entry(pair.left).or_default().insert(pair.right);
        adjacency.entry(pair.right).or_default().insert(pair.left);
    }

    // Mean |r| of each column against every other numeric column; the
    // tie-break keeps the column that carries more distinct information.
    let mean_abs: BTreeMap<ColumnId, f64> = columns
        .iter()
        .map(|(id, _)| {
            let rs: Vec<f64> = correlations
                .iter()
                .filter(|((a, b), _)| a == id || b == id)
                .map(|(_, r)| *r)
                .collect();
            let mean = if rs.is_empty() {
                0.0
            } else {
                rs.iter().sum::<f64>() / rs.len() as f64
            };
            (*id, mean)
        })
        .collect();

    let mut drop = Vec::new();
    while let Some(victim) = pick_victim(&adjacency, &mean_abs) {
        debug!(column = %victim, degree = adjacency[&victim].len(), "dropping redundant column");
        if let Some(neighbors) = adjacency.remove(&victim) {
            for neighbor in neighbors {
                if let Some(set) = adjacency.get_mut(&neighbor) {
                    set.remove(&victim);
                    if set.is_empty() {
                        adjacency.remove(&neighbor);
                    }
                }
            }
        }
        drop.push(victim);
    }

    Ok(CorrelationPreview { drop, pairs })
}

/// Highest-degree node; ties broken by the lower mean |r| to the rest of the
/// dataset, then by the higher id (later columns are dropped first).
fn pick_victim(
    adjacency: &BTreeMap<ColumnId, BTreeSet<ColumnId>>,
    mean_abs: &BTreeMap<ColumnId, f64>,
) -> Option<ColumnId> {
    adjacency
        .iter()
        .filter(|(_, neighbors)| !neighbors.is_empty())
        .max_by(|(a, a_neighbors), (b, b_neighbors)| {
            a_neighbors
                .len()
                .cmp(&b_neighbors.len())
                .then_with(|| {
                    // Lower mean |r| should win the tie, so compare reversed.
                    mean_abs[b]
                        .partial_cmp(&mean_abs[a])
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .then_with(|| a.cmp(b))
        })
        .map(|(id, _)| *id)
}

fn pairwise_correlation(xs: &[Option<f64>], ys: &[Option<f64>], method: CorrMethod) -> Option<f64> {
    let mut complete_x = Vec::new();
    let mut complete_y = Vec::new();
    for (x, y) in xs.iter().zip(ys) {
        if let (Some(x), Some(y)) = (x, y) {
            complete_x.push(*x);
            complete_y.push(*y);
        }
    }
    match method {
        CorrMethod::Pearson => pearson(&complete_x, &complete_y),
        CorrMethod::Spearman => spearman(&complete_x, &complete_y),
    }
}
