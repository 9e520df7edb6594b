//! User-approved action plans.
//!
//! A plan is an ordered list of `(action, column ids)` buckets for one stage.
//! Bucket order matters: when a column id appears in more than one bucket,
//! the **last** bucket containing it wins. Clients are expected to enforce
//! this themselves, but the applier re-validates server-side.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::actions::{
    EncodingAction, MissingAction, OutlierAction, ScalingAction, StageAction,
};
use crate::error::{Result, ScrubError};
use crate::ids::ColumnId;

/// One action bucket of a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntry<A> {
    pub action: A,
    pub columns: Vec<ColumnId>,
}

/// An ordered set of action buckets for one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Plan<A> {
    entries: Vec<PlanEntry<A>>,
}

impl<A> Default for Plan<A> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<A: StageAction> Plan<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a bucket. Later buckets shadow earlier ones on conflict.
    pub fn push(mut self, action: A, columns: Vec<ColumnId>) -> Self {
        self.entries.push(PlanEntry { action, columns });
        self
    }

    /// Decode a string-keyed plan from a collaborator (`action token -> ids`).
    ///
    /// Pair order is preserved so the last-bucket-wins rule applies to the
    /// collaborator's declaration order. An out-of-vocabulary token fails with
    /// `UnknownAction`.
    pub fn from_tokens<S: AsRef<str>>(pairs: Vec<(S, Vec<ColumnId>)>) -> Result<Self> {
        let mut entries = Vec::with_capacity(pairs.len());
        for (token, columns) in pairs {
            let token = token.as_ref();
            let action = A::parse_token(token).ok_or_else(|| ScrubError::UnknownAction {
                stage: A::STAGE,
                token: token.to_string(),
            })?;
            entries.push(PlanEntry {
                action,
                columns,
            });
        }
        Ok(Self { entries })
    }

    /// Build a plan from per-column assignments, one bucket per action.
    /// Useful when accepting a suggestion map wholesale.
    pub fn from_assignments(pairs: impl IntoIterator<Item = (ColumnId, A)>) -> Self {
        let mut entries: Vec<PlanEntry<A>> = Vec::new();
        for (id, action) in pairs {
            match entries.iter_mut().find(|e| e.action == action) {
                Some(entry) => entry.columns.push(id),
                None => {
                    entries.push(PlanEntry {
                        action,
                        columns: vec![id],
                    });
                }
            }
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[PlanEntry<A>] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|e| e.columns.is_empty())
    }

    /// Every column id the plan references, deduplicated.
    pub fn column_ids(&self) -> Vec<ColumnId> {
        let mut ids: Vec<ColumnId> = self
            .entries
            .iter()
            .flat_map(|e| e.columns.iter().copied())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Final per-column assignment after last-bucket-wins deduplication.
    pub fn assignments(&self) -> BTreeMap<ColumnId, A> {
        let mut out = BTreeMap::new();
        for entry in &self.entries {
            for id in &entry.columns {
                out.insert(*id, entry.action);
            }
        }
        out
    }
}

/// A plan tagged with its pipeline stage, as stored in the step log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum StagePlan {
    /// Manual column pruning: a bare drop list.
    Prune { drop: Vec<ColumnId> },
    Missing { plan: Plan<MissingAction> },
    Outliers { plan: Plan<OutlierAction> },
    /// Correlation pruning: the accepted drop set and the threshold it was
    /// computed under.
    Correlation { drop: Vec<ColumnId>, threshold: f64 },
    Encoding { plan: Plan<EncodingAction> },
    Scaling { plan: Plan<ScalingAction> },
}

impl StagePlan {
    pub fn stage(&self) -> crate::actions::Stage {
        match self {
            Self::Prune { .. } => crate::actions::Stage::Prune,
            Self::Missing { .. } => crate::actions::Stage::Missing,
            Self::Outliers { .. } => crate::actions::Stage::Outliers,
            Self::Correlation { .. } => crate::actions::Stage::Correlation,
            Self::Encoding { .. } => crate::actions::Stage::Encoding,
            Self::Scaling { .. } => crate::actions::Stage::Scaling,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn last_bucket_wins_on_duplicate_ids() {
        let plan = Plan::new()
            .push(MissingAction::Mean, vec![ColumnId::new(1), ColumnId::new(2)])
            .push(MissingAction::DropCol, vec![ColumnId::new(2)]);
        let assignments = plan.assignments();
        assert_eq!(assignments[&ColumnId::new(1)], MissingAction::Mean);
        assert_eq!(assignments[&ColumnId::new(2)], MissingAction::DropCol);
    }

    #[test]
    fn from_tokens_rejects_unknown_action() {
        let err = Plan::<OutlierAction>::from_tokens(vec![("winsorize", vec![ColumnId::new(0)])])
            .unwrap_err();
        assert!(matches!(err, ScrubError::UnknownAction { .. }));
    }

    #[test]
    fn from_tokens_preserves_declaration_order() {
        let plan = Plan::<ScalingAction>::from_tokens(vec![
            ("standard", vec![ColumnId::new(0)]),
            ("minmax", vec![ColumnId::new(0)]),
        ])
        .unwrap();
        assert_eq!(
            plan.assignments()[&ColumnId::new(0)],
            ScalingAction::MinMax
        );
    }

    #[test]
    fn stage_plan_serializes_with_stage_tag() {
        let plan = StagePlan::Prune {
            drop: vec![ColumnId::new(3)],
        };
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["stage"], "prune");
        assert_eq!(json["drop"][0], 3);
    }

    proptest! {
        /// Every referenced id ends up assigned, and every assignment comes
        /// from the last bucket that mentioned the id.
        #[test]
        fn dedup_is_total_and_last_wins(
            buckets in prop::collection::vec(
                (0usize..5, prop::collection::vec(0u32..20, 0..8)),
                0..6,
            )
        ) {
            let actions = [
                MissingAction::Mean,
                MissingAction::Median,
                MissingAction::Mode,
                MissingAction::DropRow,
                MissingAction::DropCol,
            ];
            let mut plan = Plan::new();
            for (action_idx, ids) in &buckets {
                plan = plan.push(
                    actions[*action_idx],
                    ids.iter().copied().map(ColumnId::new).collect(),
                );
            }
            let assignments = plan.assignments();

            // Totality over referenced ids.
            prop_assert_eq!(
                assignments.keys().copied().collect::<Vec<_>>(),
                plan.column_ids()
            );

            // Last bucket wins.
            for (id, action) in &assignments {
                let last = buckets
                    .iter()
                    .rev()
                    .find(|(_, ids)| ids.contains(&id.as_u32()))
                    .map(|(action_idx, _)| actions[*action_idx]);
                prop_assert_eq!(Some(*action), last);
            }
        }
    }
}
