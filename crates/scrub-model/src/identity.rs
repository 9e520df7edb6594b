//! The column identity map.
//!
//! Maps stable [`ColumnId`]s to the column's current name and kind. The map
//! and the physical dataset are replaced together by every apply, and the
//! bijection between the two is an invariant: every physical column has
//! exactly one entry, and no entry points at an absent column.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScrubError};
use crate::ids::{ColumnId, ColumnKind};

/// Current state of one column lineage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnEntry {
    /// Current display name.
    pub name: String,
    /// Current broad type.
    pub kind: ColumnKind,
    /// The retired id this column was fanned out from, if any
    /// (one-hot output records its source column here).
    pub origin: Option<ColumnId>,
}

/// Stable-id registry for the columns of one session's dataset.
///
/// Ids are never reused: dropped columns are retired, and fan-out allocates
/// fresh ids from a monotonic counter. Allocation order is deterministic
/// within a single apply call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityMap {
    entries: BTreeMap<ColumnId, ColumnEntry>,
    next_id: u32,
}

impl IdentityMap {
    /// Build the initial map at upload time: each column gets its positional
    /// index (0-based) as its id.
    pub fn from_schema(columns: impl IntoIterator<Item = (String, ColumnKind)>) -> Self {
        let mut map = Self::default();
        for (idx, (name, kind)) in columns.into_iter().enumerate() {
            map.entries.insert(
                ColumnId::new(idx as u32),
                ColumnEntry {
                    name,
                    kind,
                    origin: None,
                },
            );
        }
        map.next_id = map.entries.len() as u32;
        map
    }

    /// Resolve an id to its entry. Retired or never-assigned ids fail with
    /// `ColumnNotFound`, never a stale name.
    pub fn resolve(&self, id: ColumnId) -> Result<&ColumnEntry> {
        self.entries.get(&id).ok_or(ScrubError::ColumnNotFound(id))
    }

    /// Look up the id currently mapped to a physical column name.
    pub fn id_of(&self, name: &str) -> Option<ColumnId> {
        self.entries
            .iter()
            .find(|(_, entry)| entry.name == name)
            .map(|(id, _)| *id)
    }

    /// Remove entries for dropped columns. Must be called in the same apply
    /// as the dataset mutation that drops them.
    pub fn retire(&mut self, ids: &[ColumnId]) {
        for id in ids {
            self.entries.remove(id);
        }
    }

    /// Allocate a fresh id for a new physical column.
    pub fn allocate(
        &mut self,
        name: impl Into<String>,
        kind: ColumnKind,
        origin: Option<ColumnId>,
    ) -> ColumnId {
        let id = ColumnId::new(self.next_id);
        self.next_id += 1;
        self.entries.insert(
            id,
            ColumnEntry {
                name: name.into(),
                kind,
                origin,
            },
        );
        id
    }

    /// Update the recorded kind of a live column (label encoding retypes a
    /// column without changing its lineage).
    pub fn set_kind(&mut self, id: ColumnId, kind: ColumnKind) -> Result<()> {
        let entry = self
            .entries
            .get_mut(&id)
            .ok_or(ScrubError::ColumnNotFound(id))?;
        entry.kind = kind;
        Ok(())
    }

    /// Iterate entries in id order.
    pub fn iter(&self) -> impl Iterator<Item = (ColumnId, &ColumnEntry)> {
        self.entries.iter().map(|(id, entry)| (*id, entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries ordered by the dataset's physical column order. Fails with
    /// `IdentityDesync` if a physical column has no entry, which means the
    /// bijection invariant is already broken.
    pub fn ordered_by<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<(ColumnId, &ColumnEntry)>> {
        let mut out = Vec::new();
        for name in names {
            let name = name.as_ref();
            let id = self
                .id_of(name)
                .ok_or_else(|| ScrubError::IdentityDesync(name.to_string()))?;
            out.push((id, &self.entries[&id]));
        }
        Ok(out)
    }

    /// True when the map is a strict bijection with the given physical schema.
    pub fn is_bijective_with<S: AsRef<str>>(&self, names: impl IntoIterator<Item = S>) -> bool {
        let mut seen = 0usize;
        for name in names {
            if self.id_of(name.as_ref()).is_none() {
                return false;
            }
            seen += 1;
        }
        seen == self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_map() -> IdentityMap {
        IdentityMap::from_schema(vec![
            ("age".to_string(), ColumnKind::Numeric),
            ("city".to_string(), ColumnKind::Categorical),
            ("income".to_string(), ColumnKind::Numeric),
        ])
    }

    #[test]
    fn initial_ids_are_positional() {
        let map = sample_map();
        assert_eq!(map.resolve(ColumnId::new(0)).unwrap().name, "age");
        assert_eq!(map.resolve(ColumnId::new(2)).unwrap().name, "income");
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn retired_id_resolves_to_not_found() {
        let mut map = sample_map();
        map.retire(&[ColumnId::new(1)]);
        assert!(matches!(
            map.resolve(ColumnId::new(1)),
            Err(ScrubError::ColumnNotFound(_))
        ));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn allocate_never_reuses_retired_ids() {
        let mut map = sample_map();
        map.retire(&[ColumnId::new(2)]);
        let id = map.allocate("city_London", ColumnKind::Numeric, Some(ColumnId::new(1)));
        assert_eq!(id, ColumnId::new(3));
        let next = map.allocate("city_Paris", ColumnKind::Numeric, Some(ColumnId::new(1)));
        assert_eq!(next, ColumnId::new(4));
    }

    #[test]
    fn fan_out_records_origin() {
        let mut map = sample_map();
        let id = map.allocate("city_London", ColumnKind::Numeric, Some(ColumnId::new(1)));
        map.retire(&[ColumnId::new(1)]);
        assert_eq!(map.resolve(id).unwrap().origin, Some(ColumnId::new(1)));
    }

    #[test]
    fn bijection_check_spots_drift() {
        let mut map = sample_map();
        assert!(map.is_bijective_with(["age", "city", "income"]));
        // Entry without a physical column.
        assert!(!map.is_bijective_with(["age", "city"]));
        // Physical column without an entry.
        map.retire(&[ColumnId::new(0)]);
        assert!(!map.is_bijective_with(["age", "city", "income"]));
    }
}
