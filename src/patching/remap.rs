//! Identifier renumbering plans.
//!
//! The [`Remapper`] computes where routines should move; it never mutates
//! anything. Its product, an [`IdentifierMap`], is a checked bijection from old
//! identifiers onto conflict-free destinations, consumed by at most one rewiring
//! pass.

use std::collections::BTreeSet;

use crate::{
    script::{
        ident::{ScopeClass, ScriptId},
        ScriptContainer,
    },
    Result,
};

/// A bijective old-identifier to new-identifier mapping.
///
/// Both key and value sets are kept duplicate-free on insertion, so any map that
/// exists is a valid bijection - and therefore safely invertible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifierMap {
    entries: std::collections::BTreeMap<ScriptId, ScriptId>,
    values: BTreeSet<ScriptId>,
}

impl IdentifierMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        IdentifierMap::default()
    }

    /// Adds one mapping.
    ///
    /// # Errors
    /// Returns [`crate::Error::RemapConflict`] if the key is already mapped or
    /// the destination is already assigned.
    pub fn insert(&mut self, from: ScriptId, to: ScriptId) -> Result<()> {
        if self.entries.contains_key(&from) {
            return Err(crate::Error::RemapConflict(format!(
                "{from} is already mapped"
            )));
        }
        if !self.values.insert(to) {
            return Err(crate::Error::RemapConflict(format!(
                "{to} is already assigned as a destination"
            )));
        }
        self.entries.insert(from, to);
        Ok(())
    }

    /// Returns the destination for `from`, if it is a key of this map.
    #[must_use]
    pub fn get(&self, from: ScriptId) -> Option<ScriptId> {
        self.entries.get(&from).copied()
    }

    /// Returns `true` if `from` is a key of this map.
    #[must_use]
    pub fn contains_key(&self, from: ScriptId) -> bool {
        self.entries.contains_key(&from)
    }

    /// Returns the number of mappings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the map holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(from, to)` pairs in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (ScriptId, ScriptId)> + '_ {
        self.entries.iter().map(|(from, to)| (*from, *to))
    }

    /// Returns the inverse map.
    ///
    /// Always valid because the map is a bijection by construction.
    #[must_use]
    pub fn invert(&self) -> IdentifierMap {
        let mut inverted = IdentifierMap::new();
        for (from, to) in self.iter() {
            // Cannot conflict: values are unique and keys are unique.
            let _ = inverted.insert(to, from);
        }
        inverted
    }
}

/// Computes renumbering plans: next free identifier at or above a start offset.
///
/// The destination space excludes the explicit avoid set, every identifier of a
/// routine *not* being remapped, and every destination already assigned in the
/// same pass. Selected routines may land on each other's vacated identifiers.
///
/// # Examples
///
/// ```rust
/// use scriptscope::patching::Remapper;
/// use scriptscope::script::{Routine, RoutineFormat, ScriptContainer, ident::ScriptId};
///
/// let mut container = ScriptContainer::new("objects.bin");
/// container.insert_routine(Routine::new(ScriptId::new(0x1000), RoutineFormat::Compact))?;
///
/// let map = Remapper::new(0x1050).remap(&container, &[ScriptId::new(0x1000)], None)?;
/// assert_eq!(map.get(ScriptId::new(0x1000)), Some(ScriptId::new(0x1050)));
/// # Ok::<(), scriptscope::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Remapper {
    start: u16,
    avoid: BTreeSet<ScriptId>,
}

impl Remapper {
    /// Creates a remapper assigning destinations at or above `start`.
    #[must_use]
    pub fn new(start: u16) -> Self {
        Remapper {
            start,
            avoid: BTreeSet::new(),
        }
    }

    /// Adds one identifier to the avoid set, builder style.
    #[must_use]
    pub fn avoid(mut self, id: ScriptId) -> Self {
        self.avoid.insert(id);
        self
    }

    /// Adds many identifiers to the avoid set, builder style.
    #[must_use]
    pub fn avoid_all(mut self, ids: impl IntoIterator<Item = ScriptId>) -> Self {
        self.avoid.extend(ids);
        self
    }

    /// Computes the renumbering plan for `selected` routines of `container`.
    ///
    /// With a `scope` filter, only selected identifiers classifying into that
    /// scope are remapped; the rest are left out of the plan (and their
    /// identifiers become forbidden destinations like any other unselected
    /// routine's).
    ///
    /// # Errors
    /// Returns [`crate::Error::RemapConflict`] if the identifier space above the
    /// start offset is exhausted.
    pub fn remap(
        &self,
        container: &ScriptContainer,
        selected: &[ScriptId],
        scope: Option<ScopeClass>,
    ) -> Result<IdentifierMap> {
        let selected: BTreeSet<ScriptId> = selected
            .iter()
            .copied()
            .filter(|id| scope.map_or(true, |scope| scope.contains(*id)))
            .collect();

        // Identifiers that stay put are forbidden destinations.
        let keep: BTreeSet<ScriptId> =
            container.ids().filter(|id| !selected.contains(id)).collect();

        let mut map = IdentifierMap::new();
        let mut cursor = u32::from(self.start);
        for from in selected {
            loop {
                if cursor > u32::from(u16::MAX) {
                    return Err(crate::Error::RemapConflict(format!(
                        "identifier space above 0x{:04X} exhausted",
                        self.start
                    )));
                }
                let candidate = ScriptId::new(cursor as u16);
                cursor += 1;
                if self.avoid.contains(&candidate) || keep.contains(&candidate) {
                    continue;
                }
                map.insert(from, candidate)?;
                break;
            }
        }

        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::{Routine, RoutineFormat};

    fn container_with(ids: &[u16]) -> ScriptContainer {
        let mut container = ScriptContainer::new("test.bin");
        for id in ids {
            container
                .insert_routine(Routine::new(ScriptId::new(*id), RoutineFormat::Compact))
                .unwrap();
        }
        container
    }

    fn ids(values: &[u16]) -> Vec<ScriptId> {
        values.iter().copied().map(ScriptId::new).collect()
    }

    #[test]
    fn test_map_rejects_duplicate_key_and_value() {
        let mut map = IdentifierMap::new();
        map.insert(ScriptId::new(1), ScriptId::new(10)).unwrap();
        assert!(map.insert(ScriptId::new(1), ScriptId::new(11)).is_err());
        assert!(map.insert(ScriptId::new(2), ScriptId::new(10)).is_err());
    }

    #[test]
    fn test_invert_roundtrip() {
        let mut map = IdentifierMap::new();
        map.insert(ScriptId::new(1), ScriptId::new(10)).unwrap();
        map.insert(ScriptId::new(2), ScriptId::new(20)).unwrap();

        let inverted = map.invert();
        assert_eq!(inverted.get(ScriptId::new(10)), Some(ScriptId::new(1)));
        assert_eq!(inverted.invert(), map);
    }

    #[test]
    fn test_remap_skips_avoid_and_kept_ids() {
        let container = container_with(&[0x1000, 0x1001, 0x1002]);

        // Remap only 0x1000; 0x1001/0x1002 stay and block their slots.
        let map = Remapper::new(0x1001)
            .avoid(ScriptId::new(0x1003))
            .remap(&container, &ids(&[0x1000]), None)
            .unwrap();

        assert_eq!(map.len(), 1);
        assert_eq!(map.get(ScriptId::new(0x1000)), Some(ScriptId::new(0x1004)));
    }

    #[test]
    fn test_remap_is_bijection_onto_unused() {
        let container = container_with(&[0x1000, 0x1001, 0x1002, 0x1050]);
        let selected = ids(&[0x1000, 0x1001, 0x1002]);
        let avoid = [ScriptId::new(0x1051)];

        let map = Remapper::new(0x1050)
            .avoid_all(avoid)
            .remap(&container, &selected, None)
            .unwrap();

        assert_eq!(map.len(), 3);
        let values: BTreeSet<ScriptId> = map.iter().map(|(_, to)| to).collect();
        assert_eq!(values.len(), 3, "destinations must be distinct");
        for value in &values {
            assert!(!avoid.contains(value));
            assert_ne!(*value, ScriptId::new(0x1050), "kept routine blocks its id");
        }
        // 0x1050 occupied, 0x1051 avoided -> 0x1052, 0x1053, 0x1054.
        assert_eq!(map.get(ScriptId::new(0x1000)), Some(ScriptId::new(0x1052)));
        assert_eq!(map.get(ScriptId::new(0x1002)), Some(ScriptId::new(0x1054)));
    }

    #[test]
    fn test_remap_scope_filter() {
        let container = container_with(&[0x0010, 0x0100, 0x1000]);
        let selected = ids(&[0x0010, 0x0100, 0x1000]);

        let map = Remapper::new(0x1100)
            .remap(&container, &selected, Some(ScopeClass::ObjectLocal))
            .unwrap();

        assert_eq!(map.len(), 1);
        assert!(map.contains_key(ScriptId::new(0x1000)));
        assert!(!map.contains_key(ScriptId::new(0x0010)));
    }

    #[test]
    fn test_remap_space_exhaustion() {
        let container = container_with(&[0x1000]);
        let result = Remapper::new(0xFFFF)
            .avoid(ScriptId::new(0xFFFF))
            .remap(&container, &ids(&[0x1000]), None);
        assert!(matches!(result, Err(crate::Error::RemapConflict(_))));
    }

    #[test]
    fn test_selected_ids_may_reuse_each_others_slots() {
        let container = container_with(&[0x1000, 0x1001]);
        // Both selected: 0x1001's current id is a legal destination.
        let map = Remapper::new(0x1001)
            .remap(&container, &ids(&[0x1000, 0x1001]), None)
            .unwrap();
        assert_eq!(map.get(ScriptId::new(0x1000)), Some(ScriptId::new(0x1001)));
        assert_eq!(map.get(ScriptId::new(0x1001)), Some(ScriptId::new(0x1002)));
    }
}
