//! The in-memory exchange type between the external container reader and the core.
//!
//! A [`ScriptContainer`] holds the decoded routines of one binary container file,
//! keyed by identifier. The external reader populates it (framing, chunk formats and
//! checksums are its business, not this crate's); everything downstream - analysis,
//! call-site discovery, remapping - consumes it read-only. Mutation of container-held
//! routines happens exclusively through the mutation pipeline, which is why every
//! mutable accessor here is crate-internal.

use std::collections::BTreeMap;

use crate::{
    script::{
        ident::{ScopeClass, ScriptId},
        Routine,
    },
    Result,
};

/// All decoded routines of one container file, keyed by identifier.
///
/// # Examples
///
/// ```rust
/// use scriptscope::script::{Routine, RoutineFormat, ScriptContainer, ident::ScriptId};
///
/// let mut container = ScriptContainer::new("objects.bin");
/// container.insert_routine(Routine::new(ScriptId::new(0x1000), RoutineFormat::Compact))?;
/// assert!(container.contains(ScriptId::new(0x1000)));
/// # Ok::<(), scriptscope::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScriptContainer {
    name: String,
    routines: BTreeMap<ScriptId, Routine>,
}

impl ScriptContainer {
    /// Creates an empty container with the given file name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        ScriptContainer {
            name: name.into(),
            routines: BTreeMap::new(),
        }
    }

    /// Returns the container's file name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inserts a routine under its own identifier.
    ///
    /// Population API for the external container reader. Identifier collisions are
    /// never resolved implicitly.
    ///
    /// # Errors
    /// Returns [`crate::Error::DuplicateRoutine`] if the identifier is already taken.
    pub fn insert_routine(&mut self, routine: Routine) -> Result<()> {
        let id = routine.id();
        if self.routines.contains_key(&id) {
            return Err(crate::Error::DuplicateRoutine(id));
        }
        self.routines.insert(id, routine);
        Ok(())
    }

    /// Returns the routine with the given identifier, if present.
    #[must_use]
    pub fn routine(&self, id: ScriptId) -> Option<&Routine> {
        self.routines.get(&id)
    }

    /// Returns `true` if a routine with the given identifier is present.
    #[must_use]
    pub fn contains(&self, id: ScriptId) -> bool {
        self.routines.contains_key(&id)
    }

    /// Returns the number of routines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routines.len()
    }

    /// Returns `true` if the container holds no routines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routines.is_empty()
    }

    /// Iterates over all routine identifiers in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = ScriptId> + '_ {
        self.routines.keys().copied()
    }

    /// Iterates over all routines in ascending identifier order.
    pub fn routines(&self) -> impl Iterator<Item = &Routine> {
        self.routines.values()
    }

    /// Returns the identifiers of all routines classified into `scope`.
    #[must_use]
    pub fn ids_in_scope(&self, scope: ScopeClass) -> Vec<ScriptId> {
        self.ids().filter(|id| scope.contains(*id)).collect()
    }

    pub(crate) fn routine_mut(&mut self, id: ScriptId) -> Option<&mut Routine> {
        self.routines.get_mut(&id)
    }

    pub(crate) fn remove_routine(&mut self, id: ScriptId) -> Option<Routine> {
        self.routines.remove(&id)
    }

    /// Moves a routine to a new identifier, updating both the map key and the
    /// routine's own id field.
    pub(crate) fn rename_routine(&mut self, from: ScriptId, to: ScriptId) -> Result<()> {
        if self.routines.contains_key(&to) {
            return Err(crate::Error::DuplicateRoutine(to));
        }
        let Some(mut routine) = self.routines.remove(&from) else {
            return Err(crate::Error::RoutineNotFound(from));
        };
        routine.set_id(to);
        self.routines.insert(to, routine);
        Ok(())
    }
}
