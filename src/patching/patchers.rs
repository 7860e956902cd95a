//! Scope-validating patchers over the renumbering and rewiring machinery.
//!
//! A patcher is a thin policy wrapper: it checks that every key of the supplied
//! identifier map actually classifies into the scope it claims to manage, and only
//! then delegates - first rewiring every call site, then renumbering the routines
//! themselves. A single out-of-scope identifier rejects the whole map before any
//! byte is touched.
//!
//! The global patcher additionally supports override injection: cloning a shared
//! global routine into a fresh object-local identifier and rewiring the object's
//! own call sites to the clone, shadowing the shared logic without touching it.

use crate::{
    patching::{CallRewirer, IdentifierMap, RewireReport},
    pipeline::{
        Diff, FieldEdit, MutationKind, MutationPipeline, MutationRequest, ProposalOutcome,
        RequestTarget,
    },
    script::{
        ident::{ScopeClass, ScriptId},
        Routine, ScriptContainer,
    },
    Result,
};

/// One routine renumbering and the pipeline's verdict on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenumberOutcome {
    /// The routine's old identifier.
    pub from: ScriptId,
    /// The identifier it was moved to.
    pub to: ScriptId,
    /// What the pipeline did with the proposal.
    pub outcome: ProposalOutcome,
}

/// The combined result of one scope patch: call-site rewiring plus renumbering.
#[derive(Debug, Clone, Default)]
pub struct PatchReport {
    /// Per-site rewiring results.
    pub rewire: RewireReport,
    /// Per-routine renumbering results.
    pub renumbered: Vec<RenumberOutcome>,
    /// Map keys claiming routines the container does not hold.
    pub missing: Vec<ScriptId>,
}

/// The result of injecting an object-local override of a global routine.
#[derive(Debug, Clone)]
pub struct OverrideReport {
    /// The pipeline's verdict on inserting the clone.
    pub insert: ProposalOutcome,
    /// Rewiring results for the object's own call sites.
    pub rewire: RewireReport,
}

fn verify_scope(map: &IdentifierMap, expected: ScopeClass) -> Result<()> {
    for (from, _) in map.iter() {
        let actual = from.scope();
        if actual != expected {
            return Err(crate::Error::ScopeMismatch {
                id: from,
                actual,
                expected,
            });
        }
    }
    Ok(())
}

fn renumber_request(container_name: &str, from: ScriptId, to: ScriptId) -> MutationRequest {
    MutationRequest::new(
        MutationKind::RoutineRenumber,
        RequestTarget {
            container: container_name.to_string(),
            routine: from,
        },
        format!("renumber {from} to {to}"),
    )
    .with_diff(Diff::new(
        format!("{from}.id"),
        from.to_string(),
        to.to_string(),
        FieldEdit::RenumberRoutine { from, to },
    ))
}

/// Rewires call sites, then renumbers the mapped routines.
///
/// Renumbering order matters when a destination equals another selected routine's
/// current identifier, so renames are retried in passes until no further rename
/// can make progress. Genuine dead ends (which a well-formed remapper plan never
/// produces) surface as per-routine validation rejections.
fn patch_with_scope(
    pipeline: &mut MutationPipeline,
    container: &mut ScriptContainer,
    map: &IdentifierMap,
    scope: ScopeClass,
) -> Result<PatchReport> {
    verify_scope(map, scope)?;

    let mut report = PatchReport {
        rewire: CallRewirer::rewire(pipeline, container, map)?,
        ..PatchReport::default()
    };
    report.missing.clone_from(&report.rewire.missing);

    let mut remaining: Vec<(ScriptId, ScriptId)> = map
        .iter()
        .filter(|(from, _)| container.contains(*from))
        .collect();

    loop {
        let mut deferred = Vec::new();
        let mut progressed = false;

        for (from, to) in remaining {
            if container.contains(to) {
                // Destination still occupied by a routine that moves later.
                deferred.push((from, to));
                continue;
            }

            let request = renumber_request(container.name(), from, to);
            let outcome = pipeline.propose(request, container)?;
            progressed = true;
            report.renumbered.push(RenumberOutcome { from, to, outcome });
        }

        if deferred.is_empty() {
            break;
        }
        if !progressed {
            // No rename freed a slot this pass; propose the rest so each gets
            // its own rejection and audit record.
            for (from, to) in deferred {
                let request = renumber_request(container.name(), from, to);
                let outcome = pipeline.propose(request, container)?;
                report.renumbered.push(RenumberOutcome { from, to, outcome });
            }
            break;
        }
        remaining = deferred;
    }

    Ok(report)
}

/// Patcher for the global identifier range.
pub struct GlobalPatcher;

impl GlobalPatcher {
    /// Applies a renumbering plan whose keys must all be global.
    ///
    /// # Errors
    /// Returns [`crate::Error::ScopeMismatch`] - before any byte is touched - if
    /// a key classifies outside the global range; otherwise only hard pipeline
    /// failures propagate.
    pub fn patch(
        pipeline: &mut MutationPipeline,
        container: &mut ScriptContainer,
        map: &IdentifierMap,
    ) -> Result<PatchReport> {
        patch_with_scope(pipeline, container, map, ScopeClass::Global)
    }

    /// Shadows a global routine with an object-local clone.
    ///
    /// The shared routine itself is never touched: a copy is inserted under
    /// `local_id` and the object's own call sites are rewired to it. The source
    /// routine is passed in by the caller because globals usually live in a
    /// different container than the object being overridden.
    ///
    /// # Errors
    /// Returns [`crate::Error::ScopeMismatch`] if `global` is not a global
    /// routine or `local_id` is not object-local.
    pub fn inject_override(
        pipeline: &mut MutationPipeline,
        container: &mut ScriptContainer,
        global: &Routine,
        local_id: ScriptId,
    ) -> Result<OverrideReport> {
        if global.id().scope() != ScopeClass::Global {
            return Err(crate::Error::ScopeMismatch {
                id: global.id(),
                actual: global.id().scope(),
                expected: ScopeClass::Global,
            });
        }
        if local_id.scope() != ScopeClass::ObjectLocal {
            return Err(crate::Error::ScopeMismatch {
                id: local_id,
                actual: local_id.scope(),
                expected: ScopeClass::ObjectLocal,
            });
        }

        let clone = global.clone_as(local_id);
        let request = MutationRequest::new(
            MutationKind::RoutineInsert,
            RequestTarget {
                container: container.name().to_string(),
                routine: local_id,
            },
            format!("inject local override of global {}", global.id()),
        )
        .with_diff(Diff::new(
            format!("{local_id}"),
            "absent".to_string(),
            format!("clone of {}", global.id()),
            FieldEdit::InsertRoutine {
                routine: Box::new(clone),
            },
        ));

        let insert = pipeline.propose(request, container)?;

        let rewire = if matches!(
            insert,
            ProposalOutcome::Committed | ProposalOutcome::PreviewQueued
        ) {
            let mut map = IdentifierMap::new();
            map.insert(global.id(), local_id)?;
            CallRewirer::rewire(pipeline, container, &map)?
        } else {
            RewireReport::default()
        };

        Ok(OverrideReport { insert, rewire })
    }
}

/// Patcher for the semi-global identifier range.
pub struct SemiGlobalPatcher;

impl SemiGlobalPatcher {
    /// Applies a renumbering plan whose keys must all be semi-global.
    ///
    /// # Errors
    /// Returns [`crate::Error::ScopeMismatch`] - before any byte is touched - if
    /// a key classifies outside the semi-global range.
    pub fn patch(
        pipeline: &mut MutationPipeline,
        container: &mut ScriptContainer,
        map: &IdentifierMap,
    ) -> Result<PatchReport> {
        patch_with_scope(pipeline, container, map, ScopeClass::SemiGlobal)
    }
}

/// Patcher for the object-local identifier range.
pub struct ObjectLocalPatcher;

impl ObjectLocalPatcher {
    /// Applies a renumbering plan whose keys must all be object-local.
    ///
    /// # Errors
    /// Returns [`crate::Error::ScopeMismatch`] - before any byte is touched - if
    /// a key classifies outside the object-local range.
    pub fn patch(
        pipeline: &mut MutationPipeline,
        container: &mut ScriptContainer,
        map: &IdentifierMap,
    ) -> Result<PatchReport> {
        patch_with_scope(pipeline, container, map, ScopeClass::ObjectLocal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        disassembler::{BranchTarget, Instruction, OperandBlock},
        pipeline::PipelineMode,
        script::RoutineFormat,
    };

    fn call(target: u16) -> Instruction {
        let mut instruction = Instruction {
            opcode: 0x000D,
            true_target: BranchTarget::ReturnTrue,
            false_target: BranchTarget::ReturnFalse,
            operands: OperandBlock::Compact([0; 8]),
        };
        instruction.operands.write_u16(0, target).unwrap();
        instruction
    }

    fn pipeline() -> MutationPipeline {
        let mut pipeline = MutationPipeline::new();
        pipeline.set_mode(PipelineMode::Mutate);
        pipeline
    }

    #[test]
    fn test_scope_mismatch_rejected_before_any_byte() {
        let mut container = ScriptContainer::new("test.bin");
        let mut caller = Routine::new(ScriptId::new(0x1001), RoutineFormat::Compact);
        caller.push_instruction(call(0x1100));
        container.insert_routine(caller).unwrap();
        let before = container
            .routine(ScriptId::new(0x1001))
            .unwrap()
            .to_record_bytes();

        // 0x1100 is object-local, not global.
        let mut map = IdentifierMap::new();
        map.insert(ScriptId::new(0x1100), ScriptId::new(0x1200))
            .unwrap();

        let mut pipeline = pipeline();
        let error = GlobalPatcher::patch(&mut pipeline, &mut container, &map).unwrap_err();
        assert!(matches!(error, crate::Error::ScopeMismatch { .. }));
        assert!(error.to_string().contains("object-local"));

        let after = container
            .routine(ScriptId::new(0x1001))
            .unwrap()
            .to_record_bytes();
        assert_eq!(before, after, "no byte may change on scope mismatch");
        assert!(pipeline.audit().is_empty());
    }

    #[test]
    fn test_object_local_patch_renumbers_and_rewires() {
        let mut container = ScriptContainer::new("test.bin");
        container
            .insert_routine(Routine::new(ScriptId::new(0x1000), RoutineFormat::Compact))
            .unwrap();
        let mut caller = Routine::new(ScriptId::new(0x1001), RoutineFormat::Compact);
        caller.push_instruction(call(0x1000));
        container.insert_routine(caller).unwrap();

        let mut map = IdentifierMap::new();
        map.insert(ScriptId::new(0x1000), ScriptId::new(0x1050))
            .unwrap();

        let mut pipeline = pipeline();
        let report = ObjectLocalPatcher::patch(&mut pipeline, &mut container, &map).unwrap();

        assert_eq!(report.rewire.committed(), 1);
        assert_eq!(report.renumbered.len(), 1);
        assert!(report.renumbered[0].outcome.is_committed());

        assert!(!container.contains(ScriptId::new(0x1000)));
        assert!(container.contains(ScriptId::new(0x1050)));
        let operands = container
            .routine(ScriptId::new(0x1001))
            .unwrap()
            .instruction(0)
            .unwrap()
            .operands
            .as_bytes();
        assert_eq!(&operands[0..2], &[0x50, 0x10]);
    }

    #[test]
    fn test_chained_renumbering_resolves_in_passes() {
        // 0x1000 -> 0x1001 (occupied by a routine that itself moves to 0x1002).
        let mut container = ScriptContainer::new("test.bin");
        container
            .insert_routine(Routine::new(ScriptId::new(0x1000), RoutineFormat::Compact))
            .unwrap();
        container
            .insert_routine(Routine::new(ScriptId::new(0x1001), RoutineFormat::Compact))
            .unwrap();

        let mut map = IdentifierMap::new();
        map.insert(ScriptId::new(0x1000), ScriptId::new(0x1001))
            .unwrap();
        map.insert(ScriptId::new(0x1001), ScriptId::new(0x1002))
            .unwrap();

        let mut pipeline = pipeline();
        let report = ObjectLocalPatcher::patch(&mut pipeline, &mut container, &map).unwrap();

        assert_eq!(report.renumbered.len(), 2);
        assert!(report.renumbered.iter().all(|r| r.outcome.is_committed()));
        assert!(container.contains(ScriptId::new(0x1001)));
        assert!(container.contains(ScriptId::new(0x1002)));
        assert!(!container.contains(ScriptId::new(0x1000)));
    }

    #[test]
    fn test_override_injection_shadows_global() {
        let mut shared = Routine::new(ScriptId::new(0x0010), RoutineFormat::Compact);
        shared.push_instruction(Instruction {
            opcode: 0x0000,
            true_target: BranchTarget::ReturnTrue,
            false_target: BranchTarget::ReturnTrue,
            operands: OperandBlock::Compact([0; 8]),
        });

        let mut container = ScriptContainer::new("object.bin");
        let mut caller = Routine::new(ScriptId::new(0x1001), RoutineFormat::Compact);
        caller.push_instruction(call(0x0010));
        container.insert_routine(caller).unwrap();

        let mut pipeline = pipeline();
        let report = GlobalPatcher::inject_override(
            &mut pipeline,
            &mut container,
            &shared,
            ScriptId::new(0x1800),
        )
        .unwrap();

        assert!(report.insert.is_committed());
        assert_eq!(report.rewire.committed(), 1);

        // Clone present under the local id, call site retargeted to it.
        let clone = container.routine(ScriptId::new(0x1800)).unwrap();
        assert_eq!(clone.len(), 1);
        let operands = container
            .routine(ScriptId::new(0x1001))
            .unwrap()
            .instruction(0)
            .unwrap()
            .operands
            .as_bytes();
        assert_eq!(&operands[0..2], &[0x00, 0x18]);
        // The shared routine itself is untouched.
        assert_eq!(shared.id(), ScriptId::new(0x0010));
    }

    #[test]
    fn test_override_injection_validates_both_scopes() {
        let shared = Routine::new(ScriptId::new(0x0200), RoutineFormat::Compact);
        let mut container = ScriptContainer::new("object.bin");
        let mut pipeline = pipeline();

        // Source is semi-global, not global.
        assert!(GlobalPatcher::inject_override(
            &mut pipeline,
            &mut container,
            &shared,
            ScriptId::new(0x1800)
        )
        .is_err());

        // Destination is global, not object-local.
        let shared = Routine::new(ScriptId::new(0x0010), RoutineFormat::Compact);
        assert!(GlobalPatcher::inject_override(
            &mut pipeline,
            &mut container,
            &shared,
            ScriptId::new(0x0020)
        )
        .is_err());
    }
}
