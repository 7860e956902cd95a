//! Validation stages run by the pipeline before any commit.
//!
//! Stages execute in registration order and short-circuit on the first rejection,
//! mirroring how a request either survives the whole chain or reports the one
//! stage that refused it. Each stage validates one aspect:
//!
//! - [`DiffShapeValidator`] - the request is internally consistent
//! - [`RoutineExistsValidator`] - every referenced routine exists (or is free, for inserts)
//! - [`BranchTargetValidator`] - the branch-target invariant holds after the edit
//!
//! The chain is open: hosts register custom stages with
//! [`crate::pipeline::MutationPipeline::add_validator`].

use crate::{
    disassembler::BranchTarget,
    pipeline::request::{FieldEdit, MutationRequest},
    script::ScriptContainer,
    Result,
};

/// One validation aspect checked before a request may commit.
///
/// Returning an error rejects the request; the pipeline reports the stage's
/// [`name`](ValidationStage::name) together with the error's message.
pub trait ValidationStage {
    /// Validates one aspect of the request against the pre-mutation container.
    ///
    /// # Errors
    /// Returns an error describing the violation; the request is then rejected.
    fn validate(&self, request: &MutationRequest, container: &ScriptContainer) -> Result<()>;

    /// Short, stable stage name surfaced in rejection outcomes.
    fn name(&self) -> &'static str;
}

/// Rejects requests that are internally inconsistent before any semantic check.
///
/// A well-formed request has at least one diff, every diff's edit addresses the
/// routine the request claims to target, and operand writes carry bytes.
pub struct DiffShapeValidator;

impl ValidationStage for DiffShapeValidator {
    fn validate(&self, request: &MutationRequest, _container: &ScriptContainer) -> Result<()> {
        if request.diffs.is_empty() {
            return Err(crate::Error::Error(
                "request carries no diffs".to_string(),
            ));
        }

        for diff in &request.diffs {
            let edited = match &diff.edit {
                FieldEdit::OperandBytes { routine, bytes, .. } => {
                    if bytes.is_empty() {
                        return Err(crate::Error::Error(format!(
                            "{}: operand write carries no bytes",
                            diff.path
                        )));
                    }
                    *routine
                }
                FieldEdit::BranchByte { routine, .. }
                | FieldEdit::Opcode { routine, .. }
                | FieldEdit::ArgCount { routine, .. }
                | FieldEdit::LocalCount { routine, .. }
                | FieldEdit::HeaderFlags { routine, .. } => *routine,
                FieldEdit::RenumberRoutine { from, .. } => *from,
                FieldEdit::InsertRoutine { routine } => routine.id(),
                FieldEdit::RemoveRoutine { id } => *id,
            };

            if edited != request.target.routine {
                return Err(crate::Error::Error(format!(
                    "{}: edit addresses {} but request targets {}",
                    diff.path, edited, request.target.routine
                )));
            }
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "Diff Shape Validation"
    }
}

/// Rejects requests whose routine references do not resolve.
///
/// Edits require their target routine to exist; inserts and renumber
/// destinations require the identifier to be free.
pub struct RoutineExistsValidator;

impl ValidationStage for RoutineExistsValidator {
    fn validate(&self, request: &MutationRequest, container: &ScriptContainer) -> Result<()> {
        for diff in &request.diffs {
            match &diff.edit {
                FieldEdit::OperandBytes { routine, .. }
                | FieldEdit::BranchByte { routine, .. }
                | FieldEdit::Opcode { routine, .. }
                | FieldEdit::ArgCount { routine, .. }
                | FieldEdit::LocalCount { routine, .. }
                | FieldEdit::HeaderFlags { routine, .. } => {
                    if !container.contains(*routine) {
                        return Err(crate::Error::Error(format!(
                            "{}: routine {} not present in {}",
                            diff.path,
                            routine,
                            container.name()
                        )));
                    }
                }
                FieldEdit::RenumberRoutine { from, to } => {
                    if !container.contains(*from) {
                        return Err(crate::Error::Error(format!(
                            "{}: routine {} not present in {}",
                            diff.path,
                            from,
                            container.name()
                        )));
                    }
                    if container.contains(*to) {
                        return Err(crate::Error::Error(format!(
                            "{}: destination {} is already occupied",
                            diff.path, to
                        )));
                    }
                }
                FieldEdit::InsertRoutine { routine } => {
                    if container.contains(routine.id()) {
                        return Err(crate::Error::Error(format!(
                            "{}: identifier {} is already occupied",
                            diff.path,
                            routine.id()
                        )));
                    }
                }
                FieldEdit::RemoveRoutine { id } => {
                    if !container.contains(*id) {
                        return Err(crate::Error::Error(format!(
                            "{}: routine {} not present in {}",
                            diff.path,
                            id,
                            container.name()
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "Routine Existence Validation"
    }
}

/// Re-checks the branch-target invariant a commit must not break.
///
/// Branch targets that are not sentinels must index into the owning routine once
/// it is fully assembled. The invariant may be violated mid-edit while a request
/// is being built; this stage is where it is enforced before bytes change.
pub struct BranchTargetValidator;

impl ValidationStage for BranchTargetValidator {
    fn validate(&self, request: &MutationRequest, container: &ScriptContainer) -> Result<()> {
        for diff in &request.diffs {
            match &diff.edit {
                FieldEdit::BranchByte {
                    routine, index, raw, ..
                } => {
                    // Missing routines are the existence stage's finding.
                    let Some(routine) = container.routine(*routine) else {
                        continue;
                    };
                    if *index >= routine.len() {
                        return Err(crate::Error::Error(format!(
                            "{}: instruction index {} is outside the routine",
                            diff.path, index
                        )));
                    }
                    let target = BranchTarget::from_raw(*raw);
                    if let Some(target_index) = target.index() {
                        if target_index >= routine.len() {
                            return Err(crate::Error::Error(format!(
                                "{}: branch target {} is outside the {}-instruction routine",
                                diff.path,
                                target_index,
                                routine.len()
                            )));
                        }
                    }
                }
                FieldEdit::InsertRoutine { routine } => {
                    for (index, instruction) in routine.instructions().iter().enumerate() {
                        for target in [instruction.true_target, instruction.false_target] {
                            if let Some(target_index) = target.index() {
                                if target_index >= routine.len() {
                                    return Err(crate::Error::Error(format!(
                                        "{}: instruction {} branches to {} outside the \
                                         {}-instruction routine",
                                        diff.path,
                                        index,
                                        target_index,
                                        routine.len()
                                    )));
                                }
                            }
                        }
                    }
                }
                FieldEdit::OperandBytes { routine, index, .. }
                | FieldEdit::Opcode { routine, index, .. } => {
                    let Some(routine) = container.routine(*routine) else {
                        continue;
                    };
                    if *index >= routine.len() {
                        return Err(crate::Error::Error(format!(
                            "{}: instruction index {} is outside the routine",
                            diff.path, index
                        )));
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "Branch Target Validation"
    }
}
