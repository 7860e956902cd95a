//! Mutation requests, their kinds and their typed diffs.
//!
//! A [`MutationRequest`] names a target, carries one or more [`Diff`]s and a
//! human-readable reason. The diff is two things at once: a display rendering
//! (field path, old value, new value) for preview, and a typed [`FieldEdit`]
//! payload the commit step applies. Nothing outside the pipeline ever applies a
//! `FieldEdit`.
//!
//! [`MutationKind`] is a closed enum: every supported mutation variant carries its
//! policy (mutability, risk, confirmation requirement) as associated data, checked
//! exhaustively, with an explicit [`MutationKind::Unregistered`] fallback for
//! action names arriving from configuration or legacy data.

use std::fmt;

use crate::{
    disassembler::{BranchLeg, BranchTarget},
    script::{ident::ScriptId, Routine, ScriptContainer},
    Result,
};

/// Coarse risk grading attached to each mutation kind's policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskLevel {
    /// Additive or easily reversible changes.
    Low,
    /// In-place byte changes with local blast radius.
    Moderate,
    /// Changes that can alter shared logic or destroy data.
    High,
}

/// The policy a mutation kind carries as associated data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationPolicy {
    /// Whether this kind may mutate at all. Unregistered kinds are immutable.
    pub mutable: bool,
    /// Coarse risk grading, recorded into audit risk notes when elevated.
    pub risk: RiskLevel,
    /// Whether the confirmation gate must approve before commit.
    pub requires_confirmation: bool,
}

/// The closed set of mutation variants the pipeline understands.
///
/// Each variant's policy is compiled in; there is no string-keyed policy table.
/// Inputs naming an action this enum does not model become
/// [`MutationKind::Unregistered`], which the standard safety policy blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationKind {
    /// Rewrite bytes inside an instruction's operand block.
    OperandEdit,
    /// Replace one of an instruction's two branch bytes.
    BranchEdit,
    /// Replace an instruction's opcode.
    OpcodeEdit,
    /// Rewrite the callee identifier of a call site.
    CallRetarget,
    /// Move a routine to a new identifier.
    RoutineRenumber,
    /// Insert a new routine into the container.
    RoutineInsert,
    /// Remove a routine from the container.
    RoutineDelete,
    /// Change a routine's declared argument count, local count or flags.
    HeaderEdit,
    /// An action name this pipeline does not model.
    Unregistered {
        /// The unrecognized action name, preserved for audit.
        action: String,
    },
}

impl MutationKind {
    /// Returns the compiled-in policy for this kind.
    #[must_use]
    pub fn policy(&self) -> MutationPolicy {
        match self {
            MutationKind::OperandEdit | MutationKind::BranchEdit => MutationPolicy {
                mutable: true,
                risk: RiskLevel::Moderate,
                requires_confirmation: false,
            },
            MutationKind::OpcodeEdit => MutationPolicy {
                mutable: true,
                risk: RiskLevel::High,
                requires_confirmation: true,
            },
            MutationKind::CallRetarget | MutationKind::RoutineRenumber => MutationPolicy {
                mutable: true,
                risk: RiskLevel::Moderate,
                requires_confirmation: false,
            },
            MutationKind::RoutineInsert => MutationPolicy {
                mutable: true,
                risk: RiskLevel::Low,
                requires_confirmation: false,
            },
            MutationKind::RoutineDelete => MutationPolicy {
                mutable: true,
                risk: RiskLevel::High,
                requires_confirmation: true,
            },
            MutationKind::HeaderEdit => MutationPolicy {
                mutable: true,
                risk: RiskLevel::Moderate,
                requires_confirmation: false,
            },
            MutationKind::Unregistered { .. } => MutationPolicy {
                mutable: false,
                risk: RiskLevel::High,
                requires_confirmation: true,
            },
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationKind::OperandEdit => write!(f, "operand-edit"),
            MutationKind::BranchEdit => write!(f, "branch-edit"),
            MutationKind::OpcodeEdit => write!(f, "opcode-edit"),
            MutationKind::CallRetarget => write!(f, "call-retarget"),
            MutationKind::RoutineRenumber => write!(f, "routine-renumber"),
            MutationKind::RoutineInsert => write!(f, "routine-insert"),
            MutationKind::RoutineDelete => write!(f, "routine-delete"),
            MutationKind::HeaderEdit => write!(f, "header-edit"),
            MutationKind::Unregistered { action } => write!(f, "unregistered({action})"),
        }
    }
}

/// The (container, routine) pair a request targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTarget {
    /// Name of the owning container file.
    pub container: String,
    /// Identifier of the routine being changed.
    pub routine: ScriptId,
}

impl fmt::Display for RequestTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.container, self.routine)
    }
}

/// The typed payload of one diff - the change the commit step applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEdit {
    /// Overwrite operand bytes of one instruction at a byte offset.
    OperandBytes {
        /// The routine owning the instruction.
        routine: ScriptId,
        /// Index of the instruction within the routine.
        index: usize,
        /// Byte offset within the operand block.
        offset: usize,
        /// Replacement bytes.
        bytes: Vec<u8>,
    },
    /// Replace one branch byte of one instruction.
    BranchByte {
        /// The routine owning the instruction.
        routine: ScriptId,
        /// Index of the instruction within the routine.
        index: usize,
        /// Which branch leg to replace.
        leg: BranchLeg,
        /// The raw replacement branch byte.
        raw: u8,
    },
    /// Replace an instruction's opcode.
    Opcode {
        /// The routine owning the instruction.
        routine: ScriptId,
        /// Index of the instruction within the routine.
        index: usize,
        /// The replacement opcode.
        opcode: u16,
    },
    /// Move a routine to a new identifier.
    RenumberRoutine {
        /// Current identifier.
        from: ScriptId,
        /// New identifier; must be free.
        to: ScriptId,
    },
    /// Insert a fully assembled routine.
    InsertRoutine {
        /// The routine to insert, keyed by its own identifier.
        routine: Box<Routine>,
    },
    /// Remove a routine.
    RemoveRoutine {
        /// Identifier of the routine to remove.
        id: ScriptId,
    },
    /// Replace a routine's declared argument count.
    ArgCount {
        /// The routine being changed.
        routine: ScriptId,
        /// New declared argument count.
        count: u8,
    },
    /// Replace a routine's declared local-variable count.
    LocalCount {
        /// The routine being changed.
        routine: ScriptId,
        /// New declared local count.
        count: u8,
    },
    /// Replace a routine's raw header flags byte.
    HeaderFlags {
        /// The routine being changed.
        routine: ScriptId,
        /// New flags byte.
        flags: u8,
    },
}

impl FieldEdit {
    /// Applies this edit to the container.
    ///
    /// Crate-internal by design: the pipeline's commit step is the only caller.
    ///
    /// # Errors
    /// Returns [`crate::Error::RoutineNotFound`], [`crate::Error::DuplicateRoutine`]
    /// or [`crate::Error::OutOfBounds`] when the container no longer matches the
    /// state the edit was validated against.
    pub(crate) fn apply(&self, container: &mut ScriptContainer) -> Result<()> {
        match self {
            FieldEdit::OperandBytes {
                routine,
                index,
                offset,
                bytes,
            } => {
                let instruction = lookup_instruction(container, *routine, *index)?;
                let operands = instruction.operands.as_bytes_mut();
                let end = offset
                    .checked_add(bytes.len())
                    .ok_or(crate::Error::OutOfBounds)?;
                if end > operands.len() {
                    return Err(crate::Error::OutOfBounds);
                }
                operands[*offset..end].copy_from_slice(bytes);
                Ok(())
            }
            FieldEdit::BranchByte {
                routine,
                index,
                leg,
                raw,
            } => {
                let instruction = lookup_instruction(container, *routine, *index)?;
                instruction.set_target(*leg, BranchTarget::from_raw(*raw));
                Ok(())
            }
            FieldEdit::Opcode {
                routine,
                index,
                opcode,
            } => {
                let instruction = lookup_instruction(container, *routine, *index)?;
                instruction.opcode = *opcode;
                Ok(())
            }
            FieldEdit::RenumberRoutine { from, to } => container.rename_routine(*from, *to),
            FieldEdit::InsertRoutine { routine } => container.insert_routine((**routine).clone()),
            FieldEdit::RemoveRoutine { id } => match container.remove_routine(*id) {
                Some(_) => Ok(()),
                None => Err(crate::Error::RoutineNotFound(*id)),
            },
            FieldEdit::ArgCount { routine, count } => {
                lookup_routine(container, *routine)?.set_arg_count(*count);
                Ok(())
            }
            FieldEdit::LocalCount { routine, count } => {
                lookup_routine(container, *routine)?.set_local_count(*count);
                Ok(())
            }
            FieldEdit::HeaderFlags { routine, flags } => {
                lookup_routine(container, *routine)?.set_flags(*flags);
                Ok(())
            }
        }
    }
}

fn lookup_routine(
    container: &mut ScriptContainer,
    id: ScriptId,
) -> Result<&mut crate::script::Routine> {
    container
        .routine_mut(id)
        .ok_or(crate::Error::RoutineNotFound(id))
}

fn lookup_instruction(
    container: &mut ScriptContainer,
    id: ScriptId,
    index: usize,
) -> Result<&mut crate::disassembler::Instruction> {
    lookup_routine(container, id)?
        .instruction_mut(index)
        .ok_or(crate::Error::OutOfBounds)
}

/// One proposed change: display renderings for preview plus the typed payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff {
    /// Dotted field path, e.g. `"0x1000.instructions[2].operands[0..2]"`.
    pub path: String,
    /// Human-readable rendering of the current value.
    pub before: String,
    /// Human-readable rendering of the proposed value.
    pub after: String,
    /// The typed change the commit step applies.
    pub edit: FieldEdit,
}

impl Diff {
    /// Creates a diff from its renderings and typed payload.
    #[must_use]
    pub fn new(
        path: impl Into<String>,
        before: impl Into<String>,
        after: impl Into<String>,
        edit: FieldEdit,
    ) -> Self {
        Diff {
            path: path.into(),
            before: before.into(),
            after: after.into(),
            edit,
        }
    }
}

impl fmt::Display for Diff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.path, self.before, self.after)
    }
}

/// One proposed mutation: target, kind, diffs and the operator's reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRequest {
    /// The variant being proposed; carries its policy.
    pub kind: MutationKind,
    /// The (container, routine) pair being changed.
    pub target: RequestTarget,
    /// The proposed changes, one diff per touched field.
    pub diffs: Vec<Diff>,
    /// Operator-supplied justification, recorded in the audit trail.
    pub reason: String,
}

impl MutationRequest {
    /// Creates a request with no diffs yet.
    #[must_use]
    pub fn new(kind: MutationKind, target: RequestTarget, reason: impl Into<String>) -> Self {
        MutationRequest {
            kind,
            target,
            diffs: Vec::new(),
            reason: reason.into(),
        }
    }

    /// Appends a diff, builder style.
    #[must_use]
    pub fn with_diff(mut self, diff: Diff) -> Self {
        self.diffs.push(diff);
        self
    }
}
