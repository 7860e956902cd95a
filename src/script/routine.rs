//! Decoded behavior routines and their container-format versioning.
//!
//! A routine is an ordered sequence of decoded instructions plus the header metadata
//! the container reader supplies: identifier, declared argument and local counts, a
//! raw flags byte and the format tag that fixes the record layout. Identity is the
//! pair (owning container, identifier).
//!
//! Routines are mutable only through the mutation pipeline; everything public here
//! is either a constructor, a read accessor or a pure rendering helper.

use crate::{
    disassembler::{decode_records, encode_records, Instruction},
    script::ident::ScriptId,
    Result,
};

/// The supported instruction-record layouts, keyed by the container's format tag.
///
/// The two layouts differ only in operand-block width. They are distinct versioned
/// formats: a container declares exactly one tag per routine, and no code path
/// assumes a universal operand size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoutineFormat {
    /// Format tag `0x8002`: records carry 8 operand bytes.
    Compact,
    /// Format tag `0x8003`: records carry 16 operand bytes.
    Extended,
}

impl RoutineFormat {
    /// Resolves a container format tag to its record layout.
    ///
    /// Returns `None` for tags this crate does not support.
    #[must_use]
    pub fn from_tag(tag: u16) -> Option<Self> {
        match tag {
            0x8002 => Some(RoutineFormat::Compact),
            0x8003 => Some(RoutineFormat::Extended),
            _ => None,
        }
    }

    /// Returns the on-disk format tag for this layout.
    #[must_use]
    pub fn tag(self) -> u16 {
        match self {
            RoutineFormat::Compact => 0x8002,
            RoutineFormat::Extended => 0x8003,
        }
    }

    /// Returns the operand-block width in bytes (8 or 16).
    #[must_use]
    pub fn operand_width(self) -> usize {
        match self {
            RoutineFormat::Compact => 8,
            RoutineFormat::Extended => 16,
        }
    }

    /// Returns the total record size in bytes: opcode, two branch bytes, operands.
    #[must_use]
    pub fn record_size(self) -> usize {
        4 + self.operand_width()
    }
}

/// A decoded behavior script: header metadata plus an ordered instruction list.
///
/// # Examples
///
/// ```rust
/// use scriptscope::script::{Routine, RoutineFormat, ident::ScriptId};
///
/// // sleep; both branches return true.
/// let data = [0x00, 0x00, 0xFF, 0xFF, 0, 0, 0, 0, 0, 0, 0, 0];
/// let routine = Routine::from_records(
///     ScriptId::new(0x1000),
///     RoutineFormat::Compact,
///     0,
///     0,
///     0,
///     &data,
/// )?;
/// assert_eq!(routine.len(), 1);
/// assert_eq!(routine.to_record_bytes(), data);
/// # Ok::<(), scriptscope::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routine {
    id: ScriptId,
    name: Option<String>,
    format: RoutineFormat,
    arg_count: u8,
    local_count: u8,
    flags: u8,
    instructions: Vec<Instruction>,
}

impl Routine {
    /// Creates an empty routine with the given identifier and format.
    ///
    /// Intended for authoring flows that assemble instructions before proposing
    /// the routine's insertion through the mutation pipeline.
    #[must_use]
    pub fn new(id: ScriptId, format: RoutineFormat) -> Self {
        Routine {
            id,
            name: None,
            format,
            arg_count: 0,
            local_count: 0,
            flags: 0,
            instructions: Vec::new(),
        }
    }

    /// Decodes a routine from its raw record buffer and header metadata.
    ///
    /// # Arguments
    /// * `id` - The routine's identifier within its container
    /// * `format` - The record layout declared by the container's format tag
    /// * `arg_count` - Declared argument count from the routine header
    /// * `local_count` - Declared local-variable count from the routine header
    /// * `flags` - Raw header flags byte, preserved without interpretation
    /// * `data` - The instruction-record bytes
    ///
    /// # Errors
    /// Returns [`crate::Error::Empty`] for an empty buffer and
    /// [`crate::Error::Malformed`] if the buffer is not a whole number of records.
    pub fn from_records(
        id: ScriptId,
        format: RoutineFormat,
        arg_count: u8,
        local_count: u8,
        flags: u8,
        data: &[u8],
    ) -> Result<Self> {
        Ok(Routine {
            id,
            name: None,
            format,
            arg_count,
            local_count,
            flags,
            instructions: decode_records(format, data)?,
        })
    }

    /// Attaches the display name the container reader recovered for this routine.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Returns the routine's identifier.
    #[must_use]
    pub fn id(&self) -> ScriptId {
        self.id
    }

    /// Returns the display name, if the container reader supplied one.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the record layout this routine was decoded with.
    #[must_use]
    pub fn format(&self) -> RoutineFormat {
        self.format
    }

    /// Returns the declared argument count.
    #[must_use]
    pub fn arg_count(&self) -> u8 {
        self.arg_count
    }

    /// Returns the declared local-variable count.
    #[must_use]
    pub fn local_count(&self) -> u8 {
        self.local_count
    }

    /// Returns the raw header flags byte, uninterpreted.
    #[must_use]
    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// Returns the decoded instruction list.
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Returns the number of instructions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns `true` if the routine has no instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Returns the instruction at `index`, if in bounds.
    #[must_use]
    pub fn instruction(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    /// Appends an instruction. Authoring helper for routines not yet inserted
    /// into a container; container-held routines change only through the pipeline.
    pub fn push_instruction(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    /// Returns a copy of this routine under a new identifier.
    ///
    /// Used by override injection to clone shared logic into the object-local
    /// range; the clone keeps name, header metadata and all instruction bytes.
    #[must_use]
    pub fn clone_as(&self, id: ScriptId) -> Self {
        let mut clone = self.clone();
        clone.id = id;
        clone
    }

    /// Serializes the instruction list back to raw record bytes.
    #[must_use]
    pub fn to_record_bytes(&self) -> Vec<u8> {
        encode_records(&self.instructions)
    }

    /// Renders a human-readable disassembly listing, one line per instruction.
    #[must_use]
    pub fn disassemble(&self) -> String {
        let mut listing = String::new();
        for (index, instruction) in self.instructions.iter().enumerate() {
            listing.push_str(&format!("{index:3}: {instruction}\n"));
        }
        listing
    }

    pub(crate) fn instruction_mut(&mut self, index: usize) -> Option<&mut Instruction> {
        self.instructions.get_mut(index)
    }

    pub(crate) fn set_id(&mut self, id: ScriptId) {
        self.id = id;
    }

    pub(crate) fn set_arg_count(&mut self, count: u8) {
        self.arg_count = count;
    }

    pub(crate) fn set_local_count(&mut self, count: u8) {
        self.local_count = count;
    }

    pub(crate) fn set_flags(&mut self, flags: u8) {
        self.flags = flags;
    }
}
