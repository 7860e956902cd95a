//! Instruction-record decoding and disassembly utilities.
//!
//! This module provides the low-level functions that turn raw record bytes into
//! [`crate::disassembler::Instruction`] values and back. Decoding is total over
//! well-formed fixed-size input: the only failure mode is a truncated buffer, and
//! undocumented opcodes decode successfully with an
//! [`crate::disassembler::Annotation::Unknown`] annotation.
//!
//! # Example: Decoding a Record Stream
//!
//! ```rust
//! use scriptscope::{disassembler::decode_records, script::RoutineFormat};
//!
//! // One compact record: sleep, both branches to ret-true.
//! let data = [0x00, 0x00, 0xFF, 0xFF, 0, 0, 0, 0, 0, 0, 0, 0];
//! let instructions = decode_records(RoutineFormat::Compact, &data)?;
//! assert_eq!(instructions.len(), 1);
//! # Ok::<(), scriptscope::Error>(())
//! ```

use std::collections::BTreeMap;

use crate::{
    disassembler::{BranchTarget, Instruction, OperandBlock},
    file::parser::Parser,
    script::{ident::ScriptId, Routine, RoutineFormat, ScriptContainer},
    Result,
};

/// Decodes a single instruction record at the parser's current position.
///
/// Reads the 16-bit opcode (little-endian), the two branch bytes and the
/// format-determined operand block, advancing the parser past the record.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the buffer ends inside the record.
pub fn decode_instruction(parser: &mut Parser<'_>, format: RoutineFormat) -> Result<Instruction> {
    let opcode = parser.read_le::<u16>()?;
    let true_raw = parser.read_le::<u8>()?;
    let false_raw = parser.read_le::<u8>()?;
    let operand_bytes = parser.read_bytes(format.operand_width())?;

    Ok(Instruction {
        opcode,
        true_target: BranchTarget::from_raw(true_raw),
        false_target: BranchTarget::from_raw(false_raw),
        operands: OperandBlock::from_bytes(operand_bytes)?,
    })
}

/// Decodes a complete record buffer into an instruction sequence.
///
/// The buffer length must be an exact multiple of the format's record size;
/// containers never pad instruction data.
///
/// # Errors
/// Returns [`crate::Error::Empty`] for an empty buffer and
/// [`crate::Error::Malformed`] if the buffer length is not a whole number of records.
pub fn decode_records(format: RoutineFormat, data: &[u8]) -> Result<Vec<Instruction>> {
    if data.is_empty() {
        return Err(crate::Error::Empty);
    }

    let record_size = format.record_size();
    if data.len() % record_size != 0 {
        return Err(malformed_error!(
            "Record buffer of {} bytes is not a multiple of the {}-byte record size",
            data.len(),
            record_size
        ));
    }

    let mut parser = Parser::new(data);
    let mut instructions = Vec::with_capacity(data.len() / record_size);
    while parser.has_more_data() {
        instructions.push(decode_instruction(&mut parser, format)?);
    }

    Ok(instructions)
}

/// Serializes an instruction sequence back to raw record bytes.
///
/// The exact inverse of [`decode_records`] for any sequence it produced.
#[must_use]
pub fn encode_records(instructions: &[Instruction]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for instruction in instructions {
        bytes.extend_from_slice(&instruction.to_record_bytes());
    }
    bytes
}

/// A queryable census of undocumented opcodes.
///
/// Unknown opcodes are data, not errors: reverse-engineering workflows need to know
/// *which* undocumented codes appear, *where*, and *how often*. The census scans
/// decoded routines and groups every unknown-opcode occurrence by code.
///
/// # Examples
///
/// ```rust
/// use scriptscope::disassembler::UnknownOpcodeCensus;
/// use scriptscope::script::ScriptContainer;
///
/// let mut census = UnknownOpcodeCensus::new();
/// # let container = ScriptContainer::new("objects.bin");
/// census.scan_container(&container);
/// for (opcode, count) in census.frequency() {
///     println!("opcode 0x{opcode:04x} appears {count} times");
/// }
/// ```
#[derive(Debug, Default, Clone)]
pub struct UnknownOpcodeCensus {
    /// Unknown opcode value -> every (routine, instruction index) it occurs at.
    occurrences: BTreeMap<u16, Vec<(ScriptId, usize)>>,
}

impl UnknownOpcodeCensus {
    /// Creates an empty census.
    #[must_use]
    pub fn new() -> Self {
        UnknownOpcodeCensus {
            occurrences: BTreeMap::new(),
        }
    }

    /// Records every unknown-opcode occurrence in one routine.
    pub fn scan_routine(&mut self, routine: &Routine) {
        for (index, instruction) in routine.instructions().iter().enumerate() {
            if instruction.annotation().is_unknown() {
                self.occurrences
                    .entry(instruction.opcode)
                    .or_default()
                    .push((routine.id(), index));
            }
        }
    }

    /// Records every unknown-opcode occurrence in every routine of a container.
    pub fn scan_container(&mut self, container: &ScriptContainer) {
        for routine in container.routines() {
            self.scan_routine(routine);
        }
    }

    /// Returns `true` if no unknown opcodes were encountered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.occurrences.is_empty()
    }

    /// Returns each unknown opcode together with its occurrence count, ascending by code.
    #[must_use]
    pub fn frequency(&self) -> Vec<(u16, usize)> {
        self.occurrences
            .iter()
            .map(|(code, sites)| (*code, sites.len()))
            .collect()
    }

    /// Returns the occurrence sites of one unknown opcode, if any were recorded.
    #[must_use]
    pub fn sites(&self, opcode: u16) -> Option<&[(ScriptId, usize)]> {
        self.occurrences.get(&opcode).map(Vec::as_slice)
    }
}
