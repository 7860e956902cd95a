//! Static opcode reference table.
//!
//! The table is the external knowledge base the disassembler annotates from: one entry
//! per documented opcode, carrying the semantic name, category, human-readable stack
//! effect, exit classification and - for call-style opcodes - the location of the
//! callee-identifier field inside the operand block.
//!
//! Coverage is deliberately partial. The legacy instruction set has never been fully
//! documented, so [`lookup`] returns `None` for anything the table does not describe
//! and the decoding layer models that case as first-class data
//! ([`crate::disassembler::Annotation::Unknown`]) rather than an error.
//!
//! Opcodes below [`PRIMITIVE_LIMIT`] are engine primitives; higher codes are special
//! codes. The boundary is a property of the instruction set, not of table coverage -
//! a special code may well be documented (see `debug_break`) while a primitive is not.

use strum::{Display, EnumCount, EnumIter};

/// First opcode value that is no longer an engine primitive.
pub const PRIMITIVE_LIMIT: u16 = 0x0100;

/// Broad functional grouping of documented opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumCount, EnumIter)]
pub enum OpcodeCategory {
    /// Sequencing, waiting and routine-level exits.
    #[strum(serialize = "control")]
    Control,

    /// Arithmetic, comparison and randomness.
    #[strum(serialize = "math")]
    Math,

    /// Attribute and flag access on the owning object's data block.
    #[strum(serialize = "data")]
    Data,

    /// Object-world interaction: selection, state and animation.
    #[strum(serialize = "object")]
    Object,

    /// Spatial queries and routing.
    #[strum(serialize = "position")]
    Position,

    /// Engine services: sound, timers, dialogs, notifications.
    #[strum(serialize = "system")]
    System,

    /// Transfer of control to another routine by identifier.
    #[strum(serialize = "call")]
    Call,

    /// Development and diagnostics aids.
    #[strum(serialize = "debug")]
    Debug,
}

/// How an opcode's execution resolves to one of its branch legs.
///
/// This classification drives the static simulator: it never executes real
/// primitive effects, so the exit class is the only thing it knows about an
/// instruction's runtime outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitClass {
    /// The instruction always succeeds; execution continues on the true leg.
    AlwaysTrue,
    /// The instruction always fails; execution continues on the false leg.
    AlwaysFalse,
    /// The outcome depends on runtime state; either leg may be taken.
    Conditional,
}

/// Location of the callee-identifier field inside a call opcode's operand block.
///
/// The reference table's operand-layout hint for the one field the cross-reference
/// machinery must understand: where the 16-bit target identifier is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallLayout {
    /// Byte offset of the identifier field within the operand block.
    pub target_offset: usize,
    /// Width of the identifier field in bytes (always little-endian).
    pub target_width: usize,
}

/// One reference-table entry describing a documented opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeInfo {
    /// The opcode value this entry describes.
    pub code: u16,
    /// Semantic name used by the disassembly renderer.
    pub mnemonic: &'static str,
    /// Broad functional grouping.
    pub category: OpcodeCategory,
    /// Human-readable description of the instruction's stack effect.
    pub stack_effect: &'static str,
    /// How execution resolves to a branch leg.
    pub exit: ExitClass,
    /// Human-readable operand-layout hint.
    pub operands: &'static str,
    /// Callee-identifier field location, for call-style opcodes only.
    pub call_layout: Option<CallLayout>,
}

/// The reference table, sorted ascending by opcode value for binary search.
pub static OPCODES: &[OpcodeInfo] = &[
    OpcodeInfo {
        code: 0x0000,
        mnemonic: "sleep",
        category: OpcodeCategory::Control,
        stack_effect: "no stack effect",
        exit: ExitClass::AlwaysTrue,
        operands: "ticks: u16 @0",
        call_layout: None,
    },
    OpcodeInfo {
        code: 0x0001,
        mnemonic: "expression",
        category: OpcodeCategory::Math,
        stack_effect: "pops 2 operands, pushes 1 result",
        exit: ExitClass::Conditional,
        operands: "lhs: u16 @0, rhs: u16 @2, op: u8 @4, mode: u8 @5",
        call_layout: None,
    },
    OpcodeInfo {
        code: 0x0002,
        mnemonic: "random_branch",
        category: OpcodeCategory::Math,
        stack_effect: "pushes 1 random value",
        exit: ExitClass::Conditional,
        operands: "bound: u16 @0",
        call_layout: None,
    },
    OpcodeInfo {
        code: 0x0003,
        mnemonic: "set_to_next",
        category: OpcodeCategory::Object,
        stack_effect: "replaces top with next matching object",
        exit: ExitClass::Conditional,
        operands: "kind: u8 @0, filter: u16 @1",
        call_layout: None,
    },
    OpcodeInfo {
        code: 0x0004,
        mnemonic: "get_attribute",
        category: OpcodeCategory::Data,
        stack_effect: "pushes 1 attribute value",
        exit: ExitClass::AlwaysTrue,
        operands: "slot: u8 @0",
        call_layout: None,
    },
    OpcodeInfo {
        code: 0x0005,
        mnemonic: "set_attribute",
        category: OpcodeCategory::Data,
        stack_effect: "pops 1 attribute value",
        exit: ExitClass::AlwaysTrue,
        operands: "slot: u8 @0",
        call_layout: None,
    },
    OpcodeInfo {
        code: 0x0006,
        mnemonic: "compare_flags",
        category: OpcodeCategory::Data,
        stack_effect: "no stack effect",
        exit: ExitClass::Conditional,
        operands: "mask: u16 @0, expect: u16 @2",
        call_layout: None,
    },
    OpcodeInfo {
        code: 0x0007,
        mnemonic: "route_to",
        category: OpcodeCategory::Position,
        stack_effect: "no stack effect",
        exit: ExitClass::Conditional,
        operands: "slot: u8 @0, flags: u8 @1",
        call_layout: None,
    },
    OpcodeInfo {
        code: 0x0008,
        mnemonic: "distance_check",
        category: OpcodeCategory::Position,
        stack_effect: "pushes 1 distance value",
        exit: ExitClass::Conditional,
        operands: "target: u16 @0, limit: u16 @2",
        call_layout: None,
    },
    OpcodeInfo {
        code: 0x0009,
        mnemonic: "animate",
        category: OpcodeCategory::Object,
        stack_effect: "no stack effect",
        exit: ExitClass::Conditional,
        operands: "sequence: u16 @0, loops: u8 @2",
        call_layout: None,
    },
    OpcodeInfo {
        code: 0x000A,
        mnemonic: "play_sound",
        category: OpcodeCategory::System,
        stack_effect: "no stack effect",
        exit: ExitClass::AlwaysTrue,
        operands: "sound: u16 @0, volume: u8 @2",
        call_layout: None,
    },
    OpcodeInfo {
        code: 0x000B,
        mnemonic: "set_state",
        category: OpcodeCategory::Object,
        stack_effect: "no stack effect",
        exit: ExitClass::AlwaysTrue,
        operands: "state: u16 @0",
        call_layout: None,
    },
    OpcodeInfo {
        code: 0x000C,
        mnemonic: "notify_observer",
        category: OpcodeCategory::System,
        stack_effect: "no stack effect",
        exit: ExitClass::AlwaysTrue,
        operands: "channel: u8 @0",
        call_layout: None,
    },
    OpcodeInfo {
        code: 0x000D,
        mnemonic: "gosub",
        category: OpcodeCategory::Call,
        stack_effect: "pushes a frame for the callee",
        exit: ExitClass::Conditional,
        operands: "callee: u16 @0, arg0: u16 @2, arg1: u16 @4",
        call_layout: Some(CallLayout {
            target_offset: 0,
            target_width: 2,
        }),
    },
    OpcodeInfo {
        code: 0x000E,
        mnemonic: "push_result",
        category: OpcodeCategory::Control,
        stack_effect: "pushes 1 literal",
        exit: ExitClass::AlwaysTrue,
        operands: "value: u16 @0",
        call_layout: None,
    },
    OpcodeInfo {
        code: 0x000F,
        mnemonic: "stop_routine",
        category: OpcodeCategory::Control,
        stack_effect: "clears the frame",
        exit: ExitClass::AlwaysFalse,
        operands: "unused",
        call_layout: None,
    },
    OpcodeInfo {
        code: 0x0010,
        mnemonic: "idle",
        category: OpcodeCategory::Control,
        stack_effect: "no stack effect",
        exit: ExitClass::AlwaysTrue,
        operands: "ticks: u16 @0, interruptible: u8 @2",
        call_layout: None,
    },
    OpcodeInfo {
        code: 0x0014,
        mnemonic: "show_dialog",
        category: OpcodeCategory::System,
        stack_effect: "pushes 1 choice index",
        exit: ExitClass::Conditional,
        operands: "message: u16 @0, style: u8 @2",
        call_layout: None,
    },
    OpcodeInfo {
        code: 0x0016,
        mnemonic: "set_timer",
        category: OpcodeCategory::System,
        stack_effect: "no stack effect",
        exit: ExitClass::AlwaysTrue,
        operands: "timer: u8 @0, ticks: u16 @1",
        call_layout: None,
    },
    OpcodeInfo {
        code: 0x0018,
        mnemonic: "clear_timer",
        category: OpcodeCategory::System,
        stack_effect: "no stack effect",
        exit: ExitClass::AlwaysTrue,
        operands: "timer: u8 @0",
        call_layout: None,
    },
    OpcodeInfo {
        code: 0x001A,
        mnemonic: "test_flag",
        category: OpcodeCategory::Data,
        stack_effect: "no stack effect",
        exit: ExitClass::Conditional,
        operands: "flag: u8 @0",
        call_layout: None,
    },
    OpcodeInfo {
        code: 0x001B,
        mnemonic: "set_flag",
        category: OpcodeCategory::Data,
        stack_effect: "no stack effect",
        exit: ExitClass::AlwaysTrue,
        operands: "flag: u8 @0, value: u8 @1",
        call_layout: None,
    },
    OpcodeInfo {
        code: 0x0025,
        mnemonic: "spawn_routine",
        category: OpcodeCategory::Call,
        stack_effect: "no stack effect",
        exit: ExitClass::Conditional,
        operands: "callee: u16 @0, priority: u8 @2",
        call_layout: Some(CallLayout {
            target_offset: 0,
            target_width: 2,
        }),
    },
    OpcodeInfo {
        code: 0x0026,
        mnemonic: "chain_state",
        category: OpcodeCategory::Call,
        stack_effect: "replaces the current frame",
        exit: ExitClass::Conditional,
        operands: "mode: u16 @0, callee: u16 @2",
        call_layout: Some(CallLayout {
            target_offset: 2,
            target_width: 2,
        }),
    },
    OpcodeInfo {
        code: 0x0102,
        mnemonic: "debug_break",
        category: OpcodeCategory::Debug,
        stack_effect: "no stack effect",
        exit: ExitClass::AlwaysTrue,
        operands: "tag: u16 @0",
        call_layout: None,
    },
];

/// Looks up the reference-table entry for an opcode.
///
/// Returns `None` for undocumented opcodes; callers model that case through
/// [`crate::disassembler::Annotation::Unknown`], never as an error.
#[must_use]
pub fn lookup(opcode: u16) -> Option<&'static OpcodeInfo> {
    OPCODES
        .binary_search_by_key(&opcode, |info| info.code)
        .ok()
        .map(|index| &OPCODES[index])
}
