//! # scriptscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and
//! traits from the scriptscope library. Import this module to get quick access to
//! the essential types for behavior-script analysis and patching.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all scriptscope operations
pub use crate::Error;

/// The result type used throughout scriptscope
pub use crate::Result;

/// Low-level record parsing
pub use crate::Parser;

// ================================================================================================
// Data Model
// ================================================================================================

/// Routine identifiers and scope classification
pub use crate::script::ident::{ScopeClass, ScriptId};

/// Routines, record formats and containers
pub use crate::script::{Routine, RoutineFormat, ScriptContainer};

// ================================================================================================
// Disassembly
// ================================================================================================

/// The decoded instruction model
pub use crate::disassembler::{
    Annotation, BranchLeg, BranchTarget, Instruction, OperandBlock, UnknownOpcodeCensus,
};

/// Record decoding entry points
pub use crate::disassembler::{decode_instruction, decode_records, encode_records};

// ================================================================================================
// Analysis
// ================================================================================================

/// Whole-routine analysis and its report
pub use crate::analysis::{analyze, analyze_from, AnalysisFlags, AnalysisReport};

/// The successor graph and bounded simulator
pub use crate::analysis::{ControlFlowGraph, ExecutionTrace, Finding, Simulator, TraceOutcome};

// ================================================================================================
// Patching
// ================================================================================================

/// Call-site discovery and rewiring
pub use crate::patching::{find_call_sites, scan_container, CallRewirer, CallSite};

/// Renumbering plans and scope patchers
pub use crate::patching::{
    GlobalPatcher, IdentifierMap, ObjectLocalPatcher, Remapper, SemiGlobalPatcher,
};

// ================================================================================================
// Mutation Pipeline
// ================================================================================================

/// The write barrier and its request/outcome types
pub use crate::pipeline::{
    Diff, FieldEdit, MutationKind, MutationPipeline, MutationRequest, PipelineMode,
    ProposalOutcome, RequestTarget,
};

/// Audit trail access
pub use crate::pipeline::{AuditOutcome, AuditRecord, AuditTrail};
