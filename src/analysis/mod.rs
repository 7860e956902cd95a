//! Static control-flow analysis.
//!
//! No real game logic ever runs here: the simulator resolves exit classifications
//! step by step under a hard budget, and the successor graph derives reachability
//! and loop structure from every instruction's branch semantics. Malformed input
//! degrades gracefully into findings; nothing in this module panics on bad data.
//!
//! # Key Types
//! - [`ControlFlowGraph`] - index-level successor graph, rebuilt on demand
//! - [`Simulator`] / [`ExecutionTrace`] - bounded diagnostic execution
//! - [`AnalysisReport`] - combined result of [`analyze`]
//! - [`Finding`] - structural facts reported against individual instructions

mod analyzer;
mod cfg;
mod findings;
mod simulator;

pub use analyzer::{analyze, analyze_from, AnalysisFlags, AnalysisReport};
pub use cfg::ControlFlowGraph;
pub use findings::Finding;
pub use simulator::{
    ExecutionTrace, Simulator, TraceOutcome, TraceStep, DEFAULT_STEP_BUDGET,
};
