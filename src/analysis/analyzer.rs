//! Whole-routine analysis combining simulation and graph-derived sets.
//!
//! [`analyze`] is the one-call entry point: it runs a bounded simulation from the
//! entry index, builds the full successor graph, and folds both into a single
//! [`AnalysisReport`] with reachability, loop pairs, structural findings and a
//! compact summary flag set.

use std::collections::BTreeSet;

use crate::{
    analysis::{ControlFlowGraph, ExecutionTrace, Finding, Simulator},
    script::Routine,
};

bitflags::bitflags! {
    /// Compact summary of what an analysis run discovered.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct AnalysisFlags: u8 {
        /// The simulation was cut off by the step budget.
        const BUDGET_EXHAUSTED = 1 << 0;
        /// At least one backward jump (loop) was detected.
        const HAS_LOOPS = 1 << 1;
        /// At least one instruction is unreachable from the entry index.
        const HAS_UNREACHABLE = 1 << 2;
        /// At least one branch byte points outside the routine without being
        /// a sentinel.
        const HAS_MALFORMED_BRANCHES = 1 << 3;
    }
}

/// Everything one analysis pass learned about a routine.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    /// The diagnostic execution trace from the entry index.
    pub trace: ExecutionTrace,
    /// Indices reachable from the entry index over the full successor graph.
    pub reachable: BTreeSet<usize>,
    /// Indices with no branch path from the entry index.
    pub unreachable: BTreeSet<usize>,
    /// Every `(from, to)` pair where a resolved branch jumps backward.
    pub loop_pairs: Vec<(usize, usize)>,
    /// Structural findings: malformed branches, unreachable instructions,
    /// loops and budget exhaustion.
    pub findings: Vec<Finding>,
    /// Compact summary of the findings.
    pub flags: AnalysisFlags,
}

/// Analyzes a routine from instruction 0.
#[must_use]
pub fn analyze(routine: &Routine) -> AnalysisReport {
    analyze_from(routine, 0)
}

/// Analyzes a routine from an explicit entry index.
///
/// Reachability, unreachability and loop pairs are derived from the successor
/// graph of *every* instruction; the trace's branch policy never influences them.
#[must_use]
pub fn analyze_from(routine: &Routine, entry: usize) -> AnalysisReport {
    let trace = Simulator::new(routine).run_from(entry);
    let cfg = ControlFlowGraph::build(routine);

    let reachable = cfg.reachable_from(entry);
    let unreachable = cfg.unreachable_from(entry);
    let loop_pairs = cfg.backward_edges();

    let mut findings = Vec::new();
    for (index, raw_target) in cfg.malformed_targets() {
        findings.push(Finding::BranchOutOfBounds {
            index: *index,
            raw_target: *raw_target,
        });
    }
    for index in &unreachable {
        findings.push(Finding::UnreachableInstruction { index: *index });
    }
    for (from, to) in &loop_pairs {
        findings.push(Finding::BackwardJump {
            from: *from,
            to: *to,
        });
    }
    if trace.budget_exhausted() {
        findings.push(Finding::StepBudgetExhausted {
            steps: trace.steps.len(),
        });
    }

    let mut flags = AnalysisFlags::default();
    if trace.budget_exhausted() {
        flags |= AnalysisFlags::BUDGET_EXHAUSTED;
    }
    if !loop_pairs.is_empty() {
        flags |= AnalysisFlags::HAS_LOOPS;
    }
    if !unreachable.is_empty() {
        flags |= AnalysisFlags::HAS_UNREACHABLE;
    }
    if !cfg.malformed_targets().is_empty() {
        flags |= AnalysisFlags::HAS_MALFORMED_BRANCHES;
    }

    AnalysisReport {
        trace,
        reachable,
        unreachable,
        loop_pairs,
        findings,
        flags,
    }
}
