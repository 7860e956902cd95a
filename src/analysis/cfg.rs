//! Successor graphs derived from branch semantics.
//!
//! The control-flow graph maps every instruction index to the set of indices its
//! branches can resolve to. It is derived from *all* instructions - not just the
//! ones a simulation visits - so reachability and loop detection see the whole
//! routine. The graph is ephemeral: rebuilt on demand, never mutated.

use std::collections::{BTreeSet, VecDeque};

use crate::{disassembler::BranchLeg, script::Routine};

/// Instruction-index successor graph of one routine.
///
/// Sentinel branch targets contribute no successor edge; branch bytes pointing
/// outside the routine are collected separately as malformed targets and the
/// offending instruction is treated as routine-terminal on that leg.
///
/// # Examples
///
/// ```rust
/// use scriptscope::{analysis::ControlFlowGraph, script::{Routine, RoutineFormat, ident::ScriptId}};
///
/// # let routine = Routine::new(ScriptId::new(0x1000), RoutineFormat::Compact);
/// let cfg = ControlFlowGraph::build(&routine);
/// let reachable = cfg.reachable_from(0);
/// let loops = cfg.backward_edges();
/// ```
#[derive(Debug, Clone)]
pub struct ControlFlowGraph {
    successors: Vec<Vec<usize>>,
    malformed: Vec<(usize, u8)>,
}

impl ControlFlowGraph {
    /// Builds the successor graph from every instruction's branch semantics.
    #[must_use]
    pub fn build(routine: &Routine) -> Self {
        let len = routine.len();
        let mut successors = Vec::with_capacity(len);
        let mut malformed = Vec::new();

        for (index, instruction) in routine.instructions().iter().enumerate() {
            let mut targets: Vec<usize> = Vec::with_capacity(2);
            for leg in [BranchLeg::True, BranchLeg::False] {
                let target = instruction.target(leg);
                match target.index() {
                    Some(successor) if successor < len => {
                        if !targets.contains(&successor) {
                            targets.push(successor);
                        }
                    }
                    Some(_) => malformed.push((index, target.to_raw())),
                    None => {}
                }
            }
            successors.push(targets);
        }

        ControlFlowGraph {
            successors,
            malformed,
        }
    }

    /// Returns the number of instructions the graph covers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.successors.len()
    }

    /// Returns `true` if the graph covers no instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.successors.is_empty()
    }

    /// Returns the successor indices of one instruction.
    ///
    /// Out-of-range queries return an empty slice.
    #[must_use]
    pub fn successors(&self, index: usize) -> &[usize] {
        match self.successors.get(index) {
            Some(targets) => targets,
            None => &[],
        }
    }

    /// Returns every (instruction index, raw branch byte) pair whose target fell
    /// outside the routine without being a sentinel.
    #[must_use]
    pub fn malformed_targets(&self) -> &[(usize, u8)] {
        &self.malformed
    }

    /// Computes the set of indices reachable from `entry` by resolved branches.
    ///
    /// The result is a fixed point: recomputing on an unmodified routine always
    /// yields the same set. An out-of-range entry yields the empty set.
    #[must_use]
    pub fn reachable_from(&self, entry: usize) -> BTreeSet<usize> {
        let mut visited = BTreeSet::new();
        if entry >= self.successors.len() {
            return visited;
        }

        let mut queue = VecDeque::from([entry]);
        while let Some(index) = queue.pop_front() {
            if !visited.insert(index) {
                continue;
            }
            for successor in self.successors(index) {
                if !visited.contains(successor) {
                    queue.push_back(*successor);
                }
            }
        }
        visited
    }

    /// Computes the complement of [`Self::reachable_from`] over all indices.
    #[must_use]
    pub fn unreachable_from(&self, entry: usize) -> BTreeSet<usize> {
        let reachable = self.reachable_from(entry);
        (0..self.successors.len())
            .filter(|index| !reachable.contains(index))
            .collect()
    }

    /// Returns every `(from, to)` pair where a resolved successor is numerically
    /// smaller than its instruction - the loop-detection criterion.
    #[must_use]
    pub fn backward_edges(&self) -> Vec<(usize, usize)> {
        let mut edges = Vec::new();
        for (index, targets) in self.successors.iter().enumerate() {
            for target in targets {
                if *target < index {
                    edges.push((index, *target));
                }
            }
        }
        edges
    }
}
