//! Bounded static simulation of routine execution.
//!
//! The simulator walks a routine from an entry index the way the engine's
//! interpreter would, but without invoking any real primitive effects: each step
//! resolves the current instruction's exit classification to a branch leg, records
//! a diagnostic snapshot, and follows the resolved target. It stops on a return or
//! error sentinel, on a branch that leaves the routine (recorded as a finding, the
//! instruction treated as routine-terminal), or when the step budget runs out.
//!
//! The step budget is a computation bound, not a wall-clock timeout, and exhausting
//! it is a normal reportable outcome - the only defense against genuinely infinite
//! loops in malformed or adversarial scripts.
//!
//! # Branch policy
//!
//! Known opcodes resolve through their reference-table [`ExitClass`]; opcodes with
//! a conditional exit follow the true leg, as do unknown opcodes. The policy only
//! shapes the diagnostic trace - reachability and loop detection are computed over
//! the full successor graph and never depend on it.

use std::collections::BTreeSet;

use tracing::debug;

use crate::{
    analysis::Finding,
    disassembler::{BranchTarget, ExitClass, Instruction},
    script::Routine,
};

/// Default maximum number of simulation steps before the run is cut off.
pub const DEFAULT_STEP_BUDGET: usize = 10_000;

/// How a simulation run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceOutcome {
    /// A branch resolved to the return-true sentinel.
    ReturnedTrue,
    /// A branch resolved to the return-false sentinel.
    ReturnedFalse,
    /// A branch resolved to the propagate-error sentinel.
    PropagatedError,
    /// The step budget ran out before any sentinel was reached.
    BudgetExhausted,
    /// Simulation halted at a malformed target or an invalid entry index.
    Halted,
}

/// One recorded simulation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceStep {
    /// Instruction pointer at this step.
    pub index: usize,
    /// The instruction that was simulated.
    pub instruction: Instruction,
    /// The branch target the exit classification resolved to.
    pub resolved: BranchTarget,
    /// The next instruction pointer, or `None` if the step ended the run.
    pub next: Option<usize>,
    /// Snapshot of the simulated local variables (diagnostic only, no real
    /// variable semantics are implemented).
    pub locals: Vec<i16>,
    /// Snapshot of the simulated arguments (diagnostic only).
    pub args: Vec<i16>,
}

/// The ordered log of one simulation run plus its derived sets.
///
/// A trace belongs to exactly one run and is discarded after its caller consumes
/// it; nothing in the crate retains traces.
#[derive(Debug, Clone)]
pub struct ExecutionTrace {
    /// The recorded steps, in execution order.
    pub steps: Vec<TraceStep>,
    /// How the run ended.
    pub outcome: TraceOutcome,
    /// Structural findings discovered during the run.
    pub findings: Vec<Finding>,
    /// Every instruction index the run visited.
    pub visited: BTreeSet<usize>,
}

impl ExecutionTrace {
    /// Returns `true` if the run was cut off by the step budget.
    #[must_use]
    pub fn budget_exhausted(&self) -> bool {
        self.outcome == TraceOutcome::BudgetExhausted
    }
}

/// Bounded static executor for one routine.
///
/// # Examples
///
/// ```rust
/// use scriptscope::{analysis::Simulator, script::{Routine, RoutineFormat, ident::ScriptId}};
///
/// # let data = [0x00, 0x00, 0xFF, 0xFF, 0, 0, 0, 0, 0, 0, 0, 0];
/// # let routine = Routine::from_records(
/// #     ScriptId::new(0x1000), RoutineFormat::Compact, 0, 0, 0, &data).unwrap();
/// let trace = Simulator::new(&routine).run();
/// for step in &trace.steps {
///     println!("{:3} -> {:?}", step.index, step.next);
/// }
/// ```
pub struct Simulator<'a> {
    routine: &'a Routine,
    budget: usize,
}

impl<'a> Simulator<'a> {
    /// Creates a simulator with the default step budget.
    #[must_use]
    pub fn new(routine: &'a Routine) -> Self {
        Simulator {
            routine,
            budget: DEFAULT_STEP_BUDGET,
        }
    }

    /// Creates a simulator with an explicit step budget.
    #[must_use]
    pub fn with_budget(routine: &'a Routine, budget: usize) -> Self {
        Simulator { routine, budget }
    }

    /// Runs the simulation from instruction 0.
    #[must_use]
    pub fn run(&self) -> ExecutionTrace {
        self.run_from(0)
    }

    /// Runs the simulation from an explicit entry index.
    #[must_use]
    pub fn run_from(&self, entry: usize) -> ExecutionTrace {
        let locals = vec![0i16; usize::from(self.routine.local_count())];
        let args = vec![0i16; usize::from(self.routine.arg_count())];

        let mut steps: Vec<TraceStep> = Vec::new();
        let mut findings = Vec::new();
        let mut visited = BTreeSet::new();
        let mut ip = entry;

        let outcome = loop {
            if steps.len() >= self.budget {
                debug!(steps = steps.len(), "simulation step budget exhausted");
                findings.push(Finding::StepBudgetExhausted { steps: steps.len() });
                break TraceOutcome::BudgetExhausted;
            }

            let Some(instruction) = self.routine.instruction(ip) else {
                break TraceOutcome::Halted;
            };
            visited.insert(ip);

            let resolved = resolve_exit(instruction);
            let (next, outcome) = match resolved {
                BranchTarget::ReturnTrue => (None, Some(TraceOutcome::ReturnedTrue)),
                BranchTarget::ReturnFalse => (None, Some(TraceOutcome::ReturnedFalse)),
                BranchTarget::PropagateError => (None, Some(TraceOutcome::PropagatedError)),
                BranchTarget::Index(target) => {
                    let target = usize::from(target);
                    if target < self.routine.len() {
                        (Some(target), None)
                    } else {
                        // Malformed target: report it and treat the instruction
                        // as routine-terminal.
                        findings.push(Finding::BranchOutOfBounds {
                            index: ip,
                            raw_target: resolved.to_raw(),
                        });
                        (None, Some(TraceOutcome::Halted))
                    }
                }
            };

            steps.push(TraceStep {
                index: ip,
                instruction: instruction.clone(),
                resolved,
                next,
                locals: locals.clone(),
                args: args.clone(),
            });

            match (next, outcome) {
                (Some(target), _) => ip = target,
                (None, Some(outcome)) => break outcome,
                (None, None) => break TraceOutcome::Halted,
            }
        };

        ExecutionTrace {
            steps,
            outcome,
            findings,
            visited,
        }
    }
}

/// Resolves an instruction's exit classification to a branch target.
///
/// Unknown opcodes and conditional exits follow the true leg; the simulator's
/// documented diagnostic policy.
fn resolve_exit(instruction: &Instruction) -> BranchTarget {
    match instruction.annotation().info() {
        Some(info) => match info.exit {
            ExitClass::AlwaysTrue | ExitClass::Conditional => instruction.true_target,
            ExitClass::AlwaysFalse => instruction.false_target,
        },
        None => instruction.true_target,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        disassembler::OperandBlock,
        script::{ident::ScriptId, RoutineFormat},
    };

    fn routine(branches: &[(u16, u8, u8)]) -> Routine {
        let mut routine = Routine::new(ScriptId::new(0x1000), RoutineFormat::Compact);
        for (opcode, t, f) in branches {
            routine.push_instruction(Instruction {
                opcode: *opcode,
                true_target: BranchTarget::from_raw(*t),
                false_target: BranchTarget::from_raw(*f),
                operands: OperandBlock::Compact([0; 8]),
            });
        }
        routine
    }

    #[test]
    fn test_straight_line_returns_true() {
        // sleep -> sleep -> ret-true
        let trace = Simulator::new(&routine(&[(0x0000, 1, 1), (0x0000, 0xFF, 0xFF)])).run();

        assert_eq!(trace.outcome, TraceOutcome::ReturnedTrue);
        assert_eq!(trace.steps.len(), 2);
        assert_eq!(trace.visited, BTreeSet::from([0, 1]));
        assert_eq!(trace.steps[0].next, Some(1));
        assert_eq!(trace.steps[1].next, None);
        assert!(trace.findings.is_empty());
    }

    #[test]
    fn test_always_false_takes_false_leg() {
        // stop_routine (AlwaysFalse) with false leg on ret-false.
        let trace = Simulator::new(&routine(&[(0x000F, 0xFF, 0xFE)])).run();
        assert_eq!(trace.outcome, TraceOutcome::ReturnedFalse);
        assert_eq!(trace.steps[0].resolved, BranchTarget::ReturnFalse);
    }

    #[test]
    fn test_error_sentinel() {
        let trace = Simulator::new(&routine(&[(0x0000, 0xFD, 0xFD)])).run();
        assert_eq!(trace.outcome, TraceOutcome::PropagatedError);
    }

    #[test]
    fn test_unknown_opcode_follows_true_leg() {
        let trace = Simulator::new(&routine(&[(0x4242, 1, 0xFD), (0x0000, 0xFF, 0xFF)])).run();
        assert_eq!(trace.outcome, TraceOutcome::ReturnedTrue);
        assert_eq!(trace.steps[0].next, Some(1));
    }

    #[test]
    fn test_budget_exhaustion_is_reported() {
        // Tight self-loop; budget cuts the run and flags it.
        let trace = Simulator::with_budget(&routine(&[(0x0000, 0, 0)]), 25).run();

        assert_eq!(trace.outcome, TraceOutcome::BudgetExhausted);
        assert!(trace.budget_exhausted());
        assert_eq!(trace.steps.len(), 25);
        assert_eq!(
            trace.findings,
            vec![Finding::StepBudgetExhausted { steps: 25 }]
        );
    }

    #[test]
    fn test_malformed_target_halts_gracefully() {
        // True leg points at index 9 in a 1-instruction routine.
        let trace = Simulator::new(&routine(&[(0x0000, 9, 0xFF)])).run();

        assert_eq!(trace.outcome, TraceOutcome::Halted);
        assert_eq!(
            trace.findings,
            vec![Finding::BranchOutOfBounds {
                index: 0,
                raw_target: 9
            }]
        );
        assert_eq!(trace.steps.len(), 1);
    }

    #[test]
    fn test_entry_out_of_bounds_halts() {
        let trace = Simulator::new(&routine(&[(0x0000, 0xFF, 0xFF)])).run_from(4);
        assert_eq!(trace.outcome, TraceOutcome::Halted);
        assert!(trace.steps.is_empty());
    }

    #[test]
    fn test_snapshots_sized_from_header() {
        let mut target = routine(&[(0x0000, 0xFF, 0xFF)]);
        target = {
            let data = target.to_record_bytes();
            Routine::from_records(target.id(), target.format(), 2, 3, 0, &data).unwrap()
        };

        let trace = Simulator::new(&target).run();
        assert_eq!(trace.steps[0].args.len(), 2);
        assert_eq!(trace.steps[0].locals.len(), 3);
    }
}
