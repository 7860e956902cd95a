//! Structural findings reported by control-flow analysis.
//!
//! Analysis never aborts on a bad element: malformed branch targets, unreachable
//! instructions, detected loops and an exhausted step budget are all recorded as
//! findings against the offending element while the rest of the routine is still
//! processed. Findings are facts about the input, not errors.

use std::fmt;

/// One structural fact discovered while analyzing a routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finding {
    /// A branch byte points outside the routine and is not a sentinel.
    ///
    /// The analyzer treats the offending instruction as routine-terminal.
    BranchOutOfBounds {
        /// Index of the instruction carrying the bad branch.
        index: usize,
        /// The raw branch byte that failed to resolve.
        raw_target: u8,
    },

    /// No path of resolved branches reaches this instruction from the entry index.
    UnreachableInstruction {
        /// Index of the unreachable instruction.
        index: usize,
    },

    /// A resolved branch jumps to a numerically smaller index - a loop.
    BackwardJump {
        /// Index of the jumping instruction.
        from: usize,
        /// The smaller index it jumps back to.
        to: usize,
    },

    /// Simulation stopped because the step budget ran out.
    ///
    /// The one defense against genuinely infinite loops in malformed or
    /// adversarial scripts. A normal, reportable outcome - not an error and not
    /// a reason to retry.
    StepBudgetExhausted {
        /// Number of steps executed before the budget ran out.
        steps: usize,
    },
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::BranchOutOfBounds { index, raw_target } => {
                write!(
                    f,
                    "instruction {index}: branch target 0x{raw_target:02X} is outside the routine"
                )
            }
            Finding::UnreachableInstruction { index } => {
                write!(f, "instruction {index}: unreachable from entry")
            }
            Finding::BackwardJump { from, to } => {
                write!(f, "instruction {from}: backward jump to {to}")
            }
            Finding::StepBudgetExhausted { steps } => {
                write!(f, "simulation stopped after {steps} steps (budget exhausted)")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finding_rendering() {
        assert_eq!(
            Finding::BranchOutOfBounds {
                index: 3,
                raw_target: 0x7F
            }
            .to_string(),
            "instruction 3: branch target 0x7F is outside the routine"
        );
        assert_eq!(
            Finding::BackwardJump { from: 1, to: 0 }.to_string(),
            "instruction 1: backward jump to 0"
        );
    }
}
