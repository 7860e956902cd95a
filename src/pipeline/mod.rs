//! The mutation pipeline - the single write barrier for every binary-affecting change.
//!
//! Nothing in this crate (and nothing in a well-behaved host) mutates a container
//! except through [`MutationPipeline::propose`]. A proposal runs, in order: the
//! safety oracle, the mode gate, the validator chain, the confirmation gate, and
//! finally - in Mutate mode only - the commit step and post-commit hooks. Every
//! call appends exactly one immutable audit record, whatever the outcome.
//!
//! # Modes
//!
//! The pipeline is a small operator-driven state machine:
//!
//! - **Inspect** (initial) - every write attempt is rejected outright
//! - **Preview** - validation runs, diffs queue up as pending, nothing is touched
//! - **Mutate** - validation runs and passing changes are applied immediately
//!
//! Pending requests accumulate in Preview mode and can later be promoted in one
//! batch with [`MutationPipeline::commit_pending`] or dropped with
//! [`MutationPipeline::discard_pending`]. Each item in a promoted batch still
//! succeeds or fails independently; there is no multi-item rollback.
//!
//! # Concurrency
//!
//! One pipeline owns one mode flag, one pending queue and one audit trail. No
//! operation suspends internally, so hosts with concurrent callers serialize
//! access with a single external mutex around propose/commit/history reads.
//!
//! # Example
//!
//! ```rust
//! use scriptscope::pipeline::{
//!     Diff, FieldEdit, MutationKind, MutationPipeline, MutationRequest, PipelineMode,
//!     ProposalOutcome, RequestTarget,
//! };
//! use scriptscope::script::{Routine, RoutineFormat, ScriptContainer, ident::ScriptId};
//! use scriptscope::disassembler::BranchLeg;
//!
//! let mut container = ScriptContainer::new("objects.bin");
//! let data = [0x00, 0x00, 0xFF, 0xFF, 0, 0, 0, 0, 0, 0, 0, 0];
//! container.insert_routine(Routine::from_records(
//!     ScriptId::new(0x1000), RoutineFormat::Compact, 0, 0, 0, &data)?)?;
//!
//! let mut pipeline = MutationPipeline::new();
//! pipeline.set_mode(PipelineMode::Mutate);
//!
//! let request = MutationRequest::new(
//!     MutationKind::BranchEdit,
//!     RequestTarget { container: "objects.bin".into(), routine: ScriptId::new(0x1000) },
//!     "point the true branch at ret-false",
//! )
//! .with_diff(Diff::new(
//!     "0x1000.instructions[0].true",
//!     "ret-true",
//!     "ret-false",
//!     FieldEdit::BranchByte {
//!         routine: ScriptId::new(0x1000),
//!         index: 0,
//!         leg: BranchLeg::True,
//!         raw: 0xFE,
//!     },
//! ));
//!
//! let outcome = pipeline.propose(request, &mut container)?;
//! assert!(matches!(outcome, ProposalOutcome::Committed));
//! assert_eq!(pipeline.audit().len(), 1);
//! # Ok::<(), scriptscope::Error>(())
//! ```

mod audit;
mod request;
mod safety;
mod validation;

pub use audit::{AuditOutcome, AuditRecord, AuditTrail};
pub use request::{
    Diff, FieldEdit, MutationKind, MutationPolicy, MutationRequest, RequestTarget, RiskLevel,
};
pub use safety::{PermissiveSafetyPolicy, SafetyLevel, SafetyPolicy, StandardSafetyPolicy};
pub use validation::{
    BranchTargetValidator, DiffShapeValidator, RoutineExistsValidator, ValidationStage,
};

use std::time::SystemTime;

use strum::Display;
use tracing::debug;

use crate::{script::ScriptContainer, Result};

/// The pipeline's operator-driven mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum PipelineMode {
    /// All write attempts are rejected outright. The initial mode.
    #[strum(serialize = "inspect")]
    Inspect,
    /// Validation runs and requests queue as pending; nothing is touched.
    #[strum(serialize = "preview")]
    Preview,
    /// Validation runs and passing changes are applied immediately.
    #[strum(serialize = "mutate")]
    Mutate,
}

/// The complete outcome taxonomy of one proposal.
///
/// These are the only outcomes a caller needs to handle; hard commit failures
/// surface as [`crate::Error`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposalOutcome {
    /// The change was applied and audited.
    Committed,
    /// The change passed validation and waits in the pending queue.
    PreviewQueued,
    /// The safety oracle blocked the change, or the pipeline is in Inspect mode.
    RejectedBySafety {
        /// The specific safety reason.
        reason: String,
    },
    /// A validation stage refused the change.
    RejectedByValidation {
        /// Name of the refusing stage.
        stage: &'static str,
        /// The specific validation reason.
        reason: String,
    },
    /// The operator declined the change.
    RejectedByUser {
        /// Why the operator's decision rejected the change.
        reason: String,
    },
}

impl ProposalOutcome {
    /// Returns `true` if the change is now part of the container.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        matches!(self, ProposalOutcome::Committed)
    }

    /// Returns the rejection reason, if the proposal was rejected.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            ProposalOutcome::Committed | ProposalOutcome::PreviewQueued => None,
            ProposalOutcome::RejectedBySafety { reason }
            | ProposalOutcome::RejectedByValidation { reason, .. }
            | ProposalOutcome::RejectedByUser { reason } => Some(reason),
        }
    }

    fn audit_outcome(&self) -> AuditOutcome {
        match self {
            ProposalOutcome::Committed => AuditOutcome::Committed,
            ProposalOutcome::PreviewQueued => AuditOutcome::PreviewQueued,
            ProposalOutcome::RejectedBySafety { .. } => AuditOutcome::RejectedBySafety,
            ProposalOutcome::RejectedByValidation { .. } => AuditOutcome::RejectedByValidation,
            ProposalOutcome::RejectedByUser { .. } => AuditOutcome::RejectedByUser,
        }
    }
}

/// Operator decision hook for mutation kinds whose policy requires confirmation.
pub trait ConfirmationGate {
    /// Returns `true` to let the request proceed.
    fn confirm(&self, request: &MutationRequest) -> bool;
}

/// Approves every confirmation request. The default gate for unattended use.
pub struct AutoApprove;

impl ConfirmationGate for AutoApprove {
    fn confirm(&self, _request: &MutationRequest) -> bool {
        true
    }
}

/// Callback invoked after a successful commit.
pub trait PostCommitHook {
    /// Observes a committed request and the post-commit container state.
    fn after_commit(&self, request: &MutationRequest, container: &ScriptContainer);
}

/// The write barrier gating every change, with modes, validators and audit trail.
///
/// Explicitly constructed and passed by reference to every caller - there is no
/// process-wide singleton. One pipeline, one history.
pub struct MutationPipeline {
    mode: PipelineMode,
    safety: Box<dyn SafetyPolicy>,
    validators: Vec<Box<dyn ValidationStage>>,
    confirmation: Box<dyn ConfirmationGate>,
    hooks: Vec<Box<dyn PostCommitHook>>,
    pending: Vec<MutationRequest>,
    audit: AuditTrail,
}

impl MutationPipeline {
    /// Creates a pipeline in Inspect mode with the standard safety policy and
    /// the default validator chain.
    #[must_use]
    pub fn new() -> Self {
        MutationPipeline {
            mode: PipelineMode::Inspect,
            safety: Box::new(StandardSafetyPolicy),
            validators: vec![
                Box::new(DiffShapeValidator),
                Box::new(RoutineExistsValidator),
                Box::new(BranchTargetValidator),
            ],
            confirmation: Box::new(AutoApprove),
            hooks: Vec::new(),
            pending: Vec::new(),
            audit: AuditTrail::new(),
        }
    }

    /// Replaces the safety policy.
    #[must_use]
    pub fn with_safety<P: SafetyPolicy + 'static>(mut self, policy: P) -> Self {
        self.safety = Box::new(policy);
        self
    }

    /// Appends a validation stage to the chain.
    #[must_use]
    pub fn add_validator<V: ValidationStage + 'static>(mut self, validator: V) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    /// Replaces the confirmation gate.
    #[must_use]
    pub fn with_confirmation<G: ConfirmationGate + 'static>(mut self, gate: G) -> Self {
        self.confirmation = Box::new(gate);
        self
    }

    /// Registers a post-commit hook.
    #[must_use]
    pub fn add_hook<H: PostCommitHook + 'static>(mut self, hook: H) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    /// Returns the current mode.
    #[must_use]
    pub fn mode(&self) -> PipelineMode {
        self.mode
    }

    /// Switches the mode. Transitions are operator-driven, never automatic.
    pub fn set_mode(&mut self, mode: PipelineMode) {
        self.mode = mode;
    }

    /// Returns the requests queued in Preview mode.
    #[must_use]
    pub fn pending(&self) -> &[MutationRequest] {
        &self.pending
    }

    /// Returns the audit trail.
    #[must_use]
    pub fn audit(&self) -> &AuditTrail {
        &self.audit
    }

    /// Proposes one mutation.
    ///
    /// Runs the safety oracle, the mode gate, the validator chain and the
    /// confirmation gate; in Mutate mode a passing request is applied immediately
    /// and post-commit hooks run. Exactly one audit record is appended whatever
    /// happens.
    ///
    /// # Errors
    /// Returns an error only when a validated commit fails to run to completion -
    /// the container no longer matches the validated state. Policy rejections are
    /// [`ProposalOutcome`] values, not errors.
    pub fn propose(
        &mut self,
        request: MutationRequest,
        container: &mut ScriptContainer,
    ) -> Result<ProposalOutcome> {
        let mut risk_notes = Vec::new();

        match self.safety.assess(&request, container) {
            SafetyLevel::Blocking { reason } => {
                let outcome = ProposalOutcome::RejectedBySafety { reason };
                self.record(&request, &outcome, &risk_notes);
                return Ok(outcome);
            }
            SafetyLevel::Cautionary { note } => risk_notes.push(note),
            SafetyLevel::Acceptable => {}
        }

        if self.mode == PipelineMode::Inspect {
            let outcome = ProposalOutcome::RejectedBySafety {
                reason: "pipeline is in inspect mode; write attempts are rejected".to_string(),
            };
            self.record(&request, &outcome, &risk_notes);
            return Ok(outcome);
        }

        for validator in &self.validators {
            if let Err(error) = validator.validate(&request, container) {
                let outcome = ProposalOutcome::RejectedByValidation {
                    stage: validator.name(),
                    reason: error.to_string(),
                };
                self.record(&request, &outcome, &risk_notes);
                return Ok(outcome);
            }
        }

        if request.kind.policy().requires_confirmation && !self.confirmation.confirm(&request) {
            let outcome = ProposalOutcome::RejectedByUser {
                reason: format!("confirmation declined for {}", request.kind),
            };
            self.record(&request, &outcome, &risk_notes);
            return Ok(outcome);
        }

        if self.mode == PipelineMode::Preview {
            let outcome = ProposalOutcome::PreviewQueued;
            self.record(&request, &outcome, &risk_notes);
            self.pending.push(request);
            return Ok(outcome);
        }

        // Mutate mode: apply every diff, then notify the hooks. Once the commit
        // step starts it runs to completion or reports a hard failure.
        for diff in &request.diffs {
            if let Err(error) = diff.edit.apply(container) {
                self.audit.append(AuditRecord {
                    target: request.target.clone(),
                    kind: request.kind.clone(),
                    outcome: AuditOutcome::CommitFailed,
                    reason: request.reason.clone(),
                    detail: error.to_string(),
                    risk_notes,
                    timestamp: SystemTime::now(),
                });
                return Err(error);
            }
        }

        for hook in &self.hooks {
            hook.after_commit(&request, container);
        }

        let outcome = ProposalOutcome::Committed;
        self.record(&request, &outcome, &risk_notes);
        Ok(outcome)
    }

    /// Promotes every pending request in one batch: switches to Mutate mode and
    /// replays each request through [`Self::propose`]. Items succeed or fail
    /// independently; outcomes are returned in queue order.
    ///
    /// # Errors
    /// Propagates the first hard commit failure; remaining items stay unapplied.
    pub fn commit_pending(
        &mut self,
        container: &mut ScriptContainer,
    ) -> Result<Vec<ProposalOutcome>> {
        self.set_mode(PipelineMode::Mutate);
        let pending: Vec<MutationRequest> = self.pending.drain(..).collect();

        let mut outcomes = Vec::with_capacity(pending.len());
        for request in pending {
            outcomes.push(self.propose(request, container)?);
        }
        Ok(outcomes)
    }

    /// Discards every pending request, auditing each as rejected by the operator.
    pub fn discard_pending(&mut self) {
        let pending: Vec<MutationRequest> = self.pending.drain(..).collect();
        for request in pending {
            let outcome = ProposalOutcome::RejectedByUser {
                reason: "discarded from pending queue".to_string(),
            };
            self.record(&request, &outcome, &[]);
        }
    }

    fn record(&mut self, request: &MutationRequest, outcome: &ProposalOutcome, notes: &[String]) {
        let classified = outcome.audit_outcome();
        debug!(kind = %request.kind, target = %request.target, outcome = ?classified,
               "proposal recorded");
        self.audit.append(AuditRecord {
            target: request.target.clone(),
            kind: request.kind.clone(),
            outcome: classified,
            reason: request.reason.clone(),
            detail: outcome.reason().unwrap_or("").to_string(),
            risk_notes: notes.to_vec(),
            timestamp: SystemTime::now(),
        });
    }
}

impl Default for MutationPipeline {
    fn default() -> Self {
        Self::new()
    }
}
