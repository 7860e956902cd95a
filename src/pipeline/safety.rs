//! The safety-level oracle consulted before every proposal.
//!
//! The pipeline treats safety assessment as an opaque policy decision: given a
//! request and the container it targets, a [`SafetyPolicy`] answers acceptable,
//! cautionary (proceed, but record a note) or blocking (reject unconditionally,
//! whatever mode the pipeline is in). Hosts plug in their own policies; the two
//! implementations here cover the common cases.

use crate::{
    pipeline::request::{MutationKind, MutationRequest, RiskLevel},
    script::{ident::ScopeClass, ScriptContainer},
};

/// Risk classification of one proposed mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SafetyLevel {
    /// No concerns; proceed.
    Acceptable,
    /// Proceed, but record the note in the audit trail.
    Cautionary {
        /// The concern to record.
        note: String,
    },
    /// Reject unconditionally, regardless of pipeline mode.
    Blocking {
        /// Why the request is refused.
        reason: String,
    },
}

/// An opaque risk oracle the pipeline consults first on every proposal.
pub trait SafetyPolicy {
    /// Classifies the risk of one request against its target container.
    fn assess(&self, request: &MutationRequest, container: &ScriptContainer) -> SafetyLevel;

    /// Short, stable policy name surfaced in rejection outcomes.
    fn name(&self) -> &'static str;
}

/// The default policy: blocks what the kind table marks immutable, flags
/// high-risk changes and edits to shared-scope routines.
pub struct StandardSafetyPolicy;

impl SafetyPolicy for StandardSafetyPolicy {
    fn assess(&self, request: &MutationRequest, _container: &ScriptContainer) -> SafetyLevel {
        let policy = request.kind.policy();

        if !policy.mutable {
            return SafetyLevel::Blocking {
                reason: format!("mutation kind {} is not mutable", request.kind),
            };
        }

        if matches!(request.kind, MutationKind::RoutineDelete)
            && request.target.routine.scope() != ScopeClass::ObjectLocal
        {
            return SafetyLevel::Blocking {
                reason: format!(
                    "refusing to delete {} routine {}",
                    request.target.routine.scope(),
                    request.target.routine
                ),
            };
        }

        if policy.risk == RiskLevel::High {
            return SafetyLevel::Cautionary {
                note: format!("{} is a high-risk mutation", request.kind),
            };
        }

        if request.target.routine.scope() != ScopeClass::ObjectLocal {
            return SafetyLevel::Cautionary {
                note: format!(
                    "{} targets {} routine {}",
                    request.kind,
                    request.target.routine.scope(),
                    request.target.routine
                ),
            };
        }

        SafetyLevel::Acceptable
    }

    fn name(&self) -> &'static str {
        "Standard Safety Policy"
    }
}

/// Accepts everything. For tests and hosts that run their own oracle upstream.
pub struct PermissiveSafetyPolicy;

impl SafetyPolicy for PermissiveSafetyPolicy {
    fn assess(&self, _request: &MutationRequest, _container: &ScriptContainer) -> SafetyLevel {
        SafetyLevel::Acceptable
    }

    fn name(&self) -> &'static str {
        "Permissive Safety Policy"
    }
}
