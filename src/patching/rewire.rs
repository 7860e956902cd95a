//! Call-site rewiring.
//!
//! The rewirer is the only component that changes operand bytes, and it does so
//! exclusively through the mutation pipeline: every matching call site becomes one
//! [`crate::pipeline::MutationRequest`] carrying one diff, so previews, validation
//! and the audit trail see each site individually. One unresolvable element never
//! aborts the batch - it is recorded in the report and the pass continues.

use tracing::debug;

use crate::{
    patching::{callsites::scan_container, CallSite, IdentifierMap},
    pipeline::{
        Diff, FieldEdit, MutationKind, MutationPipeline, MutationRequest, ProposalOutcome,
        RequestTarget,
    },
    script::{ident::ScriptId, ScriptContainer},
    Result,
};

/// One rewired call site and the pipeline's verdict on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewireOutcome {
    /// The call site that was proposed for rewiring.
    pub site: CallSite,
    /// The identifier the site was rewired to.
    pub new_target: ScriptId,
    /// What the pipeline did with the proposal.
    pub outcome: ProposalOutcome,
}

/// The per-site results of one rewiring pass.
#[derive(Debug, Clone, Default)]
pub struct RewireReport {
    /// Every proposed site with its individual outcome, in scan order.
    pub sites: Vec<RewireOutcome>,
    /// Map keys claiming routines the container does not hold.
    pub missing: Vec<ScriptId>,
    /// Call sites whose encoded target was not a key of the map.
    pub untouched: usize,
}

impl RewireReport {
    /// Returns how many sites were actually committed.
    #[must_use]
    pub fn committed(&self) -> usize {
        self.sites
            .iter()
            .filter(|entry| entry.outcome.is_committed())
            .count()
    }
}

/// Rewires every call site whose encoded target is a key of an identifier map.
pub struct CallRewirer;

impl CallRewirer {
    /// Scans the container and proposes one operand rewrite per matching site.
    ///
    /// Map keys without a corresponding routine in the container are reported in
    /// [`RewireReport::missing`] and the pass continues; sites whose targets are
    /// not in the map are counted but untouched.
    ///
    /// # Errors
    /// Propagates only hard commit failures from the pipeline; per-site policy
    /// rejections land in the report.
    pub fn rewire(
        pipeline: &mut MutationPipeline,
        container: &mut ScriptContainer,
        map: &IdentifierMap,
    ) -> Result<RewireReport> {
        let mut report = RewireReport::default();

        for (from, _) in map.iter() {
            if !container.contains(from) {
                debug!(id = %from, container = container.name(), "mapped routine not in container");
                report.missing.push(from);
            }
        }

        // Snapshot the sites before any bytes move.
        let sites = scan_container(container);
        for site in sites {
            let Some(new_target) = map.get(site.target) else {
                report.untouched += 1;
                continue;
            };

            let request = MutationRequest::new(
                MutationKind::CallRetarget,
                RequestTarget {
                    container: container.name().to_string(),
                    routine: site.routine,
                },
                format!("retarget call from {} to {}", site.target, new_target),
            )
            .with_diff(Diff::new(
                format!(
                    "{}.instructions[{}].operands[{}..{}]",
                    site.routine,
                    site.index,
                    site.operand_offset,
                    site.operand_offset + site.width
                ),
                site.target.to_string(),
                new_target.to_string(),
                FieldEdit::OperandBytes {
                    routine: site.routine,
                    index: site.index,
                    offset: site.operand_offset,
                    bytes: new_target.value().to_le_bytes().to_vec(),
                },
            ));

            let outcome = pipeline.propose(request, container)?;
            report.sites.push(RewireOutcome {
                site,
                new_target,
                outcome,
            });
        }

        Ok(report)
    }
}
