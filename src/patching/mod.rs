//! Identifier remapping and cross-reference patching.
//!
//! This module is the editing layer above the mutation pipeline: it locates every
//! call site in a container, plans safe renumberings, and propagates them so that
//! no call-style instruction is left pointing at a stale identifier. Renumbering
//! is purely substitutive at the call-site level - it never reorders a routine's
//! instruction list, so intra-routine branch targets are unaffected.
//!
//! # Key Types
//! - [`CallSite`] - a located call-style instruction and its encoded target
//! - [`Remapper`] / [`IdentifierMap`] - renumbering plans (pure, checked bijections)
//! - [`CallRewirer`] - the one component that rewrites operand bytes, via the pipeline
//! - [`GlobalPatcher`] / [`SemiGlobalPatcher`] / [`ObjectLocalPatcher`] - scope-validating
//!   wrappers, including global-to-local override injection
//!
//! # Workflow
//!
//! ```rust
//! use scriptscope::patching::{ObjectLocalPatcher, Remapper};
//! use scriptscope::pipeline::{MutationPipeline, PipelineMode};
//! use scriptscope::script::{ident::ScopeClass, ScriptContainer};
//!
//! # let mut container = ScriptContainer::new("objects.bin");
//! let selected: Vec<_> = container.ids_in_scope(ScopeClass::ObjectLocal);
//! let map = Remapper::new(0x2000).remap(&container, &selected, None)?;
//!
//! let mut pipeline = MutationPipeline::new();
//! pipeline.set_mode(PipelineMode::Mutate);
//! let report = ObjectLocalPatcher::patch(&mut pipeline, &mut container, &map)?;
//! println!("{} call sites rewired", report.rewire.committed());
//! # Ok::<(), scriptscope::Error>(())
//! ```

mod callsites;
mod patchers;
mod remap;
mod rewire;

pub use callsites::{callers_of, find_call_sites, scan_container, sites_by_callee, CallSite};
pub use patchers::{
    GlobalPatcher, ObjectLocalPatcher, OverrideReport, PatchReport, RenumberOutcome,
    SemiGlobalPatcher,
};
pub use remap::{IdentifierMap, Remapper};
pub use rewire::{CallRewirer, RewireOutcome, RewireReport};
