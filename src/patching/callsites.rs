//! Call-site discovery.
//!
//! A call site is a located reference: the routine and instruction index of a
//! call-style instruction, the byte offset and width of the operand field holding
//! the target identifier, and the identifier currently encoded there. Call sites
//! are discovered by scanning, never persisted - they describe instructions, they
//! do not own them.
//!
//! Discovery is read-only and visits every instruction of every routine exactly
//! once. Which opcodes count as calls, and where their target field lives, comes
//! from the reference table's [`crate::disassembler::CallLayout`] hints.

use std::collections::BTreeMap;
use std::fmt;

use crate::script::{ident::ScriptId, Routine, ScriptContainer};

/// One located call-style instruction and the identifier it targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    /// The routine containing the call instruction.
    pub routine: ScriptId,
    /// Index of the call instruction within that routine.
    pub index: usize,
    /// Byte offset of the target-identifier field inside the operand block.
    pub operand_offset: usize,
    /// Width of the target-identifier field in bytes.
    pub width: usize,
    /// The identifier currently encoded in that field.
    pub target: ScriptId,
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}] -> {} (operands[{}..{}])",
            self.routine,
            self.index,
            self.target,
            self.operand_offset,
            self.operand_offset + self.width
        )
    }
}

/// Locates every call site in one routine.
#[must_use]
pub fn find_call_sites(routine: &Routine) -> Vec<CallSite> {
    let mut sites = Vec::new();
    for (index, instruction) in routine.instructions().iter().enumerate() {
        let Some(info) = instruction.annotation().info() else {
            continue;
        };
        let Some(layout) = info.call_layout else {
            continue;
        };
        // The target field always fits a documented layout; a failed read would
        // mean the table disagrees with the operand width, so skip the site.
        let Ok(encoded) = instruction.operands.read_u16(layout.target_offset) else {
            continue;
        };
        sites.push(CallSite {
            routine: routine.id(),
            index,
            operand_offset: layout.target_offset,
            width: layout.target_width,
            target: ScriptId::new(encoded),
        });
    }
    sites
}

/// Locates every call site in every routine of a container.
#[must_use]
pub fn scan_container(container: &ScriptContainer) -> Vec<CallSite> {
    let mut sites = Vec::new();
    for routine in container.routines() {
        sites.extend(find_call_sites(routine));
    }
    sites
}

/// Returns every call site targeting `callee`.
#[must_use]
pub fn callers_of(container: &ScriptContainer, callee: ScriptId) -> Vec<CallSite> {
    scan_container(container)
        .into_iter()
        .filter(|site| site.target == callee)
        .collect()
}

/// Groups every call site in the container by its callee identifier.
#[must_use]
pub fn sites_by_callee(container: &ScriptContainer) -> BTreeMap<ScriptId, Vec<CallSite>> {
    let mut grouped: BTreeMap<ScriptId, Vec<CallSite>> = BTreeMap::new();
    for site in scan_container(container) {
        grouped.entry(site.target).or_default().push(site);
    }
    grouped
}
