//! The behavior-script data model.
//!
//! Everything the rest of the crate computes over lives here: identifiers and their
//! scope classification, decoded routines with their header metadata, and the
//! container exchange type the external reader populates.
//!
//! # Key Types
//! - [`ident::ScriptId`] - 16-bit routine identifier
//! - [`ident::ScopeClass`] - derived global / semi-global / object-local classification
//! - [`Routine`] - one decoded behavior script
//! - [`RoutineFormat`] - versioned record layouts (8- vs 16-byte operand blocks)
//! - [`ScriptContainer`] - all routines of one container file

pub mod ident;

mod container;
mod routine;

pub use container::ScriptContainer;
pub use routine::{Routine, RoutineFormat};
