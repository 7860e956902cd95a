#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]

//! # scriptscope
//!
//! A framework for analyzing, simulating and safely patching the stack-machine
//! behavior scripts embedded in a legacy game's binary data containers. Built in
//! pure Rust, `scriptscope` decodes raw instruction records into a semantically
//! annotated model, statically analyzes control flow without executing any real
//! game logic, and rewires cross-references between routines - all behind a
//! transactional write barrier, because a single malformed rewrite corrupts a
//! container irrecoverably.
//!
//! ## Features
//!
//! - **Typed disassembly** - fixed-size instruction records become annotated
//!   instructions; undocumented opcodes are first-class, queryable data
//! - **Static control-flow analysis** - bounded simulation, reachability, loop
//!   detection and structural findings that never panic on malformed input
//! - **Scope-aware renumbering** - bijective identifier maps, call-site discovery
//!   and rewiring across the global / semi-global / object-local ranges
//! - **Transactional mutation pipeline** - Inspect/Preview/Mutate modes, safety
//!   oracle, validator chain and an append-only audit trail
//!
//! ## Quick Start
//!
//! ```rust
//! use scriptscope::prelude::*;
//!
//! // The external container reader hands over decoded routines.
//! let mut container = ScriptContainer::new("objects.bin");
//! let records = [0x00, 0x00, 0xFF, 0xFF, 0, 0, 0, 0, 0, 0, 0, 0];
//! container.insert_routine(Routine::from_records(
//!     ScriptId::new(0x1000),
//!     RoutineFormat::Compact,
//!     0, 0, 0,
//!     &records,
//! )?)?;
//!
//! // Analyze without executing anything.
//! let report = analyze(container.routine(ScriptId::new(0x1000)).unwrap());
//! assert!(report.loop_pairs.is_empty());
//! # Ok::<(), scriptscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! `scriptscope` is organized into several key modules:
//!
//! - [`script`] - the data model: identifiers, scopes, routines, containers
//! - [`disassembler`] - record decoding and the static opcode reference table
//! - [`analysis`] - bounded simulation, successor graphs, findings
//! - [`patching`] - call-site discovery, remapping plans, scope patchers
//! - [`pipeline`] - the write barrier every mutation goes through
//! - [`prelude`] - curated re-exports of the most common types
//!
//! The dependency order is strict: the disassembler knows nothing of analysis,
//! analysis nothing of patching, and only the pipeline ever mutates a container.
//!
//! ## What this crate does not do
//!
//! Container framing, chunk formats and checksums belong to an external reader
//! and writer; this crate exchanges flat record buffers with them (see
//! [`script::ScriptContainer`]). Real game-logic execution is out of scope by
//! design - the simulator resolves branch classifications, nothing more.
//!
//! ## Error Handling
//!
//! Structural problems in analyzed scripts are *findings*, not errors; policy
//! rejections from the pipeline are typed *outcomes*, not errors. The [`Error`]
//! type covers what remains: malformed record data and API misuse.
//!
//! ```rust
//! use scriptscope::{Error, script::{Routine, RoutineFormat, ident::ScriptId}};
//!
//! match Routine::from_records(ScriptId::new(0x1000), RoutineFormat::Compact, 0, 0, 0, &[1, 2, 3]) {
//!     Ok(_) => unreachable!("three bytes are not a whole record"),
//!     Err(Error::Malformed { message, .. }) => println!("malformed: {message}"),
//!     Err(e) => println!("other error: {e}"),
//! }
//! ```

#[macro_use]
pub(crate) mod error;

pub mod file;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use scriptscope::prelude::*;
///
/// let container = ScriptContainer::new("objects.bin");
/// assert!(container.is_empty());
/// ```
pub mod prelude;

/// Static control-flow analysis: bounded simulation, reachability, loops.
pub mod analysis;

/// Instruction decoding, the opcode reference table and the unknown-opcode census.
pub mod disassembler;

/// Identifier remapping, call-site discovery and scope patchers.
pub mod patching;

/// The mutation pipeline: modes, validation, safety and the audit trail.
pub mod pipeline;

/// The data model: identifiers, scopes, routines and containers.
pub mod script;

/// `scriptscope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is
/// always [`Error`]. Used consistently throughout the crate for all fallible
/// operations.
pub type Result<T> = std::result::Result<T, Error>;

/// `scriptscope` Error type
///
/// The main error type for all operations in this crate. Policy rejections and
/// analysis findings are deliberately *not* errors; see the crate-level docs.
pub use error::Error;

/// Low-level cursor parser over raw instruction-record buffers.
///
/// # Example
///
/// ```rust
/// use scriptscope::Parser;
/// let record = [0x0D, 0x00, 0x01, 0xFD, 0, 0, 0, 0, 0, 0, 0, 0];
/// let mut parser = Parser::new(&record);
/// assert_eq!(parser.read_le::<u16>()?, 0x000D);
/// # Ok::<(), scriptscope::Error>(())
/// ```
pub use file::Parser;
