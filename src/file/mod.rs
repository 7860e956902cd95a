//! Low-level binary reading utilities.
//!
//! Behavior-script containers are framed, checksummed and chunked by an external
//! reader; this crate only ever sees flat byte buffers of instruction records. The
//! types here are the boundary between those buffers and the typed decoding layer:
//!
//! - [`crate::file::parser::Parser`] - bounds-checked cursor over a record buffer
//! - [`crate::file::io::RecordIO`] - little-endian conversion for record primitives

pub mod io;
pub mod parser;

pub use parser::Parser;
