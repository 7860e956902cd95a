use thiserror::Error;

use crate::script::ident::{ScopeClass, ScriptId};

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// This enum covers the failure modes of record parsing, routine decoding and the editing
/// layer. Policy rejections from the mutation pipeline are deliberately *not* errors - they
/// are reported through [`crate::pipeline::ProposalOutcome`] - so every variant here represents
/// either malformed input data or a misuse of the API that cannot be expressed as a typed
/// outcome.
///
/// # Error Categories
///
/// ## Record Parsing Errors
/// - [`Error::Malformed`] - Corrupted or structurally invalid record data
/// - [`Error::OutOfBounds`] - Attempted to read beyond buffer boundaries
/// - [`Error::Empty`] - Empty input provided
///
/// ## Editing Errors
/// - [`Error::RoutineNotFound`] - A routine identifier resolved to nothing in its container
/// - [`Error::DuplicateRoutine`] - An insert targeted an identifier that is already taken
/// - [`Error::ScopeMismatch`] - An identifier fell outside the scope a patcher claimed
/// - [`Error::RemapConflict`] - An identifier map stopped being a bijection
///
/// # Examples
///
/// ```rust
/// use scriptscope::{Error, script::{Routine, RoutineFormat, ident::ScriptId}};
///
/// match Routine::from_records(ScriptId::new(0x1000), RoutineFormat::Compact, 0, 0, 0, &[0x02]) {
///     Ok(routine) => println!("decoded {} instructions", routine.len()),
///     Err(Error::Malformed { message, file, line }) => {
///         eprintln!("malformed records: {} ({}:{})", message, file, line);
///     }
///     Err(e) => eprintln!("other error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The record data is damaged and could not be decoded.
    ///
    /// This error indicates that a byte sequence does not conform to the fixed
    /// instruction-record layout of its declared format. The error includes the
    /// source location where the malformation was detected for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing record data.
    ///
    /// This error occurs when trying to read data beyond the end of a record
    /// buffer. It's a safety check to prevent buffer overruns during decoding.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// Provided input was empty.
    ///
    /// This error occurs when an empty buffer is provided where instruction
    /// record data was expected.
    #[error("Provided input was empty")]
    Empty,

    /// File I/O error.
    ///
    /// Wraps standard I/O errors surfaced by callers that feed container data
    /// into the decoding layer.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Generic error for miscellaneous failures.
    ///
    /// Used for errors that don't fit into other categories or for wrapping
    /// collaborator failures with additional context.
    #[error("{0}")]
    Error(String),

    /// A routine identifier did not resolve to a routine in its container.
    ///
    /// Raised by editing operations that require the target routine to exist,
    /// such as applying a committed edit or cloning a routine for an override.
    #[error("No routine with identifier {0} in container")]
    RoutineNotFound(ScriptId),

    /// A routine insert targeted an identifier that is already occupied.
    ///
    /// Identifier collisions are never resolved implicitly; the caller must
    /// renumber through the remapping machinery first.
    #[error("Routine identifier {0} is already present in container")]
    DuplicateRoutine(ScriptId),

    /// An identifier fell outside the scope a patcher claimed for it.
    ///
    /// Scope patchers verify every key of an identifier map against the claimed
    /// scope before any byte is touched; the first offending identifier is
    /// reported here.
    #[error("Identifier {id} is {actual}, expected {expected}")]
    ScopeMismatch {
        /// The offending identifier
        id: ScriptId,
        /// The scope the identifier actually classifies into
        actual: ScopeClass,
        /// The scope the patcher claimed
        expected: ScopeClass,
    },

    /// An identifier map stopped being a bijection onto free destinations.
    ///
    /// Raised when a remapping pass would assign the same destination twice or
    /// run out of identifier space below the 16-bit ceiling.
    #[error("Identifier remapping conflict - {0}")]
    RemapConflict(String),
}
