//! Routine identifiers and their scope classification.
//!
//! Every behavior routine is addressed by a 16-bit identifier whose numeric range
//! determines its visibility: shared logic lives in the global and semi-global
//! ranges, per-object logic in the object-local range. Scope is a pure function of
//! the identifier value - it is never stored, always derived.

use std::fmt;

use strum::{Display, EnumCount, EnumIter};

/// Upper bound (inclusive) of the global identifier range.
pub const GLOBAL_MAX: u16 = 0x00FF;
/// Lower bound (inclusive) of the semi-global identifier range.
pub const SEMI_GLOBAL_MIN: u16 = 0x0100;
/// Upper bound (inclusive) of the semi-global identifier range.
pub const SEMI_GLOBAL_MAX: u16 = 0x0FFF;
/// Lower bound (inclusive) of the object-local identifier range.
pub const OBJECT_LOCAL_MIN: u16 = 0x1000;

/// A 16-bit identifier addressing one behavior routine within a container.
///
/// Identifiers are the currency of the cross-reference machinery: call-style
/// instructions encode the callee's `ScriptId` in their operand block, and the
/// remapping layer rewrites those encodings when routines are renumbered.
///
/// # Examples
///
/// ```rust
/// use scriptscope::script::ident::{ScopeClass, ScriptId};
///
/// let id = ScriptId::new(0x1023);
/// assert_eq!(id.value(), 0x1023);
/// assert_eq!(id.scope(), ScopeClass::ObjectLocal);
/// assert_eq!(id.to_string(), "0x1023");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScriptId(pub u16);

impl ScriptId {
    /// Creates a new identifier from a raw 16-bit value
    #[must_use]
    pub fn new(value: u16) -> Self {
        ScriptId(value)
    }

    /// Returns the raw identifier value
    #[must_use]
    pub fn value(&self) -> u16 {
        self.0
    }

    /// Returns the scope this identifier classifies into.
    ///
    /// Classification is total: every 16-bit value maps to exactly one scope.
    #[must_use]
    pub fn scope(&self) -> ScopeClass {
        ScopeClass::classify(*self)
    }
}

impl From<u16> for ScriptId {
    fn from(value: u16) -> Self {
        ScriptId(value)
    }
}

impl From<ScriptId> for u16 {
    fn from(id: ScriptId) -> Self {
        id.0
    }
}

impl fmt::Debug for ScriptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScriptId(0x{:04x}, {})", self.0, self.scope())
    }
}

impl fmt::Display for ScriptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}

/// The three disjoint visibility classes of the 16-bit identifier space.
///
/// | Scope        | Range              | Meaning                                  |
/// |--------------|--------------------|------------------------------------------|
/// | Global       | `0x0000..=0x00FF`  | Shared by every object in the game       |
/// | Semi-global  | `0x0100..=0x0FFF`  | Shared within one object family          |
/// | Object-local | `0x1000..=0xFFFF`  | Private to a single object's container   |
///
/// Classification is pure and stateless; there is no way to persist a scope tag
/// that disagrees with its identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumCount, EnumIter)]
pub enum ScopeClass {
    /// Global range `[0x0000, 0x00FF]`, shared by every object.
    #[strum(serialize = "global")]
    Global,

    /// Semi-global range `[0x0100, 0x0FFF]`, shared within an object family.
    #[strum(serialize = "semi-global")]
    SemiGlobal,

    /// Object-local range `[0x1000, 0xFFFF]`, private to one container.
    #[strum(serialize = "object-local")]
    ObjectLocal,
}

impl ScopeClass {
    /// Classifies an identifier into its scope.
    ///
    /// Total over the entire 16-bit space; never fails.
    #[must_use]
    pub fn classify(id: ScriptId) -> Self {
        match id.value() {
            0x0000..=GLOBAL_MAX => ScopeClass::Global,
            SEMI_GLOBAL_MIN..=SEMI_GLOBAL_MAX => ScopeClass::SemiGlobal,
            _ => ScopeClass::ObjectLocal,
        }
    }

    /// Returns the inclusive bounds of this scope's identifier range.
    #[must_use]
    pub fn bounds(&self) -> (u16, u16) {
        match self {
            ScopeClass::Global => (0x0000, GLOBAL_MAX),
            ScopeClass::SemiGlobal => (SEMI_GLOBAL_MIN, SEMI_GLOBAL_MAX),
            ScopeClass::ObjectLocal => (OBJECT_LOCAL_MIN, u16::MAX),
        }
    }

    /// Returns `true` if `id` falls inside this scope's range.
    #[must_use]
    pub fn contains(&self, id: ScriptId) -> bool {
        ScopeClass::classify(id) == *self
    }
}
