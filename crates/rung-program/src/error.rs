//! Program construction errors.

#![allow(missing_docs)]

use smol_str::SmolStr;
use thiserror::Error;

use crate::value::TagType;

/// Build-time errors raised while declaring tags or freezing a program.
///
/// All construction failures are raised immediately to the caller; nothing
/// is silently coerced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    /// A tag was redeclared with a different type.
    #[error("tag '{name}' already declared as {existing}, requested {requested}")]
    TypeConflict {
        name: SmolStr,
        existing: TagType,
        requested: TagType,
    },

    /// A declared default value does not match the tag type.
    #[error("default for tag '{name}' is {found}, expected {expected}")]
    DefaultMismatch {
        name: SmolStr,
        expected: TagType,
        found: TagType,
    },

    /// An operand references an undeclared tag.
    #[error("unknown tag '{0}'")]
    UnknownTag(SmolStr),

    /// A bit-oriented operand range contains a non-boolean address.
    #[error("address '{0}' is not boolean")]
    NotBool(SmolStr),

    /// A tag has the wrong type for its operand position.
    #[error("tag '{name}' is {found}, expected {expected}")]
    WrongType {
        name: SmolStr,
        expected: TagType,
        found: TagType,
    },

    /// An operand position requires a numeric tag or literal.
    #[error("numeric operand required at '{0}'")]
    NumericRequired(SmolStr),

    /// A bitwise operator was applied to a non-integer operand.
    #[error("bitwise operator requires integer operands")]
    IntegerRequired,

    /// Comparison between incompatible operand types.
    #[error("cannot compare {left} with {right}")]
    CompareMismatch { left: TagType, right: TagType },

    /// Descending bounds on a direct block range.
    #[error("invalid range {prefix}{start}..{prefix}{end}")]
    InvalidRange {
        prefix: SmolStr,
        start: u32,
        end: u32,
    },

    /// Source and destination types are outside the copy table.
    #[error("cannot copy {from} into {to}")]
    IncompatibleCopy { from: TagType, to: TagType },

    /// A pack range exceeds the destination word width.
    #[error("pack range of {width} bits exceeds {capacity}-bit destination")]
    PackWidth { width: usize, capacity: usize },

    /// A float pack operand must be exactly two hex words.
    #[error("float pack requires exactly two hex words, got {0}")]
    FloatPackShape(usize),

    /// A loop body was opened while another loop was being built.
    #[error("loop bodies cannot nest")]
    NestedLoop,

    /// A call references an undefined subroutine.
    #[error("unknown subroutine '{0}'")]
    UnknownSubroutine(SmolStr),

    /// A subroutine name was defined twice.
    #[error("subroutine '{0}' already defined")]
    DuplicateSubroutine(SmolStr),

    /// Subroutine definitions cannot nest.
    #[error("subroutine '{0}' defined inside another subroutine")]
    NestedSubroutine(SmolStr),

    /// The subroutine call graph contains a cycle.
    #[error("subroutine '{0}' calls itself, directly or indirectly")]
    RecursiveSubroutine(SmolStr),
}
