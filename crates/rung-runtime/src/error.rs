//! Runtime errors.

#![allow(missing_docs)]

use smol_str::SmolStr;
use thiserror::Error;

use rung_program::value::TagType;

/// Errors raised during scan execution, retrieval, and debug control.
///
/// Every variant names the offending tag, address, scan id, or handle so the
/// caller can point at the responsible program element. Nothing in the core
/// retries.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// A tag name does not exist in the program.
    #[error("unknown tag '{0}'")]
    UnknownTag(SmolStr),

    /// A value does not match the tag's declared type.
    #[error("tag '{tag}' is {expected}, got {found}")]
    TypeMismatch {
        tag: SmolStr,
        expected: TagType,
        found: TagType,
    },

    /// A bit-oriented range resolved onto a non-boolean address.
    #[error("address '{0}' is not boolean")]
    NotBool(SmolStr),

    /// A numeric operand resolved onto a non-numeric value.
    #[error("numeric operand required at '{0}'")]
    NumericRequired(SmolStr),

    /// A bitwise operation met a non-integer value.
    #[error("bitwise operator requires integer operands")]
    IntegerRequired,

    /// Comparison between incompatible values.
    #[error("cannot compare {left} with {right}")]
    Uncomparable { left: TagType, right: TagType },

    /// An indirect range resolved to no addresses.
    #[error("range {prefix}{start}..{prefix}{end} resolved empty")]
    EmptyRange {
        prefix: SmolStr,
        start: i64,
        end: i64,
    },

    /// An indirect range bound resolved out of the bank's address space.
    #[error("range bound tag '{tag}' resolved to {value}")]
    InvalidBound { tag: SmolStr, value: i64 },

    /// Integer or float division by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// A dynamic coercion fell outside the copy table.
    #[error("cannot copy {from} into {to}")]
    IncompatibleCopy { from: TagType, to: TagType },

    /// A float pack resolved onto a range that is not two words.
    #[error("float pack requires exactly two hex words, got {0}")]
    PackShape(usize),

    /// A pack range resolved wider than the destination word.
    #[error("pack range of {width} bits exceeds {capacity}-bit destination")]
    PackWidth { width: usize, capacity: usize },

    /// Forcing or patching a system-reserved tag.
    #[error("tag '{0}' is system-reserved and cannot be overridden")]
    SystemTagOverride(SmolStr),

    /// A scan id outside the retained history window.
    #[error("scan {0} is not retained in history")]
    HistoryNotFound(u64),

    /// A monitor or watch handle that was never issued or already removed.
    #[error("unknown handle {0}")]
    UnknownHandle(u64),

    /// `run_until` exhausted its cycle budget without satisfying the
    /// predicate.
    #[error("predicate not satisfied within {cycles} cycles")]
    BudgetExceeded { cycles: u64 },

    /// A monitor callback reported failure; propagated out of `step`.
    #[error("monitor callback failed: {0}")]
    Callback(SmolStr),

    /// A call reached a subroutine the program does not define.
    #[error("unknown subroutine '{0}'")]
    UnknownSubroutine(SmolStr),

    /// A seeded snapshot does not fit the program.
    #[error("snapshot does not fit program: {0}")]
    SnapshotShape(SmolStr),
}
