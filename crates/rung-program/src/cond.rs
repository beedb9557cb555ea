//! Rung conditions.

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::expr::Expr;
use crate::instr::SlotId;

/// Comparison operators for condition contacts and searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

/// A pure boolean condition evaluated against the working scan state.
///
/// Edge variants compare the current level against the previous committed
/// level held in their scratch slot; the new level is finalized at commit so
/// re-evaluation within one scan is stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    /// Constant true (unconditional rung).
    Always,
    /// Constant false.
    Never,
    /// Normally-open contact: true while the tag is on.
    Bit(SmolStr),
    /// Normally-closed contact: true while the tag is off.
    NotBit(SmolStr),
    /// Value comparison between two expressions.
    Compare {
        op: CompareOp,
        left: Expr,
        right: Expr,
    },
    /// All sub-conditions hold.
    And(Vec<Condition>),
    /// Any sub-condition holds.
    Or(Vec<Condition>),
    /// Inverted sub-condition.
    Not(Box<Condition>),
    /// True only on the scan where the input goes off to on.
    Rising { input: Box<Condition>, slot: SlotId },
    /// True only on the scan where the input goes on to off.
    Falling { input: Box<Condition>, slot: SlotId },
}

impl Condition {
    /// Normally-open contact on a boolean tag.
    #[must_use]
    pub fn bit(name: impl Into<SmolStr>) -> Self {
        Self::Bit(name.into())
    }

    /// Normally-closed contact on a boolean tag.
    #[must_use]
    pub fn not_bit(name: impl Into<SmolStr>) -> Self {
        Self::NotBit(name.into())
    }

    /// Conjunction of conditions.
    #[must_use]
    pub fn all(conditions: Vec<Condition>) -> Self {
        Self::And(conditions)
    }

    /// Disjunction of conditions.
    #[must_use]
    pub fn any(conditions: Vec<Condition>) -> Self {
        Self::Or(conditions)
    }

    /// Inverted condition.
    #[must_use]
    pub fn not(condition: Condition) -> Self {
        Self::Not(Box::new(condition))
    }

    /// Comparison contact.
    #[must_use]
    pub fn compare(op: CompareOp, left: Expr, right: Expr) -> Self {
        Self::Compare { op, left, right }
    }
}
