//! The closed instruction set.
//!
//! Instructions are a tagged sum type; validation and execution match on the
//! variants exhaustively instead of dispatching on type-name strings.

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::cond::{CompareOp, Condition};
use crate::expr::Expr;
use crate::range::{Address, RangeOperand};
use crate::value::Value;

/// Stable index of one private scratch cell, assigned at build time.
///
/// Scratch keys live in the committed system state next to the tag map, so
/// snapshots are self-describing and replay exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotId(pub u32);

impl SlotId {
    /// Index into the scratch vector.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A static operand: literal or tag reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    Literal(Value),
    Tag(SmolStr),
}

impl Operand {
    /// Literal operand.
    #[must_use]
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Tag-reference operand.
    #[must_use]
    pub fn tag(name: impl Into<SmolStr>) -> Self {
        Self::Tag(name.into())
    }
}

/// Coil write mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoilMode {
    /// Write rung power every scan.
    Out,
    /// Write true on powered scans; never writes false.
    Latch,
    /// Write false on powered scans; never writes true.
    Reset,
}

/// Coil definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoilDef {
    pub mode: CoilMode,
    pub target: SmolStr,
}

/// Timer variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerKind {
    /// Accumulates while powered, clears when power drops.
    OnDelay,
    /// Done while powered; accumulates after power drops and releases at the
    /// setpoint.
    OffDelay,
    /// Accumulates while powered, holds when power drops, clears only on the
    /// explicit reset input.
    Retentive,
}

/// Setpoint time base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeUnit {
    Millis,
    Secs,
    Mins,
    Hours,
    Days,
}

/// Timer definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerDef {
    pub kind: TimerKind,
    /// Done bit, asserted at accumulator >= setpoint.
    pub done: SmolStr,
    /// Int2 tag publishing the accumulator in `unit` ticks.
    pub accumulator: SmolStr,
    pub setpoint: Operand,
    pub unit: TimeUnit,
    /// Reset input for the retentive variant.
    pub reset: Option<Condition>,
    /// Accumulated nanoseconds.
    pub accum_slot: SlotId,
    /// Previous power level (off-delay edge tracking).
    pub level_slot: SlotId,
    /// Off-delay timing-in-progress flag.
    pub timing_slot: SlotId,
}

/// Counter variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CounterKind {
    Up,
    Down,
}

/// Counter definition. Level-triggered: counts once per evaluated scan while
/// powered; compose with a rising-edge condition for edge counting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterDef {
    pub kind: CounterKind,
    /// Int2 count register.
    pub count: SmolStr,
    /// Done bit: count >= setpoint (up) or count <= 0 (down).
    pub done: SmolStr,
    pub setpoint: Operand,
    /// Clears to zero (up) or reloads the setpoint (down).
    pub reset: Option<Condition>,
}

/// Shift register definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftDef {
    pub range: RangeOperand,
    pub clock: Condition,
    pub reset: Condition,
    /// Previous clock level for edge detection.
    pub clock_slot: SlotId,
}

/// Range search definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchDef {
    pub range: RangeOperand,
    pub op: CompareOp,
    pub target: Operand,
    /// Int2 tag receiving the found address index, or -1.
    pub result: SmolStr,
    /// Bool tag asserted on a successful match.
    pub found: SmolStr,
    /// Resume after the last match; result tag written to 0 restarts.
    pub continuous: bool,
    /// Execute only on rising-edge scans of the driving power.
    pub oneshot: bool,
    /// Previous power level for the oneshot edge.
    pub power_slot: SlotId,
    /// Resume position of a continuous search.
    pub cursor_slot: SlotId,
}

/// Copy/calc definition: evaluate an expression into a destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopyDef {
    pub source: Expr,
    pub dest: SmolStr,
    /// Zero-pad width for numeric-to-text rendering.
    pub pad: Option<usize>,
}

/// Block copy definition: positional 1:1 from a range to a destination run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockCopyDef {
    pub source: RangeOperand,
    pub dest: Address,
}

/// Fill definition: one value into every address of a range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillDef {
    pub value: Expr,
    pub dest: RangeOperand,
}

/// Pack shapes; unpack mirrors each positionally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PackKind {
    /// Bool range into one word tag; bit 0 is the first resolved address.
    Bits,
    /// Hex range, two ASCII bytes per word, into a text tag.
    Text,
    /// Exactly two hex words as the IEEE-754 bits of a real; low word first.
    Float,
}

/// Pack/unpack definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackDef {
    pub kind: PackKind,
    pub range: RangeOperand,
    pub scalar: SmolStr,
}

/// Loop container definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForLoopDef {
    /// Int2 tag receiving the iteration index.
    pub index: SmolStr,
    /// Iteration count, clamped to >= 0 at evaluation.
    pub count: Operand,
    pub body: Vec<Instruction>,
}

/// One instruction site on a rung.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    Coil(CoilDef),
    Timer(TimerDef),
    Counter(CounterDef),
    Shift(ShiftDef),
    Search(SearchDef),
    Copy(CopyDef),
    BlockCopy(BlockCopyDef),
    Fill(FillDef),
    Pack(PackDef),
    Unpack(PackDef),
    ForLoop(ForLoopDef),
    /// Execute the named subroutine's rung list in place.
    Call(SmolStr),
    /// Exit the current rung list early.
    Return,
}

impl Instruction {
    /// Whether the instruction executes even on scans where its rung power
    /// is false.
    ///
    /// Required for anything holding edge or reset state that must observe
    /// every scan, and for the out coil which writes the power level itself.
    #[must_use]
    pub fn always_evaluates(&self) -> bool {
        match self {
            Self::Coil(def) => def.mode == CoilMode::Out,
            Self::Timer(_) | Self::Shift(_) | Self::Search(_) => true,
            Self::Counter(def) => def.reset.is_some(),
            Self::ForLoop(def) => def.body.iter().any(Instruction::always_evaluates),
            Self::Copy(_)
            | Self::BlockCopy(_)
            | Self::Fill(_)
            | Self::Pack(_)
            | Self::Unpack(_)
            | Self::Call(_)
            | Self::Return => false,
        }
    }

    /// Out coil on a boolean tag.
    #[must_use]
    pub fn out(target: impl Into<SmolStr>) -> Self {
        Self::Coil(CoilDef {
            mode: CoilMode::Out,
            target: target.into(),
        })
    }

    /// Latch coil on a boolean tag.
    #[must_use]
    pub fn latch(target: impl Into<SmolStr>) -> Self {
        Self::Coil(CoilDef {
            mode: CoilMode::Latch,
            target: target.into(),
        })
    }

    /// Reset coil on a boolean tag.
    #[must_use]
    pub fn reset(target: impl Into<SmolStr>) -> Self {
        Self::Coil(CoilDef {
            mode: CoilMode::Reset,
            target: target.into(),
        })
    }

    /// Copy an expression into a destination tag.
    #[must_use]
    pub fn copy(source: Expr, dest: impl Into<SmolStr>) -> Self {
        Self::Copy(CopyDef {
            source,
            dest: dest.into(),
            pad: None,
        })
    }

    /// Copy with a fixed zero-pad width for numeric-to-text rendering.
    #[must_use]
    pub fn copy_padded(source: Expr, dest: impl Into<SmolStr>, pad: usize) -> Self {
        Self::Copy(CopyDef {
            source,
            dest: dest.into(),
            pad: Some(pad),
        })
    }

    /// Positional block copy.
    #[must_use]
    pub fn block_copy(source: impl Into<RangeOperand>, dest: Address) -> Self {
        Self::BlockCopy(BlockCopyDef {
            source: source.into(),
            dest,
        })
    }

    /// Fill a range from one evaluated value.
    #[must_use]
    pub fn fill(value: Expr, dest: impl Into<RangeOperand>) -> Self {
        Self::Fill(FillDef {
            value,
            dest: dest.into(),
        })
    }

    /// Pack a range into a scalar tag.
    #[must_use]
    pub fn pack(kind: PackKind, range: impl Into<RangeOperand>, scalar: impl Into<SmolStr>) -> Self {
        Self::Pack(PackDef {
            kind,
            range: range.into(),
            scalar: scalar.into(),
        })
    }

    /// Unpack a scalar tag into a range.
    #[must_use]
    pub fn unpack(
        kind: PackKind,
        range: impl Into<RangeOperand>,
        scalar: impl Into<SmolStr>,
    ) -> Self {
        Self::Unpack(PackDef {
            kind,
            range: range.into(),
            scalar: scalar.into(),
        })
    }

    /// Call a named subroutine.
    #[must_use]
    pub fn call(name: impl Into<SmolStr>) -> Self {
        Self::Call(name.into())
    }
}
