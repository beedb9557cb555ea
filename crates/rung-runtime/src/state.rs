//! Committed system-state snapshots.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use rung_program::instr::SlotId;
use rung_program::value::Value;

use crate::clock::Duration;

/// One private scratch cell.
///
/// Scratch holds history-dependent instruction internals (previous edge
/// levels, timer accumulators, search cursors) that are not part of the
/// user-visible tag space but are committed alongside it, keyed by the
/// stable slot indices the builder assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Scratch {
    /// Never written.
    #[default]
    Empty,
    /// Previous level of an edge detector.
    Flag(bool),
    /// Accumulated nanoseconds.
    Nanos(i64),
    /// Resume position of a continuous search.
    Cursor(i64),
}

impl Scratch {
    /// Flag view; unset reads as false.
    #[must_use]
    pub fn flag(self) -> bool {
        matches!(self, Self::Flag(true))
    }

    /// Nanosecond view; unset reads as zero.
    #[must_use]
    pub fn nanos(self) -> i64 {
        match self {
            Self::Nanos(value) => value,
            _ => 0,
        }
    }

    /// Cursor view; unset reads as zero.
    #[must_use]
    pub fn cursor(self) -> i64 {
        match self {
            Self::Cursor(value) => value,
            _ => 0,
        }
    }
}

/// The unit of truth for one committed scan.
///
/// Once appended to history a state is never mutated; every transition
/// produces a new one. The serialized layout is the snapshot contract:
/// scan id, timestamp, tag map, scratch vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemState {
    /// Monotonically increasing scan id.
    pub scan: u64,
    /// Commit time from the runner's clock.
    pub timestamp: Duration,
    /// Value of every declared tag.
    pub tags: IndexMap<SmolStr, Value>,
    /// Private instruction memory, indexed by build-time slot.
    pub scratch: Vec<Scratch>,
}

impl SystemState {
    /// Look up a tag value.
    #[must_use]
    pub fn tag(&self, name: &str) -> Option<&Value> {
        self.tags.get(name)
    }

    /// Boolean tag view; absent or non-boolean tags read as false.
    #[must_use]
    pub fn bit(&self, name: &str) -> bool {
        matches!(self.tags.get(name), Some(Value::Bool(true)))
    }

    /// Scratch cell for a slot; out-of-range slots read as empty.
    #[must_use]
    pub fn slot(&self, slot: SlotId) -> Scratch {
        self.scratch.get(slot.index()).copied().unwrap_or_default()
    }
}
