//! Append-only scan history and the playhead cursor.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use smol_str::SmolStr;
use tracing::debug;

use rung_program::value::Value;

use crate::error::RuntimeError;
use crate::state::SystemState;

/// Append-only log of committed states, contiguous in scan id.
///
/// With a retention limit, the oldest entries are evicted from the front;
/// an evicted scan id is never revisited.
#[derive(Debug)]
pub struct History {
    entries: VecDeque<Arc<SystemState>>,
    limit: Option<usize>,
}

impl History {
    pub(crate) fn new(limit: Option<usize>) -> Self {
        Self {
            entries: VecDeque::new(),
            // A limit of zero would evict the tip itself.
            limit: limit.map(|limit| limit.max(1)),
        }
    }

    pub(crate) fn push(&mut self, state: Arc<SystemState>) {
        if let Some(limit) = self.limit {
            while self.entries.len() >= limit {
                if let Some(evicted) = self.entries.pop_front() {
                    debug!(scan = evicted.scan, "evicted history entry");
                }
            }
        }
        self.entries.push_back(state);
    }

    /// Retained entry count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oldest retained scan id.
    #[must_use]
    pub fn first_scan(&self) -> Option<u64> {
        self.entries.front().map(|state| state.scan)
    }

    /// Newest retained scan id (the execution tip).
    #[must_use]
    pub fn last_scan(&self) -> Option<u64> {
        self.entries.back().map(|state| state.scan)
    }

    /// Iterate retained entries oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<SystemState>> + '_ {
        self.entries.iter()
    }

    /// Random access by scan id; evicted and future ids are not found.
    pub fn at(&self, scan: u64) -> Result<Arc<SystemState>, RuntimeError> {
        let front = self
            .entries
            .front()
            .ok_or(RuntimeError::HistoryNotFound(scan))?;
        if scan < front.scan {
            return Err(RuntimeError::HistoryNotFound(scan));
        }
        self.entries
            .get((scan - front.scan) as usize)
            .cloned()
            .ok_or(RuntimeError::HistoryNotFound(scan))
    }

    /// Windowed access over `[start, end]`, inclusive; the whole window must
    /// be retained.
    pub fn range(&self, start: u64, end: u64) -> Result<Vec<Arc<SystemState>>, RuntimeError> {
        if end < start {
            return Err(RuntimeError::HistoryNotFound(end));
        }
        (start..=end).map(|scan| self.at(scan)).collect()
    }

    /// The newest `n` entries, oldest first.
    #[must_use]
    pub fn latest(&self, n: usize) -> Vec<Arc<SystemState>> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }

    /// Tag-level difference between two retained scans.
    ///
    /// Only differing tags appear; a tag present in one snapshot and absent
    /// in the other reads as `None` on the absent side. The key set is
    /// sorted, and `diff(a, b)` and `diff(b, a)` share it with swapped
    /// tuples.
    pub fn diff(
        &self,
        a: u64,
        b: u64,
    ) -> Result<BTreeMap<SmolStr, (Option<Value>, Option<Value>)>, RuntimeError> {
        let left = self.at(a)?;
        let right = self.at(b)?;
        Ok(diff_states(&left, &right))
    }
}

pub(crate) fn diff_states(
    left: &SystemState,
    right: &SystemState,
) -> BTreeMap<SmolStr, (Option<Value>, Option<Value>)> {
    let mut diff = BTreeMap::new();
    for (name, value) in &left.tags {
        let other = right.tags.get(name);
        if other != Some(value) {
            diff.insert(name.clone(), (Some(value.clone()), other.cloned()));
        }
    }
    for (name, value) in &right.tags {
        if !left.tags.contains_key(name) {
            diff.insert(name.clone(), (None, Some(value.clone())));
        }
    }
    diff
}

/// Read-only cursor into history, decoupled from the execution tip.
///
/// Seeking and rewinding move it; `step()` always appends after the tip
/// regardless of where the playhead points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Playhead {
    scan: u64,
}

impl Playhead {
    pub(crate) fn at(scan: u64) -> Self {
        Self { scan }
    }

    /// Scan id the playhead currently points at.
    #[must_use]
    pub fn scan(self) -> u64 {
        self.scan
    }
}
