//! Monitors, predicate watches, and run control signals.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;

use rung_program::value::Value;

use crate::clock::Duration;
use crate::error::RuntimeError;
use crate::state::SystemState;

/// Callback invoked when a monitored tag changes between two committed
/// states. Receives the committed state and the old and new values; an error
/// propagates out of `step()` uncaught.
pub type MonitorCallback =
    Box<dyn FnMut(&SystemState, &Value, &Value) -> Result<(), RuntimeError> + Send>;

/// Predicate over a committed state.
pub type Predicate = Box<dyn Fn(&SystemState) -> bool + Send>;

/// Handle to a registered monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MonitorHandle(pub(crate) u64);

/// Handle to a registered predicate watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchHandle(pub(crate) u64);

struct MonitorEntry {
    tag: SmolStr,
    enabled: bool,
    callback: MonitorCallback,
}

#[derive(Default)]
pub(crate) struct Monitors {
    entries: IndexMap<u64, MonitorEntry>,
    next: u64,
}

impl Monitors {
    pub fn register(&mut self, tag: SmolStr, callback: MonitorCallback) -> MonitorHandle {
        let id = self.next;
        self.next += 1;
        self.entries.insert(
            id,
            MonitorEntry {
                tag,
                enabled: true,
                callback,
            },
        );
        MonitorHandle(id)
    }

    pub fn set_enabled(&mut self, handle: MonitorHandle, enabled: bool) -> Result<(), RuntimeError> {
        self.entries
            .get_mut(&handle.0)
            .map(|entry| entry.enabled = enabled)
            .ok_or(RuntimeError::UnknownHandle(handle.0))
    }

    pub fn remove(&mut self, handle: MonitorHandle) -> Result<(), RuntimeError> {
        self.entries
            .shift_remove(&handle.0)
            .map(|_| ())
            .ok_or(RuntimeError::UnknownHandle(handle.0))
    }

    /// Invoke each enabled monitor whose tag changed across the commit.
    /// Fail-fast: the first callback error aborts the walk.
    pub fn fire(
        &mut self,
        previous: &SystemState,
        committed: &SystemState,
    ) -> Result<(), RuntimeError> {
        for entry in self.entries.values_mut() {
            if !entry.enabled {
                continue;
            }
            let old = previous.tags.get(&entry.tag);
            let new = committed.tags.get(&entry.tag);
            if let (Some(old), Some(new)) = (old, new) {
                if old != new {
                    (entry.callback)(committed, old, new)?;
                }
            }
        }
        Ok(())
    }
}

pub(crate) enum WatchAction {
    Pause,
    Snapshot(SmolStr),
}

struct WatchEntry {
    predicate: Predicate,
    action: WatchAction,
}

#[derive(Default)]
pub(crate) struct Watches {
    entries: IndexMap<u64, WatchEntry>,
    next: u64,
}

impl Watches {
    pub fn register(&mut self, predicate: Predicate, action: WatchAction) -> WatchHandle {
        let id = self.next;
        self.next += 1;
        self.entries.insert(id, WatchEntry { predicate, action });
        WatchHandle(id)
    }

    pub fn remove(&mut self, handle: WatchHandle) -> Result<(), RuntimeError> {
        self.entries
            .shift_remove(&handle.0)
            .map(|_| ())
            .ok_or(RuntimeError::UnknownHandle(handle.0))
    }

    /// Evaluate every watch against a committed state, queueing pause
    /// requests and recording snapshot labels.
    pub fn fire(
        &mut self,
        state: &SystemState,
        pauses: &mut VecDeque<u64>,
        labels: &mut Vec<LabelMark>,
    ) {
        for entry in self.entries.values() {
            if (entry.predicate)(state) {
                match &entry.action {
                    WatchAction::Pause => pauses.push_back(state.scan),
                    WatchAction::Snapshot(label) => labels.push(LabelMark {
                        label: label.clone(),
                        scan: state.scan,
                        timestamp: state.timestamp,
                    }),
                }
            }
        }
    }
}

/// A labeled snapshot mark recorded by a predicate watch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMark {
    /// Label given at registration.
    pub label: SmolStr,
    /// Scan id the predicate matched on.
    pub scan: u64,
    /// Commit timestamp of that scan.
    pub timestamp: Duration,
}

/// Cooperative stop request for multi-scan drives.
///
/// Cloneable across threads; the runner observes it only at scan boundaries
/// and acknowledges (clears) it when honoring a stop.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    flag: Arc<AtomicBool>,
}

impl StopSignal {
    /// Fresh signal with no pending request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the driving loop to stop at the next scan boundary.
    pub fn request_stop(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether a stop is currently requested.
    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Consume a pending request.
    pub(crate) fn acknowledge(&self) -> bool {
        self.flag.swap(false, Ordering::SeqCst)
    }
}
