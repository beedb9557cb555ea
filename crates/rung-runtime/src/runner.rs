//! The scan-cycle runner.

use std::collections::VecDeque;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tracing::debug;

use rung_program::value::Value;
use rung_program::Program;

use crate::clock::{Clock, Duration, StdClock};
use crate::error::RuntimeError;
use crate::eval::ScanCtx;
use crate::exec;
use crate::history::{History, Playhead};
use crate::monitor::{
    LabelMark, MonitorCallback, MonitorHandle, Monitors, Predicate, StopSignal, WatchAction,
    WatchHandle, Watches,
};
use crate::state::{Scratch, SystemState};

/// Runner construction options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunnerOptions {
    /// Retain at most this many committed states; `None` keeps everything.
    pub history_limit: Option<usize>,
}

/// Why a multi-scan drive returned.
#[derive(Debug)]
pub enum RunOutcome {
    /// The predicate held on this committed state.
    Satisfied(Arc<SystemState>),
    /// An external stop request was honored at a scan boundary.
    Stopped(Arc<SystemState>),
    /// A pause watch fired; the request is consumed.
    Paused {
        /// Tip state when the loop stopped advancing.
        state: Arc<SystemState>,
        /// Scan id on which the pause predicate matched.
        requested_at: u64,
    },
}

/// Drives repeated scan cycles over one immutable [`Program`].
///
/// Each `step()` runs the fixed pipeline: read, patch, force, logic, force
/// again, commit. A scan is atomic to outside observers; forces, patches,
/// monitors, and watches are owned by this runner alone and never shared
/// with forks.
pub struct Runner {
    program: Arc<Program>,
    clock: Arc<dyn Clock>,
    options: RunnerOptions,
    current: Arc<SystemState>,
    history: History,
    forces: IndexMap<SmolStr, Value>,
    patches: IndexMap<SmolStr, Value>,
    monitors: Monitors,
    watches: Watches,
    pause_pending: VecDeque<u64>,
    labels: Vec<LabelMark>,
    playhead: Playhead,
    stop: StopSignal,
}

impl core::fmt::Debug for Runner {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Runner")
            .field("program", &self.program)
            .field("clock", &"<dyn Clock>")
            .field("options", &self.options)
            .field("current", &self.current)
            .field("history", &self.history)
            .field("forces", &self.forces)
            .field("patches", &self.patches)
            .field("monitors", &"<Monitors>")
            .field("watches", &"<Watches>")
            .field("pause_pending", &self.pause_pending)
            .field("labels", &self.labels)
            .field("playhead", &self.playhead)
            .field("stop", &self.stop)
            .finish()
    }
}

impl Runner {
    /// Runner over a program with all tags at their declared defaults.
    #[must_use]
    pub fn new(program: Arc<Program>, clock: Arc<dyn Clock>, options: RunnerOptions) -> Self {
        let tags = program
            .tags()
            .iter()
            .map(|(name, tag)| (name.clone(), tag.default_value().clone()))
            .collect();
        let state = SystemState {
            scan: 0,
            timestamp: clock.now(),
            tags,
            scratch: vec![Scratch::Empty; program.scratch_slots() as usize],
        };
        Self::from_state(program, state, clock, options)
    }

    /// Runner over a program using a wall clock and default options.
    #[must_use]
    pub fn with_defaults(program: Arc<Program>) -> Self {
        Self::new(program, Arc::new(StdClock::new()), RunnerOptions::default())
    }

    /// Seed a runner from a persisted snapshot.
    ///
    /// The snapshot must cover exactly the program's tags with matching
    /// types and carry a scratch vector of the program's slot count;
    /// subsequent behavior then reproduces the original run exactly.
    pub fn seed_from(
        program: Arc<Program>,
        state: SystemState,
        clock: Arc<dyn Clock>,
        options: RunnerOptions,
    ) -> Result<Self, RuntimeError> {
        for (name, tag) in program.tags() {
            match state.tags.get(name) {
                Some(value) if value.tag_type() == tag.tag_type() => {}
                Some(value) => {
                    return Err(RuntimeError::TypeMismatch {
                        tag: name.clone(),
                        expected: tag.tag_type(),
                        found: value.tag_type(),
                    })
                }
                None => {
                    return Err(RuntimeError::SnapshotShape(SmolStr::from(format!(
                        "missing tag '{name}'"
                    ))))
                }
            }
        }
        for name in state.tags.keys() {
            if program.tag(name).is_none() {
                return Err(RuntimeError::SnapshotShape(SmolStr::from(format!(
                    "undeclared tag '{name}'"
                ))));
            }
        }
        if state.scratch.len() != program.scratch_slots() as usize {
            return Err(RuntimeError::SnapshotShape(SmolStr::from(format!(
                "scratch has {} slots, program uses {}",
                state.scratch.len(),
                program.scratch_slots()
            ))));
        }
        Ok(Self::from_state(program, state, clock, options))
    }

    fn from_state(
        program: Arc<Program>,
        state: SystemState,
        clock: Arc<dyn Clock>,
        options: RunnerOptions,
    ) -> Self {
        let current = Arc::new(state);
        let mut history = History::new(options.history_limit);
        history.push(Arc::clone(&current));
        let playhead = Playhead::at(current.scan);
        Self {
            program,
            clock,
            options,
            current,
            history,
            forces: IndexMap::new(),
            patches: IndexMap::new(),
            monitors: Monitors::default(),
            watches: Watches::default(),
            pause_pending: VecDeque::new(),
            labels: Vec::new(),
            playhead,
            stop: StopSignal::new(),
        }
    }

    /// The shared program.
    #[must_use]
    pub fn program(&self) -> &Arc<Program> {
        &self.program
    }

    /// The committed execution tip.
    #[must_use]
    pub fn current_state(&self) -> Arc<SystemState> {
        Arc::clone(&self.current)
    }

    /// Committed scan history.
    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Execute one scan cycle and commit the resulting state.
    ///
    /// Phase order is fixed: read, patch, force, logic, force, commit.
    /// Monitor and watch callbacks run against the committed state; a
    /// callback error propagates to the caller after the commit stands.
    pub fn step(&mut self) -> Result<Arc<SystemState>, RuntimeError> {
        // Read: the committed tip is the baseline for this scan.
        let mut tags = self.current.tags.clone();
        let mut scratch = self.current.scratch.clone();
        let now = self.clock.now();
        let delta = now.saturating_since(self.current.timestamp);

        // Patch: one-shot overrides, consumed here.
        for (name, value) in self.patches.drain(..) {
            tags.insert(name, value);
        }

        // Force, pre-logic: persistent overrides beat patches.
        for (name, value) in &self.forces {
            tags.insert(name.clone(), value.clone());
        }

        // Logic: rungs top to bottom; instructions observe earlier writes
        // and may diverge from forced values mid-scan.
        {
            let mut ctx = ScanCtx {
                program: self.program.as_ref(),
                tags: &mut tags,
                prev_scratch: &self.current.scratch,
                scratch: &mut scratch,
                delta,
            };
            exec::run_list(&mut ctx, self.program.rungs())?;
        }

        // Force, post-logic: the last write before commit.
        for (name, value) in &self.forces {
            tags.insert(name.clone(), value.clone());
        }

        // Commit: edge previous-values finalize with the scratch vector.
        let state = Arc::new(SystemState {
            scan: self.current.scan + 1,
            timestamp: now,
            tags,
            scratch,
        });
        self.history.push(Arc::clone(&state));
        let previous = std::mem::replace(&mut self.current, Arc::clone(&state));

        self.watches
            .fire(&state, &mut self.pause_pending, &mut self.labels);
        self.monitors.fire(&previous, &state)?;
        Ok(state)
    }

    /// Step until the predicate holds on a committed state.
    ///
    /// Stop requests and pending pause requests are honored only at scan
    /// boundaries, before the predicate check. Exhausting the budget without
    /// satisfaction is an error, never silent truncation.
    pub fn run_until(
        &mut self,
        predicate: impl Fn(&SystemState) -> bool,
        max_cycles: u64,
    ) -> Result<RunOutcome, RuntimeError> {
        for _ in 0..max_cycles {
            if self.stop.acknowledge() {
                return Ok(RunOutcome::Stopped(self.current_state()));
            }
            let state = self.step()?;
            if let Some(requested_at) = self.pause_pending.pop_front() {
                return Ok(RunOutcome::Paused {
                    state,
                    requested_at,
                });
            }
            if predicate(&state) {
                return Ok(RunOutcome::Satisfied(state));
            }
        }
        Err(RuntimeError::BudgetExceeded { cycles: max_cycles })
    }

    /// Handle for requesting a stop from another thread.
    #[must_use]
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Consume a queued pause request, if any.
    pub fn take_pause_request(&mut self) -> Option<u64> {
        self.pause_pending.pop_front()
    }

    fn check_override(&self, name: &str, value: &Value) -> Result<SmolStr, RuntimeError> {
        let tag = self
            .program
            .tag(name)
            .ok_or_else(|| RuntimeError::UnknownTag(SmolStr::new(name)))?;
        if tag.is_system() {
            return Err(RuntimeError::SystemTagOverride(tag.name().clone()));
        }
        if value.tag_type() != tag.tag_type() {
            return Err(RuntimeError::TypeMismatch {
                tag: tag.name().clone(),
                expected: tag.tag_type(),
                found: value.tag_type(),
            });
        }
        Ok(tag.name().clone())
    }

    /// Force a tag: the override persists and wins at every commit until
    /// removed.
    pub fn add_force(&mut self, name: &str, value: impl Into<Value>) -> Result<(), RuntimeError> {
        let value = value.into();
        let name = self.check_override(name, &value)?;
        self.forces.insert(name, value);
        Ok(())
    }

    /// Remove one force; returns whether it existed.
    pub fn remove_force(&mut self, name: &str) -> bool {
        self.forces.shift_remove(name).is_some()
    }

    /// Remove every force.
    pub fn clear_forces(&mut self) {
        self.forces.clear();
    }

    /// Currently forced tags.
    #[must_use]
    pub fn forces(&self) -> &IndexMap<SmolStr, Value> {
        &self.forces
    }

    /// Queue a one-shot override, consumed by the next scan only.
    pub fn patch(&mut self, name: &str, value: impl Into<Value>) -> Result<(), RuntimeError> {
        let value = value.into();
        let name = self.check_override(name, &value)?;
        self.patches.insert(name, value);
        Ok(())
    }

    /// Register a change monitor on a tag.
    pub fn monitor(
        &mut self,
        tag: &str,
        callback: MonitorCallback,
    ) -> Result<MonitorHandle, RuntimeError> {
        let tag = self
            .program
            .tag(tag)
            .ok_or_else(|| RuntimeError::UnknownTag(SmolStr::new(tag)))?
            .name()
            .clone();
        Ok(self.monitors.register(tag, callback))
    }

    /// Enable or disable a monitor without removing it.
    pub fn set_monitor_enabled(
        &mut self,
        handle: MonitorHandle,
        enabled: bool,
    ) -> Result<(), RuntimeError> {
        self.monitors.set_enabled(handle, enabled)
    }

    /// Remove a monitor.
    pub fn remove_monitor(&mut self, handle: MonitorHandle) -> Result<(), RuntimeError> {
        self.monitors.remove(handle)
    }

    /// Start registering a predicate watch over committed states.
    pub fn when(&mut self, predicate: impl Fn(&SystemState) -> bool + Send + 'static) -> WhenBuilder<'_> {
        WhenBuilder {
            runner: self,
            predicate: Box::new(predicate),
        }
    }

    /// Remove a predicate watch.
    pub fn remove_watch(&mut self, handle: WatchHandle) -> Result<(), RuntimeError> {
        self.watches.remove(handle)
    }

    /// First snapshot mark recorded under a label.
    #[must_use]
    pub fn find(&self, label: &str) -> Option<&LabelMark> {
        self.labels.iter().find(|mark| mark.label == label)
    }

    /// Every snapshot mark recorded under a label, in commit order.
    #[must_use]
    pub fn find_all(&self, label: &str) -> Vec<&LabelMark> {
        self.labels
            .iter()
            .filter(|mark| mark.label == label)
            .collect()
    }

    /// The playhead cursor.
    #[must_use]
    pub fn playhead(&self) -> Playhead {
        self.playhead
    }

    /// Move the playhead to a scan, clamped to the retained window.
    ///
    /// Never affects where `step()` appends.
    pub fn seek(&mut self, scan: u64) -> Arc<SystemState> {
        let clamped = self.clamp_to_history(scan);
        self.playhead = Playhead::at(clamped);
        self.playhead_state()
    }

    /// Move the playhead back by a duration of committed time, clamped to
    /// the oldest retained entry.
    pub fn rewind(&mut self, by: Duration) -> Arc<SystemState> {
        let from = self.playhead_state();
        let target = Duration::from_nanos(from.timestamp.as_nanos().saturating_sub(by.as_nanos()));
        let mut landing = self.history.first_scan().unwrap_or(from.scan);
        for entry in self.history.iter() {
            if entry.scan > self.playhead.scan() {
                break;
            }
            if entry.timestamp.as_nanos() <= target.as_nanos() {
                landing = entry.scan;
            }
        }
        self.seek(landing)
    }

    /// The committed state under the playhead.
    #[must_use]
    pub fn playhead_state(&self) -> Arc<SystemState> {
        let clamped = self.clamp_to_history(self.playhead.scan());
        self.history
            .at(clamped)
            .unwrap_or_else(|_| self.current_state())
    }

    fn clamp_to_history(&self, scan: u64) -> u64 {
        let first = self.history.first_scan().unwrap_or(self.current.scan);
        let last = self.history.last_scan().unwrap_or(self.current.scan);
        scan.clamp(first, last)
    }

    /// Fork an independent runner from a retained scan.
    ///
    /// The fork receives a deep copy of exactly that snapshot (tags and
    /// scratch), the same program and clock, and otherwise clean mutable
    /// state: no inherited forces, patches, monitors, watches, or labels,
    /// and a history containing only the fork point.
    pub fn fork_from(&self, scan: u64) -> Result<Self, RuntimeError> {
        let seed = self.history.at(scan)?;
        debug!(scan, "forking runner");
        Ok(Self::from_state(
            Arc::clone(&self.program),
            (*seed).clone(),
            Arc::clone(&self.clock),
            self.options.clone(),
        ))
    }
}

/// Registration builder returned by [`Runner::when`].
pub struct WhenBuilder<'a> {
    runner: &'a mut Runner,
    predicate: Predicate,
}

impl WhenBuilder<'_> {
    /// Queue a pause request whenever the predicate matches a commit; the
    /// driving loop honors it at the next scan boundary.
    pub fn pause(self) -> WatchHandle {
        self.runner
            .watches
            .register(self.predicate, WatchAction::Pause)
    }

    /// Record a labeled snapshot mark whenever the predicate matches a
    /// commit.
    pub fn snapshot(self, label: impl Into<SmolStr>) -> WatchHandle {
        self.runner
            .watches
            .register(self.predicate, WatchAction::Snapshot(label.into()))
    }
}
