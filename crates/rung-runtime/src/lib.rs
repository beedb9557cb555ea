//! `rung-runtime` - scan-cycle execution engine for ladder-logic programs.
//!
//! Drives [`rung_program::Program`]s through the fixed five-phase scan
//! pipeline, committing one immutable [`SystemState`] per cycle into an
//! append-only [`History`] with playhead, diff, fork, monitor, and
//! predicate-watch debugging primitives on top.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

/// Scan clocks.
pub mod clock;
/// Runtime errors.
pub mod error;
/// Append-only scan history and the playhead cursor.
pub mod history;
/// Monitors, predicate watches, and run control signals.
pub mod monitor;
/// The scan-cycle runner.
pub mod runner;
/// Committed system-state snapshots.
pub mod state;

mod eval;
mod exec;

pub use clock::{Clock, Duration, ManualClock, StdClock};
pub use error::RuntimeError;
pub use eval::EdgeState;
pub use history::{History, Playhead};
pub use monitor::{
    LabelMark, MonitorCallback, MonitorHandle, Predicate, StopSignal, WatchHandle,
};
pub use runner::{RunOutcome, Runner, RunnerOptions, WhenBuilder};
pub use state::{Scratch, SystemState};
