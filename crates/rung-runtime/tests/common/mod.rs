#![allow(dead_code)]

use std::sync::Arc;

use rung_program::Program;
use rung_runtime::{ManualClock, Runner, RunnerOptions};

/// Runner on a shared manual clock so tests control simulated time.
pub fn runner_with_clock(program: Program) -> (Runner, ManualClock) {
    let clock = ManualClock::new();
    let runner = Runner::new(
        Arc::new(program),
        Arc::new(clock.clone()),
        RunnerOptions::default(),
    );
    (runner, clock)
}

/// Runner with a bounded history on a manual clock.
pub fn runner_with_limit(program: Program, limit: usize) -> (Runner, ManualClock) {
    let clock = ManualClock::new();
    let runner = Runner::new(
        Arc::new(program),
        Arc::new(clock.clone()),
        RunnerOptions {
            history_limit: Some(limit),
        },
    );
    (runner, clock)
}
