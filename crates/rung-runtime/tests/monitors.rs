mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rung_program::builder::count_up;
use rung_program::cond::Condition;
use rung_program::instr::Operand;
use rung_program::value::{TagType, Value};
use rung_program::{Program, ProgramBuilder};
use rung_runtime::RuntimeError;
use smol_str::SmolStr;

use common::runner_with_clock;

fn program() -> Program {
    let mut b = ProgramBuilder::new();
    b.tag("Run", TagType::Bool).unwrap();
    b.tag("Count", TagType::Int2).unwrap();
    b.tag("Full", TagType::Bool).unwrap();
    b.add_rung(
        Condition::bit("Run"),
        vec![count_up("Count", "Full", Operand::literal(3i32), None)],
    );
    b.freeze().unwrap()
}

#[test]
fn monitors_fire_once_per_commit_only_on_change() {
    let (mut runner, _clock) = runner_with_clock(program());
    let hits = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&hits);
    runner
        .monitor(
            "Count",
            Box::new(move |state, old, new| {
                seen.fetch_add(1, Ordering::SeqCst);
                assert_eq!(state.tag("Count"), Some(new));
                assert_ne!(old, new);
                Ok(())
            }),
        )
        .unwrap();

    // Idle scans: no change, no callbacks.
    runner.step().unwrap();
    runner.step().unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 0);

    runner.add_force("Run", true).unwrap();
    runner.step().unwrap();
    runner.step().unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[test]
fn disabled_monitors_stay_registered_and_resume() {
    let (mut runner, _clock) = runner_with_clock(program());
    let hits = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&hits);
    let handle = runner
        .monitor(
            "Count",
            Box::new(move |_, _, _| {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        )
        .unwrap();
    runner.add_force("Run", true).unwrap();

    runner.set_monitor_enabled(handle, false).unwrap();
    runner.step().unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 0);

    runner.set_monitor_enabled(handle, true).unwrap();
    runner.step().unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    runner.remove_monitor(handle).unwrap();
    runner.step().unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(matches!(
        runner.remove_monitor(handle).unwrap_err(),
        RuntimeError::UnknownHandle(_)
    ));
}

#[test]
fn monitoring_an_unknown_tag_fails() {
    let (mut runner, _clock) = runner_with_clock(program());
    assert!(matches!(
        runner.monitor("Ghost", Box::new(|_, _, _| Ok(()))),
        Err(RuntimeError::UnknownTag(_))
    ));
}

#[test]
fn a_callback_error_propagates_out_of_step_after_the_commit() {
    let (mut runner, _clock) = runner_with_clock(program());
    runner
        .monitor(
            "Count",
            Box::new(|_, _, _| Err(RuntimeError::Callback(SmolStr::new("boom")))),
        )
        .unwrap();
    runner.add_force("Run", true).unwrap();

    let err = runner.step().unwrap_err();
    assert_eq!(err, RuntimeError::Callback(SmolStr::new("boom")));
    // Fail-fast reporting, but the scan itself already committed.
    assert_eq!(runner.current_state().scan, 1);
    assert_eq!(
        runner.current_state().tag("Count"),
        Some(&Value::Int2(1))
    );
}
