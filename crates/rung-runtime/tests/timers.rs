mod common;

use rung_program::cond::Condition;
use rung_program::instr::{Operand, TimeUnit};
use rung_program::value::{TagType, Value};
use rung_program::ProgramBuilder;
use rung_runtime::Duration;

use common::runner_with_clock;

const STEP_MS: i64 = 10;

fn on_delay_program() -> rung_program::Program {
    let mut b = ProgramBuilder::new();
    b.tag("Run", TagType::Bool).unwrap();
    b.tag("Done", TagType::Bool).unwrap();
    b.tag("Acc", TagType::Int2).unwrap();
    let timer = b.on_delay("Done", "Acc", Operand::literal(100i32), TimeUnit::Millis);
    b.add_rung(Condition::bit("Run"), vec![timer]);
    b.freeze().unwrap()
}

#[test]
fn on_delay_asserts_done_at_the_setpoint_not_before() {
    let (mut runner, clock) = runner_with_clock(on_delay_program());
    runner.add_force("Run", true).unwrap();

    for step in 1..=9 {
        clock.advance(Duration::from_millis(STEP_MS));
        let state = runner.step().unwrap();
        assert_eq!(
            state.tag("Done"),
            Some(&Value::Bool(false)),
            "done asserted early at step {step}"
        );
    }
    clock.advance(Duration::from_millis(STEP_MS));
    let state = runner.step().unwrap();
    assert_eq!(state.tag("Done"), Some(&Value::Bool(true)));
    assert_eq!(state.tag("Acc"), Some(&Value::Int2(100)));
}

#[test]
fn on_delay_clears_when_power_drops() {
    let (mut runner, clock) = runner_with_clock(on_delay_program());
    runner.add_force("Run", true).unwrap();
    for _ in 0..12 {
        clock.advance(Duration::from_millis(STEP_MS));
        runner.step().unwrap();
    }
    runner.add_force("Run", false).unwrap();
    clock.advance(Duration::from_millis(STEP_MS));
    let state = runner.step().unwrap();
    assert_eq!(state.tag("Done"), Some(&Value::Bool(false)));
    assert_eq!(state.tag("Acc"), Some(&Value::Int2(0)));
}

#[test]
fn off_delay_holds_done_for_the_setpoint_after_power_drops() {
    let mut b = ProgramBuilder::new();
    b.tag("Run", TagType::Bool).unwrap();
    b.tag("Done", TagType::Bool).unwrap();
    b.tag("Acc", TagType::Int2).unwrap();
    let timer = b.off_delay("Done", "Acc", Operand::literal(30i32), TimeUnit::Millis);
    b.add_rung(Condition::bit("Run"), vec![timer]);
    let (mut runner, clock) = runner_with_clock(b.freeze().unwrap());

    // Before any power the output is off.
    clock.advance(Duration::from_millis(STEP_MS));
    let state = runner.step().unwrap();
    assert_eq!(state.tag("Done"), Some(&Value::Bool(false)));

    runner.add_force("Run", true).unwrap();
    clock.advance(Duration::from_millis(STEP_MS));
    let state = runner.step().unwrap();
    assert_eq!(state.tag("Done"), Some(&Value::Bool(true)));

    runner.add_force("Run", false).unwrap();
    for _ in 0..2 {
        clock.advance(Duration::from_millis(STEP_MS));
        let state = runner.step().unwrap();
        assert_eq!(state.tag("Done"), Some(&Value::Bool(true)));
    }
    clock.advance(Duration::from_millis(STEP_MS));
    let state = runner.step().unwrap();
    assert_eq!(state.tag("Done"), Some(&Value::Bool(false)));
}

#[test]
fn retentive_timer_holds_its_accumulator_and_clears_on_reset() {
    let mut b = ProgramBuilder::new();
    b.tag("Run", TagType::Bool).unwrap();
    b.tag("Rst", TagType::Bool).unwrap();
    b.tag("Done", TagType::Bool).unwrap();
    b.tag("Acc", TagType::Int2).unwrap();
    let timer = b.retentive(
        "Done",
        "Acc",
        Operand::literal(50i32),
        TimeUnit::Millis,
        Condition::bit("Rst"),
    );
    b.add_rung(Condition::bit("Run"), vec![timer]);
    let (mut runner, clock) = runner_with_clock(b.freeze().unwrap());

    runner.add_force("Run", true).unwrap();
    for _ in 0..3 {
        clock.advance(Duration::from_millis(STEP_MS));
        runner.step().unwrap();
    }
    // Power drops: the accumulator holds at 30 ms.
    runner.add_force("Run", false).unwrap();
    clock.advance(Duration::from_millis(STEP_MS));
    let state = runner.step().unwrap();
    assert_eq!(state.tag("Acc"), Some(&Value::Int2(30)));
    assert_eq!(state.tag("Done"), Some(&Value::Bool(false)));

    // Power returns and finishes the interval.
    runner.add_force("Run", true).unwrap();
    for _ in 0..2 {
        clock.advance(Duration::from_millis(STEP_MS));
        runner.step().unwrap();
    }
    let state = runner.current_state();
    assert_eq!(state.tag("Acc"), Some(&Value::Int2(50)));
    assert_eq!(state.tag("Done"), Some(&Value::Bool(true)));

    // Done persists without power; only reset clears it.
    runner.add_force("Run", false).unwrap();
    clock.advance(Duration::from_millis(STEP_MS));
    let state = runner.step().unwrap();
    assert_eq!(state.tag("Done"), Some(&Value::Bool(true)));

    runner.add_force("Rst", true).unwrap();
    clock.advance(Duration::from_millis(STEP_MS));
    let state = runner.step().unwrap();
    assert_eq!(state.tag("Acc"), Some(&Value::Int2(0)));
    assert_eq!(state.tag("Done"), Some(&Value::Bool(false)));
}
