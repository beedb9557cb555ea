mod common;

use rung_program::cond::Condition;
use rung_program::instr::Instruction;
use rung_program::value::{TagType, Value};
use rung_program::ProgramBuilder;

use common::runner_with_clock;

fn coil_program() -> rung_program::Program {
    let mut b = ProgramBuilder::new();
    b.tag("Drive", TagType::Bool).unwrap();
    b.tag("Motor", TagType::Bool).unwrap();
    b.tag("Held", TagType::Bool).unwrap();
    b.tag("Clear", TagType::Bool).unwrap();
    b.add_rung(
        Condition::bit("Drive"),
        vec![Instruction::out("Motor"), Instruction::latch("Held")],
    );
    b.add_rung(Condition::bit("Clear"), vec![Instruction::reset("Held")]);
    b.freeze().unwrap()
}

#[test]
fn out_writes_the_power_level_every_scan() {
    let (mut runner, _clock) = runner_with_clock(coil_program());

    runner.add_force("Drive", true).unwrap();
    let state = runner.step().unwrap();
    assert_eq!(state.tag("Motor"), Some(&Value::Bool(true)));

    runner.add_force("Drive", false).unwrap();
    let state = runner.step().unwrap();
    assert_eq!(state.tag("Motor"), Some(&Value::Bool(false)));
}

#[test]
fn latch_holds_after_power_drops() {
    let (mut runner, _clock) = runner_with_clock(coil_program());

    runner.add_force("Drive", true).unwrap();
    runner.step().unwrap();
    runner.add_force("Drive", false).unwrap();
    let state = runner.step().unwrap();
    // Out followed power down; latch held.
    assert_eq!(state.tag("Motor"), Some(&Value::Bool(false)));
    assert_eq!(state.tag("Held"), Some(&Value::Bool(true)));
}

#[test]
fn reset_only_ever_writes_false() {
    let (mut runner, _clock) = runner_with_clock(coil_program());

    runner.add_force("Drive", true).unwrap();
    runner.step().unwrap();
    runner.add_force("Drive", false).unwrap();
    runner.add_force("Clear", true).unwrap();
    let state = runner.step().unwrap();
    assert_eq!(state.tag("Held"), Some(&Value::Bool(false)));

    // Power gates the write; an unpowered reset leaves the tag alone.
    runner.add_force("Clear", false).unwrap();
    runner.add_force("Drive", true).unwrap();
    let state = runner.step().unwrap();
    assert_eq!(state.tag("Held"), Some(&Value::Bool(true)));
}
