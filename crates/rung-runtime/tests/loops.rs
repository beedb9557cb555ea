mod common;

use rung_program::cond::Condition;
use rung_program::expr::{BinaryOp, Expr};
use rung_program::instr::{Instruction, Operand};
use rung_program::value::{TagType, Value};
use rung_program::ProgramBuilder;

use common::runner_with_clock;

#[test]
fn children_observe_each_others_writes_across_iterations() {
    let mut b = ProgramBuilder::new();
    b.tag("I", TagType::Int2).unwrap();
    b.tag("Sum", TagType::Int2).unwrap();
    let body = b
        .for_loop("I", Operand::literal(3i32), |_| {
            Ok(vec![Instruction::copy(
                Expr::binary(BinaryOp::Add, Expr::tag("Sum"), Expr::tag("I")),
                "Sum",
            )])
        })
        .unwrap();
    b.add_rung(Condition::Always, vec![body]);
    let (mut runner, _clock) = runner_with_clock(b.freeze().unwrap());

    // One scan: Sum accumulates 0 + 1 + 2.
    let state = runner.step().unwrap();
    assert_eq!(state.tag("Sum"), Some(&Value::Int2(3)));
    assert_eq!(state.tag("I"), Some(&Value::Int2(2)));

    // The working state carries across scans too.
    let state = runner.step().unwrap();
    assert_eq!(state.tag("Sum"), Some(&Value::Int2(6)));
}

#[test]
fn count_comes_from_a_tag_and_clamps_at_zero() {
    let mut b = ProgramBuilder::new();
    b.tag("I", TagType::Int2).unwrap();
    b.tag("N", TagType::Int2).unwrap();
    b.tag("Hits", TagType::Int2).unwrap();
    let body = b
        .for_loop("I", Operand::tag("N"), |_| {
            Ok(vec![Instruction::copy(
                Expr::binary(BinaryOp::Add, Expr::tag("Hits"), Expr::literal(1i32)),
                "Hits",
            )])
        })
        .unwrap();
    b.add_rung(Condition::Always, vec![body]);
    let (mut runner, _clock) = runner_with_clock(b.freeze().unwrap());

    runner.patch("N", Value::Int2(-5)).unwrap();
    let state = runner.step().unwrap();
    assert_eq!(state.tag("Hits"), Some(&Value::Int2(0)));

    runner.add_force("N", Value::Int2(4)).unwrap();
    let state = runner.step().unwrap();
    assert_eq!(state.tag("Hits"), Some(&Value::Int2(4)));
}

#[test]
fn unpowered_loops_leave_the_index_and_children_alone() {
    let mut b = ProgramBuilder::new();
    b.tag("Run", TagType::Bool).unwrap();
    b.tag("I", TagType::Int2).unwrap();
    b.tag("Hits", TagType::Int2).unwrap();
    let body = b
        .for_loop("I", Operand::literal(2i32), |_| {
            Ok(vec![Instruction::copy(
                Expr::binary(BinaryOp::Add, Expr::tag("Hits"), Expr::literal(1i32)),
                "Hits",
            )])
        })
        .unwrap();
    b.add_rung(Condition::bit("Run"), vec![body]);
    let (mut runner, _clock) = runner_with_clock(b.freeze().unwrap());

    let state = runner.step().unwrap();
    assert_eq!(state.tag("Hits"), Some(&Value::Int2(0)));
    assert_eq!(state.tag("I"), Some(&Value::Int2(0)));
}
