mod common;

use rung_program::cond::Condition;
use rung_program::expr::{BinaryOp, Expr};
use rung_program::instr::Instruction;
use rung_program::range::{Address, BlockRange};
use rung_program::value::{TagType, Value};
use rung_program::ProgramBuilder;
use smol_str::SmolStr;

use common::runner_with_clock;

#[test]
fn copy_coerces_along_the_fixed_table() {
    let mut b = ProgramBuilder::new();
    b.tag_with_default("Wide", TagType::Int2, Value::Int2(0x0001_8003))
        .unwrap();
    b.tag("Narrow", TagType::Int).unwrap();
    b.tag("AsHex", TagType::Hex).unwrap();
    b.tag("AsReal", TagType::Real).unwrap();
    b.add_rung(
        Condition::Always,
        vec![
            Instruction::copy(Expr::tag("Wide"), "Narrow"),
            Instruction::copy(Expr::tag("Wide"), "AsHex"),
            Instruction::copy(Expr::tag("Narrow"), "AsReal"),
        ],
    );
    let (mut runner, _clock) = runner_with_clock(b.freeze().unwrap());

    let state = runner.step().unwrap();
    assert_eq!(state.tag("Narrow"), Some(&Value::Int(-32765)));
    assert_eq!(state.tag("AsHex"), Some(&Value::Hex(0x8003)));
    assert_eq!(state.tag("AsReal"), Some(&Value::Real(-32765.0)));
}

#[test]
fn numeric_to_text_renders_with_optional_zero_pad() {
    let mut b = ProgramBuilder::new();
    b.tag_with_default("N", TagType::Int, Value::Int(-42)).unwrap();
    b.tag("Plain", TagType::Text).unwrap();
    b.tag("Padded", TagType::Text).unwrap();
    b.add_rung(
        Condition::Always,
        vec![
            Instruction::copy(Expr::tag("N"), "Plain"),
            Instruction::copy_padded(Expr::tag("N"), "Padded", 5),
        ],
    );
    let (mut runner, _clock) = runner_with_clock(b.freeze().unwrap());

    let state = runner.step().unwrap();
    assert_eq!(state.tag("Plain"), Some(&Value::Text(SmolStr::new("-42"))));
    // The sign consumes one pad position.
    assert_eq!(
        state.tag("Padded"),
        Some(&Value::Text(SmolStr::new("-0042")))
    );
}

#[test]
fn calc_expressions_see_earlier_writes_in_the_same_scan() {
    let mut b = ProgramBuilder::new();
    b.tag("A", TagType::Int2).unwrap();
    b.tag("B", TagType::Int2).unwrap();
    b.add_rung(
        Condition::Always,
        vec![
            Instruction::copy(
                Expr::binary(BinaryOp::Add, Expr::tag("A"), Expr::literal(5i32)),
                "A",
            ),
            Instruction::copy(
                Expr::binary(BinaryOp::Mul, Expr::tag("A"), Expr::literal(2i32)),
                "B",
            ),
        ],
    );
    let (mut runner, _clock) = runner_with_clock(b.freeze().unwrap());

    let state = runner.step().unwrap();
    assert_eq!(state.tag("A"), Some(&Value::Int2(5)));
    assert_eq!(state.tag("B"), Some(&Value::Int2(10)));

    let state = runner.step().unwrap();
    assert_eq!(state.tag("A"), Some(&Value::Int2(10)));
    assert_eq!(state.tag("B"), Some(&Value::Int2(20)));
}

#[test]
fn block_copy_is_positional_over_the_resolved_order() {
    let mut b = ProgramBuilder::new();
    for (index, value) in [1i16, 2, 3].iter().enumerate() {
        b.tag_with_default(format!("D{index}"), TagType::Int, Value::Int(*value))
            .unwrap();
    }
    for index in 0..3 {
        b.tag(format!("E{index}"), TagType::Int).unwrap();
        b.tag(format!("F{index}"), TagType::Int).unwrap();
    }
    let range = BlockRange::new("D", 0, 2).unwrap();
    b.add_rung(
        Condition::Always,
        vec![
            Instruction::block_copy(range.clone(), Address::new("E", 0)),
            Instruction::block_copy(range.reverse(), Address::new("F", 0)),
        ],
    );
    let (mut runner, _clock) = runner_with_clock(b.freeze().unwrap());

    let state = runner.step().unwrap();
    for (index, expected) in [1i16, 2, 3].iter().enumerate() {
        assert_eq!(
            state.tag(&format!("E{index}")),
            Some(&Value::Int(*expected))
        );
    }
    for (index, expected) in [3i16, 2, 1].iter().enumerate() {
        assert_eq!(
            state.tag(&format!("F{index}")),
            Some(&Value::Int(*expected))
        );
    }
}

#[test]
fn fill_writes_one_value_everywhere() {
    let mut b = ProgramBuilder::new();
    for index in 0..4 {
        b.tag(format!("D{index}"), TagType::Int).unwrap();
    }
    let range = BlockRange::new("D", 0, 3).unwrap();
    b.add_rung(
        Condition::Always,
        vec![Instruction::fill(Expr::literal(9i16), range)],
    );
    let (mut runner, _clock) = runner_with_clock(b.freeze().unwrap());

    let state = runner.step().unwrap();
    for index in 0..4 {
        assert_eq!(state.tag(&format!("D{index}")), Some(&Value::Int(9)));
    }
}
