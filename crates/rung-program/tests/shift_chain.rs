use rung_program::cond::Condition;
use rung_program::instr::Instruction;
use rung_program::range::BlockRange;
use rung_program::value::TagType;
use rung_program::ProgramBuilder;

#[test]
fn finished_chain_produces_a_shift_instruction() {
    let mut b = ProgramBuilder::new();
    b.bit_block("C", 1, 5).unwrap();
    b.tag("Clk", TagType::Bool).unwrap();
    b.tag("Rst", TagType::Bool).unwrap();
    let range = BlockRange::new("C", 1, 5).unwrap();
    let shift = b
        .shift(range)
        .clock(Condition::bit("Clk"))
        .reset(Condition::bit("Rst"))
        .finish();
    assert!(matches!(shift, Instruction::Shift(_)));
    b.add_rung(Condition::bit("Clk"), vec![shift]);
    let program = b.freeze().unwrap();
    assert_eq!(program.rungs()[0].instructions().len(), 1);
}

#[test]
fn reset_is_optional() {
    let mut b = ProgramBuilder::new();
    b.bit_block("C", 0, 2).unwrap();
    b.tag("Clk", TagType::Bool).unwrap();
    let range = BlockRange::new("C", 0, 2).unwrap();
    let shift = b.shift(range).clock(Condition::bit("Clk")).finish();
    b.add_rung(Condition::Always, vec![shift]);
    assert!(b.freeze().is_ok());
}

#[test]
fn discarded_chain_adds_no_instruction() {
    let mut b = ProgramBuilder::new();
    b.bit_block("C", 0, 2).unwrap();
    b.tag("Clk", TagType::Bool).unwrap();
    let range = BlockRange::new("C", 0, 2).unwrap();

    // Dropped before clock.
    drop(b.shift(range.clone()));
    // Dropped after clock but before finish.
    drop(b.shift(range).clock(Condition::bit("Clk")));

    b.add_rung(Condition::Always, vec![]);
    let program = b.freeze().unwrap();
    assert!(program.rungs()[0].instructions().is_empty());
}
