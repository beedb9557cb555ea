use rung_program::cond::Condition;
use rung_program::expr::Expr;
use rung_program::instr::{Instruction, Operand};
use rung_program::value::TagType;
use rung_program::ProgramBuilder;

fn sample_program() -> rung_program::Program {
    let mut b = ProgramBuilder::new();
    b.tag("Run", TagType::Bool).unwrap();
    b.tag("I", TagType::Int2).unwrap();
    b.tag("D", TagType::Int2).unwrap();
    b.subroutine("Init", |b| {
        b.add_rung(
            Condition::Always,
            vec![Instruction::copy(Expr::literal(1i32), "D")],
        );
        Ok(())
    })
    .unwrap();
    b.add_rung(Condition::bit("Run"), vec![Instruction::out("Run")]);
    let body = b
        .for_loop("I", Operand::literal(2i32), |_| {
            Ok(vec![
                Instruction::copy(Expr::tag("I"), "D"),
                Instruction::call("Init"),
            ])
        })
        .unwrap();
    b.add_rung(Condition::Always, vec![body, Instruction::Return]);
    b.freeze().unwrap()
}

#[test]
fn walker_visits_every_site_with_deterministic_locations() {
    let program = sample_program();
    let locations: Vec<String> = program
        .sites()
        .into_iter()
        .map(|site| site.location)
        .collect();
    assert_eq!(
        locations,
        vec![
            "rung[0].instr[0]",
            "rung[1].instr[0]",
            "rung[1].instr[0].body[0]",
            "rung[1].instr[0].body[1]",
            "rung[1].instr[1]",
            "sub[Init].rung[0].instr[0]",
        ]
    );
}

#[test]
fn walks_are_reproducible() {
    let program = sample_program();
    let first: Vec<String> = program.sites().into_iter().map(|s| s.location).collect();
    let second: Vec<String> = program.sites().into_iter().map(|s| s.location).collect();
    assert_eq!(first, second);
}
