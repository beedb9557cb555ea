//! Whole-program validation run by `ProgramBuilder::freeze`.

#![allow(missing_docs)]

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::cond::{CompareOp, Condition};
use crate::error::BuildError;
use crate::expr::result_type;
use crate::instr::{Instruction, Operand, PackKind};
use crate::program::Rung;
use crate::range::{address_name, RangeOperand};
use crate::tag::Tag;
use crate::value::{copy_compatible, TagType};

pub(crate) fn validate(
    tags: &IndexMap<SmolStr, Tag>,
    rungs: &[Rung],
    subroutines: &IndexMap<SmolStr, Vec<Rung>>,
) -> Result<(), BuildError> {
    check_rungs(tags, subroutines, rungs)?;
    for rungs in subroutines.values() {
        check_rungs(tags, subroutines, rungs)?;
    }
    check_call_graph(rungs, subroutines)
}

fn check_rungs(
    tags: &IndexMap<SmolStr, Tag>,
    subroutines: &IndexMap<SmolStr, Vec<Rung>>,
    rungs: &[Rung],
) -> Result<(), BuildError> {
    for rung in rungs {
        check_condition(tags, &rung.condition)?;
        for instruction in &rung.instructions {
            check_instruction(tags, subroutines, instruction, false)?;
        }
    }
    Ok(())
}

fn expect_tag<'a>(tags: &'a IndexMap<SmolStr, Tag>, name: &SmolStr) -> Result<&'a Tag, BuildError> {
    tags.get(name)
        .ok_or_else(|| BuildError::UnknownTag(name.clone()))
}

fn expect_type(
    tags: &IndexMap<SmolStr, Tag>,
    name: &SmolStr,
    expected: TagType,
) -> Result<(), BuildError> {
    let tag = expect_tag(tags, name)?;
    if tag.tag_type() == expected {
        Ok(())
    } else {
        Err(BuildError::WrongType {
            name: name.clone(),
            expected,
            found: tag.tag_type(),
        })
    }
}

fn check_condition(tags: &IndexMap<SmolStr, Tag>, condition: &Condition) -> Result<(), BuildError> {
    match condition {
        Condition::Always | Condition::Never => Ok(()),
        Condition::Bit(name) | Condition::NotBit(name) => {
            let tag = expect_tag(tags, name)?;
            if tag.tag_type() == TagType::Bool {
                Ok(())
            } else {
                Err(BuildError::NotBool(name.clone()))
            }
        }
        Condition::Compare { op, left, right } => {
            let lhs = result_type(left, tags)?;
            let rhs = result_type(right, tags)?;
            if comparable(*op, lhs, rhs) {
                Ok(())
            } else {
                Err(BuildError::CompareMismatch {
                    left: lhs,
                    right: rhs,
                })
            }
        }
        Condition::And(children) | Condition::Or(children) => {
            children.iter().try_for_each(|child| check_condition(tags, child))
        }
        Condition::Not(child) => check_condition(tags, child),
        Condition::Rising { input, .. } | Condition::Falling { input, .. } => {
            check_condition(tags, input)
        }
    }
}

fn comparable(op: CompareOp, left: TagType, right: TagType) -> bool {
    if left.is_numeric() && right.is_numeric() {
        return true;
    }
    match (left, right) {
        (TagType::Text, TagType::Text) => true,
        (TagType::Bool, TagType::Bool) => matches!(op, CompareOp::Eq | CompareOp::Ne),
        _ => false,
    }
}

fn check_operand_numeric(
    tags: &IndexMap<SmolStr, Tag>,
    operand: &Operand,
) -> Result<(), BuildError> {
    match operand {
        Operand::Literal(value) => {
            if value.tag_type().is_numeric() {
                Ok(())
            } else {
                Err(BuildError::NumericRequired(SmolStr::new("literal")))
            }
        }
        Operand::Tag(name) => {
            let tag = expect_tag(tags, name)?;
            if tag.tag_type().is_numeric() {
                Ok(())
            } else {
                Err(BuildError::NumericRequired(name.clone()))
            }
        }
    }
}

/// Bit-oriented ranges must hold only boolean addresses. Indirect bounds can
/// only be checked for numeric bound tags here; membership is validated at
/// resolution.
fn check_range_bits(
    tags: &IndexMap<SmolStr, Tag>,
    range: &RangeOperand,
) -> Result<(), BuildError> {
    match range {
        RangeOperand::Direct(range) => {
            for name in range.names() {
                let tag = expect_tag(tags, &name)?;
                if tag.tag_type() != TagType::Bool {
                    return Err(BuildError::NotBool(name));
                }
            }
            Ok(())
        }
        RangeOperand::Indirect(range) => {
            check_operand_numeric(tags, &Operand::Tag(range.start_tag().clone()))?;
            check_operand_numeric(tags, &Operand::Tag(range.end_tag().clone()))
        }
    }
}

fn check_range_cells(
    tags: &IndexMap<SmolStr, Tag>,
    range: &RangeOperand,
    expected: Option<TagType>,
) -> Result<(), BuildError> {
    match range {
        RangeOperand::Direct(range) => {
            for name in range.names() {
                let tag = expect_tag(tags, &name)?;
                if let Some(expected) = expected {
                    if tag.tag_type() != expected {
                        return Err(BuildError::WrongType {
                            name,
                            expected,
                            found: tag.tag_type(),
                        });
                    }
                }
            }
            Ok(())
        }
        RangeOperand::Indirect(range) => {
            check_operand_numeric(tags, &Operand::Tag(range.start_tag().clone()))?;
            check_operand_numeric(tags, &Operand::Tag(range.end_tag().clone()))
        }
    }
}

#[allow(clippy::too_many_lines)]
fn check_instruction(
    tags: &IndexMap<SmolStr, Tag>,
    subroutines: &IndexMap<SmolStr, Vec<Rung>>,
    instruction: &Instruction,
    in_loop: bool,
) -> Result<(), BuildError> {
    match instruction {
        Instruction::Coil(def) => expect_type(tags, &def.target, TagType::Bool),
        Instruction::Timer(def) => {
            expect_type(tags, &def.done, TagType::Bool)?;
            expect_type(tags, &def.accumulator, TagType::Int2)?;
            check_operand_numeric(tags, &def.setpoint)?;
            if let Some(reset) = &def.reset {
                check_condition(tags, reset)?;
            }
            Ok(())
        }
        Instruction::Counter(def) => {
            expect_type(tags, &def.count, TagType::Int2)?;
            expect_type(tags, &def.done, TagType::Bool)?;
            check_operand_numeric(tags, &def.setpoint)?;
            if let Some(reset) = &def.reset {
                check_condition(tags, reset)?;
            }
            Ok(())
        }
        Instruction::Shift(def) => {
            check_range_bits(tags, &def.range)?;
            check_condition(tags, &def.clock)?;
            check_condition(tags, &def.reset)
        }
        Instruction::Search(def) => {
            expect_type(tags, &def.result, TagType::Int2)?;
            expect_type(tags, &def.found, TagType::Bool)?;
            check_operand_numeric(tags, &def.target)?;
            check_range_cells(tags, &def.range, None)?;
            if let RangeOperand::Direct(range) = &def.range {
                for name in range.names() {
                    let tag = expect_tag(tags, &name)?;
                    if !tag.tag_type().is_numeric() {
                        return Err(BuildError::NumericRequired(name));
                    }
                }
            }
            Ok(())
        }
        Instruction::Copy(def) => {
            let from = result_type(&def.source, tags)?;
            let to = expect_tag(tags, &def.dest)?.tag_type();
            if copy_compatible(from, to) {
                Ok(())
            } else {
                Err(BuildError::IncompatibleCopy { from, to })
            }
        }
        Instruction::BlockCopy(def) => {
            check_range_cells(tags, &def.source, None)?;
            if let RangeOperand::Direct(range) = &def.source {
                for (offset, source_name) in range.names().into_iter().enumerate() {
                    let dest_name = address_name(def.dest.prefix(), def.dest.index() + offset as u32);
                    let from = expect_tag(tags, &source_name)?.tag_type();
                    let to = expect_tag(tags, &dest_name)?.tag_type();
                    if !copy_compatible(from, to) {
                        return Err(BuildError::IncompatibleCopy { from, to });
                    }
                }
            } else {
                expect_tag(tags, &def.dest.name())?;
            }
            Ok(())
        }
        Instruction::Fill(def) => {
            let from = result_type(&def.value, tags)?;
            check_range_cells(tags, &def.dest, None)?;
            if let RangeOperand::Direct(range) = &def.dest {
                for name in range.names() {
                    let to = expect_tag(tags, &name)?.tag_type();
                    if !copy_compatible(from, to) {
                        return Err(BuildError::IncompatibleCopy { from, to });
                    }
                }
            }
            Ok(())
        }
        Instruction::Pack(def) | Instruction::Unpack(def) => match def.kind {
            PackKind::Bits => {
                check_range_bits(tags, &def.range)?;
                let scalar = expect_tag(tags, &def.scalar)?;
                let Some(capacity) = scalar.tag_type().word_bits() else {
                    return Err(BuildError::WrongType {
                        name: def.scalar.clone(),
                        expected: TagType::Hex,
                        found: scalar.tag_type(),
                    });
                };
                if let RangeOperand::Direct(range) = &def.range {
                    if range.len() > capacity as usize {
                        return Err(BuildError::PackWidth {
                            width: range.len(),
                            capacity: capacity as usize,
                        });
                    }
                }
                Ok(())
            }
            PackKind::Text => {
                check_range_cells(tags, &def.range, Some(TagType::Hex))?;
                expect_type(tags, &def.scalar, TagType::Text)
            }
            PackKind::Float => {
                check_range_cells(tags, &def.range, Some(TagType::Hex))?;
                if let RangeOperand::Direct(range) = &def.range {
                    if range.len() != 2 {
                        return Err(BuildError::FloatPackShape(range.len()));
                    }
                }
                expect_type(tags, &def.scalar, TagType::Real)
            }
        },
        Instruction::ForLoop(def) => {
            if in_loop {
                return Err(BuildError::NestedLoop);
            }
            expect_type(tags, &def.index, TagType::Int2)?;
            check_operand_numeric(tags, &def.count)?;
            for child in &def.body {
                check_instruction(tags, subroutines, child, true)?;
            }
            Ok(())
        }
        Instruction::Call(name) => {
            if subroutines.contains_key(name) {
                Ok(())
            } else {
                Err(BuildError::UnknownSubroutine(name.clone()))
            }
        }
        Instruction::Return => Ok(()),
    }
}

/// Subroutine calls must form a DAG: PLC subroutines are not recursive
/// functions.
fn check_call_graph(
    rungs: &[Rung],
    subroutines: &IndexMap<SmolStr, Vec<Rung>>,
) -> Result<(), BuildError> {
    let mut states: FxHashMap<SmolStr, VisitState> = FxHashMap::default();
    for name in collect_calls(rungs) {
        visit(&name, subroutines, &mut states)?;
    }
    for name in subroutines.keys() {
        visit(name, subroutines, &mut states)?;
    }
    Ok(())
}

#[derive(Clone, Copy, PartialEq)]
enum VisitState {
    InProgress,
    Done,
}

fn visit(
    name: &SmolStr,
    subroutines: &IndexMap<SmolStr, Vec<Rung>>,
    states: &mut FxHashMap<SmolStr, VisitState>,
) -> Result<(), BuildError> {
    match states.get(name) {
        Some(VisitState::Done) => return Ok(()),
        Some(VisitState::InProgress) => {
            return Err(BuildError::RecursiveSubroutine(name.clone()));
        }
        None => {}
    }
    states.insert(name.clone(), VisitState::InProgress);
    if let Some(rungs) = subroutines.get(name) {
        for callee in collect_calls(rungs) {
            visit(&callee, subroutines, states)?;
        }
    }
    states.insert(name.clone(), VisitState::Done);
    Ok(())
}

fn collect_calls(rungs: &[Rung]) -> Vec<SmolStr> {
    fn walk(calls: &mut Vec<SmolStr>, instruction: &Instruction) {
        match instruction {
            Instruction::Call(name) => calls.push(name.clone()),
            Instruction::ForLoop(def) => {
                for child in &def.body {
                    walk(calls, child);
                }
            }
            _ => {}
        }
    }

    let mut calls = Vec::new();
    for rung in rungs {
        for instruction in &rung.instructions {
            walk(&mut calls, instruction);
        }
    }
    calls
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{BinaryOp, Expr};

    fn tag_table() -> IndexMap<SmolStr, Tag> {
        let mut tags = IndexMap::new();
        for (name, ty) in [
            ("Run", TagType::Bool),
            ("Count", TagType::Int2),
            ("Label", TagType::Text),
        ] {
            tags.insert(
                SmolStr::new(name),
                Tag::new(SmolStr::new(name), ty, crate::value::Value::zero(ty), false),
            );
        }
        tags
    }

    #[test]
    fn contact_on_word_tag_is_rejected() {
        let tags = tag_table();
        let err = check_condition(&tags, &Condition::bit("Count")).unwrap_err();
        assert_eq!(err, BuildError::NotBool(SmolStr::new("Count")));
    }

    #[test]
    fn compare_text_with_number_is_rejected() {
        let tags = tag_table();
        let condition = Condition::compare(
            crate::cond::CompareOp::Eq,
            Expr::tag("Label"),
            Expr::tag("Count"),
        );
        assert!(matches!(
            check_condition(&tags, &condition),
            Err(BuildError::CompareMismatch { .. })
        ));
    }

    #[test]
    fn concat_of_bool_is_rejected() {
        let tags = tag_table();
        let expr = Expr::binary(BinaryOp::Concat, Expr::tag("Run"), Expr::tag("Label"));
        assert!(matches!(
            result_type(&expr, &tags),
            Err(BuildError::NumericRequired(_))
        ));
    }
}
