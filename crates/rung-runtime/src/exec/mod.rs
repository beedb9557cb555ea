//! Instruction execution contracts.
//!
//! Each instruction reads and writes exclusively through the scan context;
//! the runner owns when a rung list runs and what the committed result is.

mod coil;
mod copy;
mod counter;
mod pack;
mod search;
mod shift;
mod timer;

use rung_program::instr::Instruction;
use rung_program::Rung;

use crate::error::RuntimeError;
use crate::eval::{eval_condition, ScanCtx};

/// Control flow produced by an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Control {
    Continue,
    /// Exit the current rung list early.
    Return,
}

/// Execute one rung list: rungs top to bottom, instructions left to right.
///
/// A `Return` instruction ends the list and is consumed here, so a return
/// inside a subroutine exits only that subroutine.
pub(crate) fn run_list(ctx: &mut ScanCtx<'_>, rungs: &[Rung]) -> Result<(), RuntimeError> {
    for rung in rungs {
        let power = eval_condition(ctx, rung.condition())?;
        for instruction in rung.instructions() {
            if power || instruction.always_evaluates() {
                if execute(ctx, instruction, power)? == Control::Return {
                    return Ok(());
                }
            }
        }
    }
    Ok(())
}

pub(crate) fn execute(
    ctx: &mut ScanCtx<'_>,
    instruction: &Instruction,
    power: bool,
) -> Result<Control, RuntimeError> {
    match instruction {
        Instruction::Coil(def) => coil::exec_coil(ctx, def, power)?,
        Instruction::Timer(def) => timer::exec_timer(ctx, def, power)?,
        Instruction::Counter(def) => counter::exec_counter(ctx, def, power)?,
        Instruction::Shift(def) => shift::exec_shift(ctx, def, power)?,
        Instruction::Search(def) => search::exec_search(ctx, def, power)?,
        Instruction::Copy(def) => copy::exec_copy(ctx, def)?,
        Instruction::BlockCopy(def) => copy::exec_block_copy(ctx, def)?,
        Instruction::Fill(def) => copy::exec_fill(ctx, def)?,
        Instruction::Pack(def) => pack::exec_pack(ctx, def)?,
        Instruction::Unpack(def) => pack::exec_unpack(ctx, def)?,
        Instruction::ForLoop(def) => {
            let count = ctx.operand_i64(&def.count)?.max(0);
            for iteration in 0..count {
                if power {
                    ctx.write(
                        &def.index,
                        rung_program::value::Value::Int2(iteration as i32),
                    )?;
                }
                for child in &def.body {
                    if power || child.always_evaluates() {
                        if execute(ctx, child, power)? == Control::Return {
                            return Ok(Control::Return);
                        }
                    }
                }
            }
        }
        Instruction::Call(name) => {
            let rungs = ctx
                .program
                .subroutine(name)
                .ok_or_else(|| RuntimeError::UnknownSubroutine(name.clone()))?;
            run_list(ctx, rungs)?;
        }
        Instruction::Return => return Ok(Control::Return),
    }
    Ok(Control::Continue)
}
