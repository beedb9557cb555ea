use rung_program::instr::ShiftDef;
use rung_program::value::Value;

use crate::error::RuntimeError;
use crate::eval::{eval_condition, EdgeState, ScanCtx};

/// Shift registers always evaluate.
///
/// The clock edge is tracked every scan so a level held across scans cannot
/// fire twice. Reset dominates a simultaneous clock edge: on a reset scan
/// the committed range is all-off, whatever the clock did.
///
/// A rising edge moves every bit one position along the resolved iteration
/// order and inserts `data` (the rung power at evaluation time) at position
/// zero, so a reversed operand flips the physical direction with no other
/// code path.
pub(super) fn exec_shift(
    ctx: &mut ScanCtx<'_>,
    def: &ShiftDef,
    power: bool,
) -> Result<(), RuntimeError> {
    let clock_now = eval_condition(ctx, &def.clock)?;
    let clock_prev = ctx.prev_flag(def.clock_slot);
    ctx.set_flag(def.clock_slot, clock_now);
    let edge = EdgeState::from_levels(clock_prev, clock_now);

    let reset_active = eval_condition(ctx, &def.reset)?;
    let range = ctx.resolve_bit_range(&def.range)?;
    let names: Vec<_> = range.names().collect();

    if reset_active {
        for name in &names {
            ctx.write(name, Value::Bool(false))?;
        }
        return Ok(());
    }

    if edge.is_rising() {
        let bits = names
            .iter()
            .map(|name| ctx.read_bool(name))
            .collect::<Result<Vec<_>, _>>()?;
        for position in (1..names.len()).rev() {
            ctx.write(&names[position], Value::Bool(bits[position - 1]))?;
        }
        if let Some(entry) = names.first() {
            ctx.write(entry, Value::Bool(power))?;
        }
    }
    Ok(())
}
