use rung_program::instr::SearchDef;
use rung_program::value::Value;

use crate::error::RuntimeError;
use crate::eval::{compare_values, EdgeState, ScanCtx};

/// Range search; always evaluates to keep the oneshot edge and the
/// continuous cursor tracked.
///
/// A continuous search resumes one past the last match and, once exhausted,
/// stays exhausted until the result tag is externally written to zero, which
/// restarts it from the beginning.
pub(super) fn exec_search(
    ctx: &mut ScanCtx<'_>,
    def: &SearchDef,
    power: bool,
) -> Result<(), RuntimeError> {
    let prev_power = ctx.prev_flag(def.power_slot);
    ctx.set_flag(def.power_slot, power);
    let fire = if def.oneshot {
        EdgeState::from_levels(prev_power, power).is_rising()
    } else {
        power
    };
    if !fire {
        return Ok(());
    }

    let range = ctx.resolve_range(&def.range)?;
    let names: Vec<_> = range.names().collect();
    let target = ctx.operand_value(&def.target)?;

    let start = if def.continuous {
        if ctx.read_int(&def.result)? == 0 {
            0
        } else {
            usize::try_from(ctx.prev_cursor(def.cursor_slot)).unwrap_or(0)
        }
    } else {
        0
    };

    let mut matched = None;
    for position in start..names.len() {
        let value = ctx.read(&names[position])?.clone();
        if compare_values(def.op, &value, &target)? {
            matched = Some(position);
            break;
        }
    }

    match matched {
        Some(position) => {
            let address = i64::from(range.indices[position]);
            ctx.write(&def.result, Value::Int2(address as i32))?;
            ctx.write_bool(&def.found, true)?;
            if def.continuous {
                ctx.set_cursor(def.cursor_slot, position as i64 + 1);
            }
        }
        None => {
            ctx.write(&def.result, Value::Int2(-1))?;
            ctx.write_bool(&def.found, false)?;
            if def.continuous {
                // Exhausted; parked past the end until externally restarted.
                ctx.set_cursor(def.cursor_slot, names.len() as i64);
            }
        }
    }
    Ok(())
}
