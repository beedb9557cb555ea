use rung_program::instr::{CounterDef, CounterKind};
use rung_program::value::Value;

use crate::error::RuntimeError;
use crate::eval::{eval_condition, ScanCtx};

/// Counters are level-triggered: one count per evaluated scan while powered.
/// Edge counting is composed with a rising-edge condition upstream. The
/// count saturates at the register extremes.
pub(super) fn exec_counter(
    ctx: &mut ScanCtx<'_>,
    def: &CounterDef,
    power: bool,
) -> Result<(), RuntimeError> {
    let setpoint = ctx.operand_i64(&def.setpoint)?;
    let reset_active = match &def.reset {
        Some(reset) => eval_condition(ctx, reset)?,
        None => false,
    };
    let current = i64_to_i32(ctx.read_int(&def.count)?);

    let next = if reset_active {
        match def.kind {
            CounterKind::Up => 0,
            CounterKind::Down => i64_to_i32(setpoint),
        }
    } else if power {
        match def.kind {
            CounterKind::Up => current.saturating_add(1),
            CounterKind::Down => current.saturating_sub(1),
        }
    } else {
        current
    };

    let done = match def.kind {
        CounterKind::Up => i64::from(next) >= setpoint,
        CounterKind::Down => next <= 0,
    };

    ctx.write(&def.count, Value::Int2(next))?;
    ctx.write_bool(&def.done, done)
}

fn i64_to_i32(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
