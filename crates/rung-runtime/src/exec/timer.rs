use rung_program::instr::{TimeUnit, TimerDef, TimerKind};
use rung_program::value::Value;

use crate::error::RuntimeError;
use crate::eval::{eval_condition, ScanCtx};

fn unit_nanos(unit: TimeUnit) -> i64 {
    match unit {
        TimeUnit::Millis => 1_000_000,
        TimeUnit::Secs => 1_000_000_000,
        TimeUnit::Mins => 60 * 1_000_000_000,
        TimeUnit::Hours => 3_600 * 1_000_000_000,
        TimeUnit::Days => 86_400 * 1_000_000_000,
    }
}

/// Timers always evaluate; accumulation starts from the committed scratch of
/// the previous scan, so re-evaluation inside one scan cannot double-count
/// the delta.
pub(super) fn exec_timer(
    ctx: &mut ScanCtx<'_>,
    def: &TimerDef,
    power: bool,
) -> Result<(), RuntimeError> {
    let per_unit = unit_nanos(def.unit);
    let setpoint = ctx
        .operand_i64(&def.setpoint)?
        .max(0)
        .saturating_mul(per_unit);
    let base = ctx.prev_nanos(def.accum_slot);
    let delta = ctx.delta.as_nanos();

    let (accum, done) = match def.kind {
        TimerKind::OnDelay => {
            let accum = if power { base.saturating_add(delta) } else { 0 };
            (accum, power && accum >= setpoint)
        }
        TimerKind::OffDelay => {
            let prev_level = ctx.prev_flag(def.level_slot);
            let was_timing = ctx.prev_flag(def.timing_slot);
            ctx.set_flag(def.level_slot, power);
            if power {
                ctx.set_flag(def.timing_slot, false);
                (0, true)
            } else {
                // A falling edge restarts the hold interval.
                let timing = prev_level || was_timing;
                let base = if prev_level { 0 } else { base };
                if timing {
                    let accum = base.saturating_add(delta);
                    let expired = accum >= setpoint;
                    ctx.set_flag(def.timing_slot, !expired);
                    (accum, !expired)
                } else {
                    ctx.set_flag(def.timing_slot, false);
                    (0, false)
                }
            }
        }
        TimerKind::Retentive => {
            let reset_active = match &def.reset {
                Some(reset) => eval_condition(ctx, reset)?,
                None => false,
            };
            let accum = if reset_active {
                0
            } else if power {
                base.saturating_add(delta)
            } else {
                base
            };
            (accum, !reset_active && accum >= setpoint)
        }
    };

    ctx.set_nanos(def.accum_slot, accum);
    ctx.write_bool(&def.done, done)?;
    let ticks = (accum / per_unit).min(i64::from(i32::MAX)) as i32;
    ctx.write(&def.accumulator, Value::Int2(ticks))?;
    Ok(())
}
