use rung_program::instr::{CoilDef, CoilMode};

use crate::error::RuntimeError;
use crate::eval::ScanCtx;

/// Out writes the power level every scan. Latch and reset run only on
/// powered scans and write a fixed level: power gates whether the write
/// happens, never which value is written.
pub(super) fn exec_coil(
    ctx: &mut ScanCtx<'_>,
    def: &CoilDef,
    power: bool,
) -> Result<(), RuntimeError> {
    match def.mode {
        CoilMode::Out => ctx.write_bool(&def.target, power),
        CoilMode::Latch => {
            if power {
                ctx.write_bool(&def.target, true)?;
            }
            Ok(())
        }
        CoilMode::Reset => {
            if power {
                ctx.write_bool(&def.target, false)?;
            }
            Ok(())
        }
    }
}
