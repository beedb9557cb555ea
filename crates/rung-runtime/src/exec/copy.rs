use rung_program::instr::{BlockCopyDef, CopyDef, FillDef};
use rung_program::range::address_name;
use rung_program::value::{coerce, Value};

use crate::error::RuntimeError;
use crate::eval::{eval_expr, ScanCtx};

fn coerce_into(
    ctx: &mut ScanCtx<'_>,
    value: &Value,
    dest: &str,
    pad: Option<usize>,
) -> Result<(), RuntimeError> {
    let declared = ctx
        .program
        .tag(dest)
        .ok_or_else(|| RuntimeError::UnknownTag(smol_str::SmolStr::new(dest)))?
        .tag_type();
    let coerced = coerce(value, declared, pad).ok_or(RuntimeError::IncompatibleCopy {
        from: value.tag_type(),
        to: declared,
    })?;
    ctx.write(dest, coerced)
}

/// Evaluate the source expression into the destination with type-directed
/// coercion; the pad width forces zero-filled numeric-to-text rendering.
pub(super) fn exec_copy(ctx: &mut ScanCtx<'_>, def: &CopyDef) -> Result<(), RuntimeError> {
    let value = eval_expr(ctx, &def.source)?;
    coerce_into(ctx, &value, &def.dest, def.pad)
}

/// Positional block copy: source address `i` in iteration order lands on
/// destination `start + i`.
pub(super) fn exec_block_copy(
    ctx: &mut ScanCtx<'_>,
    def: &BlockCopyDef,
) -> Result<(), RuntimeError> {
    let range = ctx.resolve_range(&def.source)?;
    let values = range
        .names()
        .map(|name| ctx.read(&name).cloned())
        .collect::<Result<Vec<_>, _>>()?;
    for (offset, value) in values.iter().enumerate() {
        let dest = address_name(def.dest.prefix(), def.dest.index() + offset as u32);
        coerce_into(ctx, value, &dest, None)?;
    }
    Ok(())
}

/// Copy one evaluated value into every address of the destination range.
pub(super) fn exec_fill(ctx: &mut ScanCtx<'_>, def: &FillDef) -> Result<(), RuntimeError> {
    let value = eval_expr(ctx, &def.value)?;
    let range = ctx.resolve_range(&def.dest)?;
    let names: Vec<_> = range.names().collect();
    for name in names {
        coerce_into(ctx, &value, &name, None)?;
    }
    Ok(())
}
