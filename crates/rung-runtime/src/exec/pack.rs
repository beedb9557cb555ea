use rung_program::instr::{PackDef, PackKind};
use rung_program::value::{TagType, Value};
use smol_str::SmolStr;

use crate::error::RuntimeError;
use crate::eval::{ResolvedRange, ScanCtx};

/// Pack a range into a scalar tag. Bit 0, character 0, and the low float
/// word all come from the first address in resolved order, so a reversed
/// operand flips the positional layout.
pub(super) fn exec_pack(ctx: &mut ScanCtx<'_>, def: &PackDef) -> Result<(), RuntimeError> {
    match def.kind {
        PackKind::Bits => {
            let range = ctx.resolve_bit_range(&def.range)?;
            let capacity = scalar_capacity(ctx, &def.scalar)?;
            if range.len() > capacity {
                return Err(RuntimeError::PackWidth {
                    width: range.len(),
                    capacity,
                });
            }
            let mut word: u32 = 0;
            for (position, name) in range.names().enumerate() {
                if ctx.read_bool(&name)? {
                    word |= 1 << position;
                }
            }
            write_word(ctx, &def.scalar, word)
        }
        PackKind::Text => {
            let words = read_words(ctx, &def.range)?;
            let mut bytes = Vec::with_capacity(words.len() * 2);
            for word in words {
                bytes.push((word & 0xFF) as u8);
                bytes.push((word >> 8) as u8);
            }
            while bytes.last() == Some(&0) {
                bytes.pop();
            }
            let text = String::from_utf8_lossy(&bytes).into_owned();
            ctx.write(&def.scalar, Value::Text(SmolStr::from(text)))
        }
        PackKind::Float => {
            let words = read_words(ctx, &def.range)?;
            let [low, high] = words.as_slice() else {
                return Err(RuntimeError::PackShape(words.len()));
            };
            let bits = u32::from(*low) | (u32::from(*high) << 16);
            ctx.write(&def.scalar, Value::Real(f64::from(f32::from_bits(bits))))
        }
    }
}

/// Unpack a scalar tag into a range, mirroring the pack layout positionally.
pub(super) fn exec_unpack(ctx: &mut ScanCtx<'_>, def: &PackDef) -> Result<(), RuntimeError> {
    match def.kind {
        PackKind::Bits => {
            let range = ctx.resolve_bit_range(&def.range)?;
            let capacity = scalar_capacity(ctx, &def.scalar)?;
            if range.len() > capacity {
                return Err(RuntimeError::PackWidth {
                    width: range.len(),
                    capacity,
                });
            }
            let word = read_word(ctx, &def.scalar)?;
            let names: Vec<_> = range.names().collect();
            for (position, name) in names.iter().enumerate() {
                ctx.write(name, Value::Bool(word & (1 << position) != 0))?;
            }
            Ok(())
        }
        PackKind::Text => {
            let range = ctx.resolve_range(&def.range)?;
            let text = match ctx.read(&def.scalar)? {
                Value::Text(text) => text.clone(),
                other => {
                    return Err(RuntimeError::TypeMismatch {
                        tag: def.scalar.clone(),
                        expected: TagType::Text,
                        found: other.tag_type(),
                    })
                }
            };
            let bytes = text.as_bytes();
            let names: Vec<_> = range.names().collect();
            for (position, name) in names.iter().enumerate() {
                let low = bytes.get(position * 2).copied().unwrap_or(0);
                let high = bytes.get(position * 2 + 1).copied().unwrap_or(0);
                ctx.write(name, Value::Hex(u16::from(low) | (u16::from(high) << 8)))?;
            }
            Ok(())
        }
        PackKind::Float => {
            let range = ctx.resolve_range(&def.range)?;
            if range.len() != 2 {
                return Err(RuntimeError::PackShape(range.len()));
            }
            let real = match ctx.read(&def.scalar)? {
                Value::Real(real) => *real,
                other => {
                    return Err(RuntimeError::TypeMismatch {
                        tag: def.scalar.clone(),
                        expected: TagType::Real,
                        found: other.tag_type(),
                    })
                }
            };
            let bits = (real as f32).to_bits();
            let names: Vec<_> = range.names().collect();
            ctx.write(&names[0], Value::Hex((bits & 0xFFFF) as u16))?;
            ctx.write(&names[1], Value::Hex((bits >> 16) as u16))?;
            Ok(())
        }
    }
}

fn scalar_capacity(ctx: &ScanCtx<'_>, scalar: &SmolStr) -> Result<usize, RuntimeError> {
    let declared = ctx
        .program
        .tag(scalar)
        .ok_or_else(|| RuntimeError::UnknownTag(scalar.clone()))?
        .tag_type();
    declared
        .word_bits()
        .map(|bits| bits as usize)
        .ok_or(RuntimeError::TypeMismatch {
            tag: scalar.clone(),
            expected: TagType::Hex,
            found: declared,
        })
}

fn read_word(ctx: &ScanCtx<'_>, scalar: &SmolStr) -> Result<u32, RuntimeError> {
    match ctx.read(scalar)? {
        Value::Hex(value) => Ok(u32::from(*value)),
        Value::Int(value) => Ok(u32::from(*value as u16)),
        Value::Int2(value) => Ok(*value as u32),
        other => Err(RuntimeError::NumericRequired(SmolStr::from(format!(
            "{other:?}"
        )))),
    }
}

fn write_word(ctx: &mut ScanCtx<'_>, scalar: &SmolStr, word: u32) -> Result<(), RuntimeError> {
    let declared = ctx
        .program
        .tag(scalar)
        .ok_or_else(|| RuntimeError::UnknownTag(scalar.clone()))?
        .tag_type();
    let value = match declared {
        TagType::Hex => Value::Hex(word as u16),
        TagType::Int => Value::Int(word as u16 as i16),
        TagType::Int2 => Value::Int2(word as i32),
        other => {
            return Err(RuntimeError::TypeMismatch {
                tag: scalar.clone(),
                expected: TagType::Hex,
                found: other,
            })
        }
    };
    ctx.write(scalar, value)
}

fn read_words(ctx: &ScanCtx<'_>, range: &rung_program::range::RangeOperand) -> Result<Vec<u16>, RuntimeError> {
    let resolved: ResolvedRange = ctx.resolve_range(range)?;
    resolved
        .names()
        .map(|name| match ctx.read(&name)? {
            Value::Hex(value) => Ok(*value),
            other => Err(RuntimeError::TypeMismatch {
                tag: name.clone(),
                expected: TagType::Hex,
                found: other.tag_type(),
            }),
        })
        .collect()
}
