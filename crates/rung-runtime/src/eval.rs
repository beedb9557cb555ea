//! Condition and expression evaluation against the working scan state.

#![allow(missing_docs)]

use indexmap::IndexMap;
use smol_str::SmolStr;

use rung_program::cond::{CompareOp, Condition};
use rung_program::expr::{BinaryOp, Expr, UnaryOp};
use rung_program::instr::{Operand, SlotId};
use rung_program::range::{address_name, RangeOperand};
use rung_program::value::{render_text, TagType, Value};
use rung_program::Program;

use crate::clock::Duration;
use crate::error::RuntimeError;
use crate::state::Scratch;

/// Edge detector states derived from `(previous, current)` levels.
///
/// `previous` always comes from the committed scratch of the last scan, so a
/// detector re-evaluated within one scan stays stable and a single physical
/// transition can fire at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeState {
    Low,
    Rising,
    High,
    Falling,
}

impl EdgeState {
    /// Classify a transition between two consecutive scans.
    #[must_use]
    pub fn from_levels(previous: bool, current: bool) -> Self {
        match (previous, current) {
            (false, false) => Self::Low,
            (false, true) => Self::Rising,
            (true, true) => Self::High,
            (true, false) => Self::Falling,
        }
    }

    /// True on the off-to-on scan only.
    #[must_use]
    pub fn is_rising(self) -> bool {
        self == Self::Rising
    }

    /// True on the on-to-off scan only.
    #[must_use]
    pub fn is_falling(self) -> bool {
        self == Self::Falling
    }
}

/// Mutable view of one scan in flight.
///
/// Instructions never touch committed state directly: reads and intended
/// writes go through this context, which applies them to the scan's working
/// copy so later instructions observe earlier writes.
pub(crate) struct ScanCtx<'a> {
    pub program: &'a Program,
    pub tags: &'a mut IndexMap<SmolStr, Value>,
    pub prev_scratch: &'a [Scratch],
    pub scratch: &'a mut [Scratch],
    pub delta: Duration,
}

/// A range operand resolved to concrete addresses in iteration order.
pub(crate) struct ResolvedRange {
    pub prefix: SmolStr,
    pub indices: Vec<u32>,
}

impl ResolvedRange {
    pub fn names(&self) -> impl Iterator<Item = SmolStr> + '_ {
        self.indices
            .iter()
            .map(move |index| address_name(&self.prefix, *index))
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }
}

impl ScanCtx<'_> {
    pub fn read(&self, name: &str) -> Result<&Value, RuntimeError> {
        self.tags
            .get(name)
            .ok_or_else(|| RuntimeError::UnknownTag(SmolStr::new(name)))
    }

    pub fn read_bool(&self, name: &str) -> Result<bool, RuntimeError> {
        match self.read(name)? {
            Value::Bool(value) => Ok(*value),
            other => Err(RuntimeError::TypeMismatch {
                tag: SmolStr::new(name),
                expected: TagType::Bool,
                found: other.tag_type(),
            }),
        }
    }

    pub fn read_int(&self, name: &str) -> Result<i64, RuntimeError> {
        self.read(name)?
            .as_i64()
            .ok_or_else(|| RuntimeError::NumericRequired(SmolStr::new(name)))
    }

    /// Intended write: validated against the declared type, applied to the
    /// working copy.
    pub fn write(&mut self, name: &str, value: Value) -> Result<(), RuntimeError> {
        let declared = self
            .program
            .tag(name)
            .ok_or_else(|| RuntimeError::UnknownTag(SmolStr::new(name)))?
            .tag_type();
        if value.tag_type() != declared {
            return Err(RuntimeError::TypeMismatch {
                tag: SmolStr::new(name),
                expected: declared,
                found: value.tag_type(),
            });
        }
        self.tags.insert(SmolStr::new(name), value);
        Ok(())
    }

    pub fn write_bool(&mut self, name: &str, value: bool) -> Result<(), RuntimeError> {
        self.write(name, Value::Bool(value))
    }

    pub fn prev_flag(&self, slot: SlotId) -> bool {
        self.prev_scratch
            .get(slot.index())
            .copied()
            .unwrap_or_default()
            .flag()
    }

    pub fn prev_nanos(&self, slot: SlotId) -> i64 {
        self.prev_scratch
            .get(slot.index())
            .copied()
            .unwrap_or_default()
            .nanos()
    }

    pub fn prev_cursor(&self, slot: SlotId) -> i64 {
        self.prev_scratch
            .get(slot.index())
            .copied()
            .unwrap_or_default()
            .cursor()
    }

    pub fn set_flag(&mut self, slot: SlotId, value: bool) {
        if let Some(cell) = self.scratch.get_mut(slot.index()) {
            *cell = Scratch::Flag(value);
        }
    }

    pub fn set_nanos(&mut self, slot: SlotId, value: i64) {
        if let Some(cell) = self.scratch.get_mut(slot.index()) {
            *cell = Scratch::Nanos(value);
        }
    }

    pub fn set_cursor(&mut self, slot: SlotId, value: i64) {
        if let Some(cell) = self.scratch.get_mut(slot.index()) {
            *cell = Scratch::Cursor(value);
        }
    }

    pub fn operand_value(&self, operand: &Operand) -> Result<Value, RuntimeError> {
        match operand {
            Operand::Literal(value) => Ok(value.clone()),
            Operand::Tag(name) => self.read(name).cloned(),
        }
    }

    /// Integer view of a numeric operand; reals round.
    pub fn operand_i64(&self, operand: &Operand) -> Result<i64, RuntimeError> {
        let value = self.operand_value(operand)?;
        if let Some(int) = value.as_i64() {
            return Ok(int);
        }
        match value {
            Value::Real(real) => Ok(real.round() as i64),
            other => Err(RuntimeError::NumericRequired(operand_name(
                operand,
                &other,
            ))),
        }
    }

    /// Resolve a range operand to concrete addresses in iteration order.
    ///
    /// Direct ranges were validated at freeze; indirect bounds are read from
    /// their tags here, direction metadata carries over, and an empty result
    /// is an error.
    pub fn resolve_range(&self, range: &RangeOperand) -> Result<ResolvedRange, RuntimeError> {
        match range {
            RangeOperand::Direct(range) => Ok(ResolvedRange {
                prefix: SmolStr::new(range.prefix()),
                indices: range.indices(),
            }),
            RangeOperand::Indirect(range) => {
                let start = self.read_int(range.start_tag())?;
                let end = self.read_int(range.end_tag())?;
                for (tag, bound) in [(range.start_tag(), start), (range.end_tag(), end)] {
                    if bound < 0 || bound > i64::from(u32::MAX) {
                        return Err(RuntimeError::InvalidBound {
                            tag: tag.clone(),
                            value: bound,
                        });
                    }
                }
                if start > end {
                    return Err(RuntimeError::EmptyRange {
                        prefix: SmolStr::new(range.prefix()),
                        start,
                        end,
                    });
                }
                let forward = (start as u32)..=(end as u32);
                let indices: Vec<u32> = if range.is_reversed() {
                    forward.rev().collect()
                } else {
                    forward.collect()
                };
                let resolved = ResolvedRange {
                    prefix: SmolStr::new(range.prefix()),
                    indices,
                };
                for name in resolved.names() {
                    if self.program.tag(&name).is_none() {
                        return Err(RuntimeError::UnknownTag(name));
                    }
                }
                Ok(resolved)
            }
        }
    }

    /// Resolve a bit-oriented range, checking every address is boolean.
    pub fn resolve_bit_range(&self, range: &RangeOperand) -> Result<ResolvedRange, RuntimeError> {
        let resolved = self.resolve_range(range)?;
        for name in resolved.names() {
            match self.program.tag(&name).map(rung_program::tag::Tag::tag_type) {
                Some(TagType::Bool) => {}
                Some(_) => return Err(RuntimeError::NotBool(name)),
                None => return Err(RuntimeError::UnknownTag(name)),
            }
        }
        Ok(resolved)
    }
}

fn operand_name(operand: &Operand, value: &Value) -> SmolStr {
    match operand {
        Operand::Tag(name) => name.clone(),
        Operand::Literal(_) => SmolStr::from(format!("{value:?}")),
    }
}

/// Evaluate a rung or input condition for the current scan.
pub(crate) fn eval_condition(
    ctx: &mut ScanCtx<'_>,
    condition: &Condition,
) -> Result<bool, RuntimeError> {
    match condition {
        Condition::Always => Ok(true),
        Condition::Never => Ok(false),
        Condition::Bit(name) => ctx.read_bool(name),
        Condition::NotBit(name) => Ok(!ctx.read_bool(name)?),
        Condition::Compare { op, left, right } => {
            let lhs = eval_expr(ctx, left)?;
            let rhs = eval_expr(ctx, right)?;
            compare_values(*op, &lhs, &rhs)
        }
        Condition::And(children) => {
            for child in children {
                if !eval_condition(ctx, child)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Condition::Or(children) => {
            for child in children {
                if eval_condition(ctx, child)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Condition::Not(child) => Ok(!eval_condition(ctx, child)?),
        Condition::Rising { input, slot } => {
            let current = eval_condition(ctx, input)?;
            let previous = ctx.prev_flag(*slot);
            ctx.set_flag(*slot, current);
            Ok(EdgeState::from_levels(previous, current).is_rising())
        }
        Condition::Falling { input, slot } => {
            let current = eval_condition(ctx, input)?;
            let previous = ctx.prev_flag(*slot);
            ctx.set_flag(*slot, current);
            Ok(EdgeState::from_levels(previous, current).is_falling())
        }
    }
}

/// Compare two values under an operator.
pub(crate) fn compare_values(
    op: CompareOp,
    left: &Value,
    right: &Value,
) -> Result<bool, RuntimeError> {
    let ordering = match (left, right) {
        (Value::Text(lhs), Value::Text(rhs)) => lhs.cmp(rhs),
        (Value::Bool(lhs), Value::Bool(rhs)) => match op {
            CompareOp::Eq => return Ok(lhs == rhs),
            CompareOp::Ne => return Ok(lhs != rhs),
            _ => {
                return Err(RuntimeError::Uncomparable {
                    left: TagType::Bool,
                    right: TagType::Bool,
                })
            }
        },
        _ => {
            let (Some(lhs), Some(rhs)) = (left.as_f64(), right.as_f64()) else {
                return Err(RuntimeError::Uncomparable {
                    left: left.tag_type(),
                    right: right.tag_type(),
                });
            };
            return Ok(match op {
                CompareOp::Eq => lhs == rhs,
                CompareOp::Ne => lhs != rhs,
                CompareOp::Gt => lhs > rhs,
                CompareOp::Ge => lhs >= rhs,
                CompareOp::Lt => lhs < rhs,
                CompareOp::Le => lhs <= rhs,
            });
        }
    };
    Ok(match op {
        CompareOp::Eq => ordering.is_eq(),
        CompareOp::Ne => ordering.is_ne(),
        CompareOp::Gt => ordering.is_gt(),
        CompareOp::Ge => ordering.is_ge(),
        CompareOp::Lt => ordering.is_lt(),
        CompareOp::Le => ordering.is_le(),
    })
}

/// Evaluate an expression to a value.
///
/// Integer arithmetic wraps at the promoted register width; real arithmetic
/// follows IEEE semantics with explicit division-by-zero errors.
pub(crate) fn eval_expr(ctx: &ScanCtx<'_>, expr: &Expr) -> Result<Value, RuntimeError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Tag(name) => ctx.read(name).cloned(),
        Expr::Unary { op, operand } => {
            let value = eval_expr(ctx, operand)?;
            match op {
                UnaryOp::Neg => match value {
                    Value::Int(v) => Ok(Value::Int(v.wrapping_neg())),
                    Value::Int2(v) => Ok(Value::Int2(v.wrapping_neg())),
                    Value::Real(v) => Ok(Value::Real(-v)),
                    Value::Hex(v) => Ok(Value::Int2(-i32::from(v))),
                    other => Err(RuntimeError::NumericRequired(SmolStr::from(format!(
                        "{other:?}"
                    )))),
                },
                UnaryOp::BitNot => match value {
                    Value::Int(v) => Ok(Value::Int(!v)),
                    Value::Int2(v) => Ok(Value::Int2(!v)),
                    Value::Hex(v) => Ok(Value::Hex(!v)),
                    _ => Err(RuntimeError::IntegerRequired),
                },
            }
        }
        Expr::Binary { op, left, right } => {
            let lhs = eval_expr(ctx, left)?;
            let rhs = eval_expr(ctx, right)?;
            apply_binary(*op, &lhs, &rhs)
        }
    }
}

fn apply_binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    if op == BinaryOp::Concat {
        let mut text = render_text(left, None).to_string();
        text.push_str(&render_text(right, None));
        return Ok(Value::Text(SmolStr::from(text)));
    }

    let real_involved =
        left.tag_type() == TagType::Real || right.tag_type() == TagType::Real;
    if real_involved {
        let (Some(lhs), Some(rhs)) = (left.as_f64(), right.as_f64()) else {
            return Err(RuntimeError::NumericRequired(SmolStr::new("expression")));
        };
        let result = match op {
            BinaryOp::Add => lhs + rhs,
            BinaryOp::Sub => lhs - rhs,
            BinaryOp::Mul => lhs * rhs,
            BinaryOp::Div => {
                if rhs == 0.0 {
                    return Err(RuntimeError::DivisionByZero);
                }
                lhs / rhs
            }
            BinaryOp::Rem => {
                if rhs == 0.0 {
                    return Err(RuntimeError::DivisionByZero);
                }
                lhs % rhs
            }
            _ => return Err(RuntimeError::IntegerRequired),
        };
        return Ok(Value::Real(result));
    }

    let (Some(lhs), Some(rhs)) = (left.as_i64(), right.as_i64()) else {
        return Err(RuntimeError::NumericRequired(SmolStr::new("expression")));
    };
    let result = match op {
        BinaryOp::Add => lhs.wrapping_add(rhs),
        BinaryOp::Sub => lhs.wrapping_sub(rhs),
        BinaryOp::Mul => lhs.wrapping_mul(rhs),
        BinaryOp::Div => {
            if rhs == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            lhs.wrapping_div(rhs)
        }
        BinaryOp::Rem => {
            if rhs == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            lhs.wrapping_rem(rhs)
        }
        BinaryOp::BitAnd => lhs & rhs,
        BinaryOp::BitOr => lhs | rhs,
        BinaryOp::BitXor => lhs ^ rhs,
        BinaryOp::Shl => lhs.wrapping_shl(rhs as u32 & 63),
        BinaryOp::Shr => lhs.wrapping_shr(rhs as u32 & 63),
        BinaryOp::Concat => unreachable!("concat handled above"),
    };
    Ok(store_integer(result, left.tag_type(), right.tag_type()))
}

/// Promote to the wider register of the two operands; mixed 16-bit kinds
/// widen to int2. The result wraps at the chosen width.
fn store_integer(result: i64, lhs: TagType, rhs: TagType) -> Value {
    if lhs == rhs {
        match lhs {
            TagType::Int => Value::Int(result as i16),
            TagType::Hex => Value::Hex(result as u16),
            _ => Value::Int2(result as i32),
        }
    } else {
        Value::Int2(result as i32)
    }
}
