//! Tag value types and copy coercion.

#![allow(missing_docs)]

use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Declared type of a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagType {
    /// Single bit.
    Bool,
    /// 16-bit signed register.
    Int,
    /// 32-bit signed register.
    Int2,
    /// Floating-point register.
    Real,
    /// Character data.
    Text,
    /// 16-bit unsigned word addressed as hex.
    Hex,
}

impl TagType {
    /// Whether values of this type participate in numeric coercion.
    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Int2 | Self::Real | Self::Hex)
    }

    /// Bit width for word-shaped types (pack/unpack capacity).
    #[must_use]
    pub fn word_bits(self) -> Option<u32> {
        match self {
            Self::Int | Self::Hex => Some(16),
            Self::Int2 => Some(32),
            Self::Bool | Self::Real | Self::Text => None,
        }
    }
}

impl fmt::Display for TagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Int2 => "int2",
            Self::Real => "real",
            Self::Text => "text",
            Self::Hex => "hex",
        };
        f.write_str(name)
    }
}

/// Runtime value for one tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Int(i16),
    Int2(i32),
    Real(f64),
    Text(SmolStr),
    Hex(u16),
}

impl Value {
    /// Type-zero default for a tag type.
    #[must_use]
    pub fn zero(ty: TagType) -> Self {
        match ty {
            TagType::Bool => Self::Bool(false),
            TagType::Int => Self::Int(0),
            TagType::Int2 => Self::Int2(0),
            TagType::Real => Self::Real(0.0),
            TagType::Text => Self::Text(SmolStr::default()),
            TagType::Hex => Self::Hex(0),
        }
    }

    /// The tag type this value inhabits.
    #[must_use]
    pub fn tag_type(&self) -> TagType {
        match self {
            Self::Bool(_) => TagType::Bool,
            Self::Int(_) => TagType::Int,
            Self::Int2(_) => TagType::Int2,
            Self::Real(_) => TagType::Real,
            Self::Text(_) => TagType::Text,
            Self::Hex(_) => TagType::Hex,
        }
    }

    /// Integer view of word-shaped values.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(i64::from(*v)),
            Self::Int2(v) => Some(i64::from(*v)),
            Self::Hex(v) => Some(i64::from(*v)),
            Self::Bool(_) | Self::Real(_) | Self::Text(_) => None,
        }
    }

    /// Floating view of any numeric value.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(f64::from(*v)),
            Self::Int2(v) => Some(f64::from(*v)),
            Self::Hex(v) => Some(f64::from(*v)),
            Self::Real(v) => Some(*v),
            Self::Bool(_) | Self::Text(_) => None,
        }
    }

    /// Bit view of boolean values.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i16> for Value {
    fn from(value: i16) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int2(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<u16> for Value {
    fn from(value: u16) -> Self {
        Value::Hex(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(SmolStr::new(value))
    }
}

/// Fixed copy-compatibility table.
///
/// Numeric types inter-coerce, any numeric renders into text, bool and text
/// copy only onto themselves.
#[must_use]
pub fn copy_compatible(from: TagType, to: TagType) -> bool {
    match to {
        TagType::Bool => from == TagType::Bool,
        TagType::Text => from == TagType::Text || from.is_numeric(),
        TagType::Int | TagType::Int2 | TagType::Real | TagType::Hex => from.is_numeric(),
    }
}

/// Coerce a value onto a destination type per the copy table.
///
/// Integer-width changes reinterpret register bits (wraparound); float to
/// integer rounds half away from zero and saturates at the destination
/// bounds. Returns `None` for pairs outside the table.
#[must_use]
pub fn coerce(value: &Value, to: TagType, pad: Option<usize>) -> Option<Value> {
    if !copy_compatible(value.tag_type(), to) {
        return None;
    }
    let coerced = match (value, to) {
        (v, ty) if v.tag_type() == ty => v.clone(),
        (v, TagType::Text) => Value::Text(render_text(v, pad)),
        (Value::Real(v), ty) => real_to_word(*v, ty),
        (v, TagType::Real) => Value::Real(v.as_f64()?),
        (v, TagType::Int) => Value::Int(truncate_i64(v.as_i64()?) as i16),
        (v, TagType::Int2) => Value::Int2(v.as_i64()? as i32),
        (v, TagType::Hex) => Value::Hex(truncate_i64(v.as_i64()?)),
        _ => return None,
    };
    Some(coerced)
}

fn truncate_i64(value: i64) -> u16 {
    (value as u64 & 0xFFFF) as u16
}

fn real_to_word(value: f64, to: TagType) -> Value {
    let rounded = value.round();
    match to {
        TagType::Int => Value::Int(clamp_f64(rounded, f64::from(i16::MIN), f64::from(i16::MAX)) as i16),
        TagType::Int2 => {
            Value::Int2(clamp_f64(rounded, f64::from(i32::MIN), f64::from(i32::MAX)) as i32)
        }
        TagType::Hex => Value::Hex(clamp_f64(rounded, 0.0, f64::from(u16::MAX)) as u16),
        _ => Value::Real(value),
    }
}

fn clamp_f64(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(min, max)
}

/// Render a value as text.
///
/// Without a pad width, numbers render plain (blank-suppressed). A pad width
/// forces zero-fill to exactly that many characters; on negative values the
/// sign consumes one pad position.
#[must_use]
pub fn render_text(value: &Value, pad: Option<usize>) -> SmolStr {
    let rendered = match (value, pad) {
        (Value::Text(v), _) => return v.clone(),
        (Value::Bool(v), _) => return SmolStr::new(if *v { "1" } else { "0" }),
        (Value::Int(v), Some(width)) => format!("{v:0width$}"),
        (Value::Int(v), None) => format!("{v}"),
        (Value::Int2(v), Some(width)) => format!("{v:0width$}"),
        (Value::Int2(v), None) => format!("{v}"),
        (Value::Hex(v), Some(width)) => format!("{v:0width$}"),
        (Value::Hex(v), None) => format!("{v}"),
        (Value::Real(v), Some(width)) => format!("{v:0width$}"),
        (Value::Real(v), None) => format!("{v}"),
    };
    SmolStr::from(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_type_zero() {
        assert_eq!(Value::zero(TagType::Bool), Value::Bool(false));
        assert_eq!(Value::zero(TagType::Int2), Value::Int2(0));
        assert_eq!(Value::zero(TagType::Text), Value::Text(SmolStr::default()));
    }

    #[test]
    fn integer_narrowing_wraps() {
        let wide = Value::Int2(0x0001_8003);
        assert_eq!(coerce(&wide, TagType::Int, None), Some(Value::Int(-32765)));
        assert_eq!(coerce(&wide, TagType::Hex, None), Some(Value::Hex(0x8003)));
    }

    #[test]
    fn real_to_integer_rounds_and_saturates() {
        assert_eq!(
            coerce(&Value::Real(2.5), TagType::Int, None),
            Some(Value::Int(3))
        );
        assert_eq!(
            coerce(&Value::Real(-2.5), TagType::Int, None),
            Some(Value::Int(-3))
        );
        assert_eq!(
            coerce(&Value::Real(1.0e12), TagType::Int2, None),
            Some(Value::Int2(i32::MAX))
        );
    }

    #[test]
    fn zero_pad_counts_the_sign() {
        assert_eq!(render_text(&Value::Int(42), Some(5)), "00042");
        assert_eq!(render_text(&Value::Int(-42), Some(5)), "-0042");
        assert_eq!(render_text(&Value::Int(-42), None), "-42");
    }

    #[test]
    fn bool_never_coerces_to_words() {
        assert_eq!(coerce(&Value::Bool(true), TagType::Int, None), None);
        assert_eq!(coerce(&Value::Text(SmolStr::new("9")), TagType::Int, None), None);
    }
}
