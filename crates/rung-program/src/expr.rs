//! Value expressions over tags and literals.

#![allow(missing_docs)]

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::BuildError;
use crate::tag::Tag;
use crate::value::{TagType, Value};

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Arithmetic negation.
    Neg,
    /// Bitwise complement.
    BitNot,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    /// Text concatenation; numeric operands render first.
    Concat,
}

/// A pure expression over tag values and literals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Literal value.
    Literal(Value),
    /// Read of a declared tag.
    Tag(SmolStr),
    /// Unary operation.
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// Binary operation.
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    /// Literal expression.
    #[must_use]
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Tag-read expression.
    #[must_use]
    pub fn tag(name: impl Into<SmolStr>) -> Self {
        Self::Tag(name.into())
    }

    /// Unary expression.
    #[must_use]
    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Self::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    /// Binary expression.
    #[must_use]
    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

/// Infer the result type of an expression against the declared tag table.
///
/// Promotion follows register widths: any real operand promotes to real, any
/// 32-bit operand to int2; mixed 16-bit kinds widen to int2.
pub(crate) fn result_type(
    expr: &Expr,
    tags: &IndexMap<SmolStr, Tag>,
) -> Result<TagType, BuildError> {
    match expr {
        Expr::Literal(value) => Ok(value.tag_type()),
        Expr::Tag(name) => tags
            .get(name)
            .map(Tag::tag_type)
            .ok_or_else(|| BuildError::UnknownTag(name.clone())),
        Expr::Unary { op, operand } => {
            let ty = result_type(operand, tags)?;
            match op {
                UnaryOp::Neg => match ty {
                    TagType::Int | TagType::Int2 | TagType::Real => Ok(ty),
                    TagType::Hex => Ok(TagType::Int2),
                    TagType::Bool | TagType::Text => {
                        Err(BuildError::NumericRequired(describe(operand)))
                    }
                },
                UnaryOp::BitNot => match ty {
                    TagType::Int | TagType::Int2 | TagType::Hex => Ok(ty),
                    _ => Err(BuildError::IntegerRequired),
                },
            }
        }
        Expr::Binary { op, left, right } => {
            let lhs = result_type(left, tags)?;
            let rhs = result_type(right, tags)?;
            match op {
                BinaryOp::Concat => {
                    for (side, expr) in [(lhs, left), (rhs, right)] {
                        if side == TagType::Bool {
                            return Err(BuildError::NumericRequired(describe(expr)));
                        }
                    }
                    Ok(TagType::Text)
                }
                BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
                    numeric_promotion(lhs, rhs, left, right)
                }
                BinaryOp::BitAnd
                | BinaryOp::BitOr
                | BinaryOp::BitXor
                | BinaryOp::Shl
                | BinaryOp::Shr => {
                    if lhs == TagType::Real || rhs == TagType::Real {
                        return Err(BuildError::IntegerRequired);
                    }
                    numeric_promotion(lhs, rhs, left, right)
                }
            }
        }
    }
}

fn numeric_promotion(
    lhs: TagType,
    rhs: TagType,
    left: &Expr,
    right: &Expr,
) -> Result<TagType, BuildError> {
    for (side, expr) in [(lhs, left), (rhs, right)] {
        if !side.is_numeric() {
            return Err(BuildError::NumericRequired(describe(expr)));
        }
    }
    if lhs == TagType::Real || rhs == TagType::Real {
        Ok(TagType::Real)
    } else if lhs == rhs {
        Ok(lhs)
    } else {
        Ok(TagType::Int2)
    }
}

fn describe(expr: &Expr) -> SmolStr {
    match expr {
        Expr::Tag(name) => name.clone(),
        Expr::Literal(value) => SmolStr::from(format!("{value:?}")),
        Expr::Unary { .. } | Expr::Binary { .. } => SmolStr::new("expression"),
    }
}
