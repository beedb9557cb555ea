//! `rung-program` - ladder-logic program model.
//!
//! Typed tags, directional block ranges, conditions, expressions, the closed
//! instruction set, and the append-only builder that freezes them into an
//! immutable [`Program`]. Execution lives in `rung-runtime`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

/// Append-only program construction.
pub mod builder;
/// Rung conditions.
pub mod cond;
/// Program construction errors.
pub mod error;
/// Value expressions over tags and literals.
pub mod expr;
/// The closed instruction set.
pub mod instr;
/// Frozen programs and the instruction-site walker.
pub mod program;
/// Block ranges over one memory bank.
pub mod range;
/// Tag declarations.
pub mod tag;
/// Tag value types and copy coercion.
pub mod value;

mod validate;

pub use builder::{ClockedShift, ProgramBuilder, SearchOpts, ShiftBuilder};
pub use error::BuildError;
pub use program::{InstructionSite, Program, Rung};
