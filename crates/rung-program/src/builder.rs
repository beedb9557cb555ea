//! Append-only program construction.

use indexmap::IndexMap;
use smol_str::SmolStr;
use tracing::warn;

use crate::cond::{CompareOp, Condition};
use crate::error::BuildError;
use crate::instr::{
    ForLoopDef, Instruction, Operand, SearchDef, ShiftDef, SlotId, TimeUnit, TimerDef, TimerKind,
};
use crate::program::{Program, Rung};
use crate::range::RangeOperand;
use crate::tag::Tag;
use crate::validate;
use crate::value::{TagType, Value};

/// Builds a [`Program`] by declaring tags and appending rungs, then freezes
/// it with a whole-program validation pass.
///
/// The builder owns the scratch-slot allocator, so edge conditions and
/// stateful instructions must be created through it; the loop-nesting guard
/// is likewise scoped to one builder instance.
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    tags: IndexMap<SmolStr, Tag>,
    rungs: Vec<Rung>,
    subroutines: IndexMap<SmolStr, Vec<Rung>>,
    current_sub: Option<SmolStr>,
    next_slot: u32,
    in_loop: bool,
}

/// Optional search behavior flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchOpts {
    /// Resume after the previous match instead of restarting each scan.
    pub continuous: bool,
    /// Execute only on rising-edge scans of the driving power.
    pub oneshot: bool,
}

impl ProgramBuilder {
    /// Empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn declare(
        &mut self,
        name: SmolStr,
        ty: TagType,
        default: Value,
        system: bool,
    ) -> Result<(), BuildError> {
        if default.tag_type() != ty {
            return Err(BuildError::DefaultMismatch {
                name,
                expected: ty,
                found: default.tag_type(),
            });
        }
        if let Some(existing) = self.tags.get(&name) {
            if existing.tag_type() == ty {
                return Ok(());
            }
            return Err(BuildError::TypeConflict {
                name,
                existing: existing.tag_type(),
                requested: ty,
            });
        }
        self.tags
            .insert(name.clone(), Tag::new(name, ty, default, system));
        Ok(())
    }

    /// Declare a tag with its type-zero default.
    ///
    /// Redeclaring with the same type is idempotent; a conflicting type
    /// fails.
    pub fn tag(&mut self, name: impl Into<SmolStr>, ty: TagType) -> Result<(), BuildError> {
        self.declare(name.into(), ty, Value::zero(ty), false)
    }

    /// Declare a tag with an explicit default value.
    pub fn tag_with_default(
        &mut self,
        name: impl Into<SmolStr>,
        ty: TagType,
        default: Value,
    ) -> Result<(), BuildError> {
        self.declare(name.into(), ty, default, false)
    }

    /// Declare a system-reserved tag; forces and patches are rejected on it.
    pub fn system_tag(&mut self, name: impl Into<SmolStr>, ty: TagType) -> Result<(), BuildError> {
        self.declare(name.into(), ty, Value::zero(ty), true)
    }

    /// Declare a contiguous bank of boolean tags `prefix{start}..prefix{end}`.
    pub fn bit_block(
        &mut self,
        prefix: impl Into<SmolStr>,
        start: u32,
        end: u32,
    ) -> Result<(), BuildError> {
        let prefix = prefix.into();
        if start > end {
            return Err(BuildError::InvalidRange { prefix, start, end });
        }
        for index in start..=end {
            self.tag(crate::range::address_name(&prefix, index), TagType::Bool)?;
        }
        Ok(())
    }

    fn alloc_slot(&mut self) -> SlotId {
        let slot = SlotId(self.next_slot);
        self.next_slot += 1;
        slot
    }

    /// Rising-edge wrapper: true only on the scan where `input` turns on.
    pub fn rising(&mut self, input: Condition) -> Condition {
        Condition::Rising {
            input: Box::new(input),
            slot: self.alloc_slot(),
        }
    }

    /// Falling-edge wrapper: true only on the scan where `input` turns off.
    pub fn falling(&mut self, input: Condition) -> Condition {
        Condition::Falling {
            input: Box::new(input),
            slot: self.alloc_slot(),
        }
    }

    fn timer(
        &mut self,
        kind: TimerKind,
        done: SmolStr,
        accumulator: SmolStr,
        setpoint: Operand,
        unit: TimeUnit,
        reset: Option<Condition>,
    ) -> Instruction {
        Instruction::Timer(TimerDef {
            kind,
            done,
            accumulator,
            setpoint,
            unit,
            reset,
            accum_slot: self.alloc_slot(),
            level_slot: self.alloc_slot(),
            timing_slot: self.alloc_slot(),
        })
    }

    /// On-delay timer: done after the rung has been powered for the
    /// setpoint.
    pub fn on_delay(
        &mut self,
        done: impl Into<SmolStr>,
        accumulator: impl Into<SmolStr>,
        setpoint: Operand,
        unit: TimeUnit,
    ) -> Instruction {
        self.timer(
            TimerKind::OnDelay,
            done.into(),
            accumulator.into(),
            setpoint,
            unit,
            None,
        )
    }

    /// Off-delay timer: done while powered and for the setpoint after power
    /// drops.
    pub fn off_delay(
        &mut self,
        done: impl Into<SmolStr>,
        accumulator: impl Into<SmolStr>,
        setpoint: Operand,
        unit: TimeUnit,
    ) -> Instruction {
        self.timer(
            TimerKind::OffDelay,
            done.into(),
            accumulator.into(),
            setpoint,
            unit,
            None,
        )
    }

    /// Retentive on-delay timer: the accumulator survives power loss and
    /// clears only on the reset input.
    pub fn retentive(
        &mut self,
        done: impl Into<SmolStr>,
        accumulator: impl Into<SmolStr>,
        setpoint: Operand,
        unit: TimeUnit,
        reset: Condition,
    ) -> Instruction {
        self.timer(
            TimerKind::Retentive,
            done.into(),
            accumulator.into(),
            setpoint,
            unit,
            Some(reset),
        )
    }

    /// Start a shift-register chain over a bit range.
    ///
    /// The chain must receive its clock input before its reset input;
    /// dropping it without `finish` adds no instruction (a warning is
    /// logged).
    pub fn shift(&mut self, range: impl Into<RangeOperand>) -> ShiftBuilder {
        ShiftBuilder {
            parts: Some(ShiftParts {
                range: range.into(),
                clock_slot: self.alloc_slot(),
            }),
        }
    }

    /// Range search writing the found address index and a found flag.
    pub fn search(
        &mut self,
        range: impl Into<RangeOperand>,
        op: CompareOp,
        target: Operand,
        result: impl Into<SmolStr>,
        found: impl Into<SmolStr>,
        opts: SearchOpts,
    ) -> Instruction {
        Instruction::Search(SearchDef {
            range: range.into(),
            op,
            target,
            result: result.into(),
            found: found.into(),
            continuous: opts.continuous,
            oneshot: opts.oneshot,
            power_slot: self.alloc_slot(),
            cursor_slot: self.alloc_slot(),
        })
    }

    /// Build a loop container; the closure appends the child instructions.
    ///
    /// Loop bodies cannot nest: a second `for_loop` while one is open fails,
    /// and the guard is scoped to this builder, not the process.
    pub fn for_loop(
        &mut self,
        index: impl Into<SmolStr>,
        count: Operand,
        body: impl FnOnce(&mut Self) -> Result<Vec<Instruction>, BuildError>,
    ) -> Result<Instruction, BuildError> {
        if self.in_loop {
            return Err(BuildError::NestedLoop);
        }
        self.in_loop = true;
        let body = body(self);
        self.in_loop = false;
        Ok(Instruction::ForLoop(ForLoopDef {
            index: index.into(),
            count,
            body: body?,
        }))
    }

    /// Append a rung to the main list, or to the subroutine being defined.
    pub fn add_rung(&mut self, condition: Condition, instructions: Vec<Instruction>) {
        let rung = Rung {
            condition,
            instructions,
        };
        match &self.current_sub {
            Some(name) => {
                if let Some(rungs) = self.subroutines.get_mut(name) {
                    rungs.push(rung);
                }
            }
            None => self.rungs.push(rung),
        }
    }

    /// Define a named subroutine; rungs added inside the closure belong to
    /// it.
    pub fn subroutine(
        &mut self,
        name: impl Into<SmolStr>,
        body: impl FnOnce(&mut Self) -> Result<(), BuildError>,
    ) -> Result<(), BuildError> {
        let name = name.into();
        if self.current_sub.is_some() {
            return Err(BuildError::NestedSubroutine(name));
        }
        if self.subroutines.contains_key(&name) {
            return Err(BuildError::DuplicateSubroutine(name));
        }
        self.subroutines.insert(name.clone(), Vec::new());
        self.current_sub = Some(name);
        let result = body(self);
        self.current_sub = None;
        result
    }

    /// Validate the whole program and freeze it.
    pub fn freeze(self) -> Result<Program, BuildError> {
        validate::validate(&self.tags, &self.rungs, &self.subroutines)?;
        Ok(Program {
            tags: self.tags,
            rungs: self.rungs,
            subroutines: self.subroutines,
            slot_count: self.next_slot,
        })
    }
}

#[derive(Debug)]
struct ShiftParts {
    range: RangeOperand,
    clock_slot: SlotId,
}

/// Shift-register chain awaiting its clock input.
#[derive(Debug)]
pub struct ShiftBuilder {
    parts: Option<ShiftParts>,
}

impl ShiftBuilder {
    /// Attach the clock input; required before reset or finish.
    #[must_use]
    pub fn clock(mut self, clock: Condition) -> ClockedShift {
        let parts = self
            .parts
            .take()
            .expect("shift chain state taken before clock");
        ClockedShift {
            parts: Some((parts, clock, Condition::Never)),
        }
    }
}

impl Drop for ShiftBuilder {
    fn drop(&mut self) {
        if self.parts.is_some() {
            warn!("shift register chain discarded before clock; no instruction added");
        }
    }
}

/// Shift-register chain with clock attached; `finish` produces the
/// instruction.
#[derive(Debug)]
pub struct ClockedShift {
    parts: Option<(ShiftParts, Condition, Condition)>,
}

impl ClockedShift {
    /// Attach the level-triggered reset input.
    #[must_use]
    pub fn reset(mut self, reset: Condition) -> Self {
        if let Some(parts) = self.parts.as_mut() {
            parts.2 = reset;
        }
        self
    }

    /// Finalize the chain into a shift instruction.
    #[must_use]
    pub fn finish(mut self) -> Instruction {
        let (parts, clock, reset) = self
            .parts
            .take()
            .expect("shift chain state taken before finish");
        Instruction::Shift(ShiftDef {
            range: parts.range,
            clock,
            reset,
            clock_slot: parts.clock_slot,
        })
    }
}

impl Drop for ClockedShift {
    fn drop(&mut self) {
        if self.parts.is_some() {
            warn!("shift register chain discarded without finish; no instruction added");
        }
    }
}

/// Up counter; `reset` clears the count to zero.
#[must_use]
pub fn count_up(
    count: impl Into<SmolStr>,
    done: impl Into<SmolStr>,
    setpoint: Operand,
    reset: Option<Condition>,
) -> Instruction {
    Instruction::Counter(crate::instr::CounterDef {
        kind: crate::instr::CounterKind::Up,
        count: count.into(),
        done: done.into(),
        setpoint,
        reset,
    })
}

/// Down counter; `reset` reloads the setpoint.
#[must_use]
pub fn count_down(
    count: impl Into<SmolStr>,
    done: impl Into<SmolStr>,
    setpoint: Operand,
    reset: Option<Condition>,
) -> Instruction {
    Instruction::Counter(crate::instr::CounterDef {
        kind: crate::instr::CounterKind::Down,
        count: count.into(),
        done: done.into(),
        setpoint,
        reset,
    })
}
