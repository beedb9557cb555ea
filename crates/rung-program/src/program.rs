//! Frozen programs and the instruction-site walker.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::cond::Condition;
use crate::instr::Instruction;
use crate::tag::Tag;

/// One rung: a combined condition paired with an ordered instruction list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rung {
    pub(crate) condition: Condition,
    pub(crate) instructions: Vec<Instruction>,
}

impl Rung {
    /// The rung's combined condition expression.
    #[must_use]
    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    /// Instructions in execution order.
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }
}

/// An immutable ladder program: declared tags, ordered rungs, subroutines.
///
/// Built once through [`crate::ProgramBuilder`] and frozen; safe to share
/// across any number of runners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub(crate) tags: IndexMap<SmolStr, Tag>,
    pub(crate) rungs: Vec<Rung>,
    pub(crate) subroutines: IndexMap<SmolStr, Vec<Rung>>,
    pub(crate) slot_count: u32,
}

impl Program {
    /// Look up a declared tag.
    #[must_use]
    pub fn tag(&self, name: &str) -> Option<&Tag> {
        self.tags.get(name)
    }

    /// All declared tags in declaration order.
    #[must_use]
    pub fn tags(&self) -> &IndexMap<SmolStr, Tag> {
        &self.tags
    }

    /// Main rung list in declaration order.
    #[must_use]
    pub fn rungs(&self) -> &[Rung] {
        &self.rungs
    }

    /// Rung list of a named subroutine.
    #[must_use]
    pub fn subroutine(&self, name: &str) -> Option<&[Rung]> {
        self.subroutines.get(name).map(Vec::as_slice)
    }

    /// Declared subroutines in declaration order.
    #[must_use]
    pub fn subroutines(&self) -> &IndexMap<SmolStr, Vec<Rung>> {
        &self.subroutines
    }

    /// Number of private scratch slots the program uses.
    #[must_use]
    pub fn scratch_slots(&self) -> u32 {
        self.slot_count
    }

    /// Walk every instruction site across rungs, subroutines, and loop
    /// bodies, with deterministic location strings.
    ///
    /// This is the read-only surface validation and codegen collaborators
    /// consume.
    #[must_use]
    pub fn sites(&self) -> Vec<InstructionSite<'_>> {
        let mut sites = Vec::new();
        walk_rungs(&mut sites, "", &self.rungs);
        for (name, rungs) in &self.subroutines {
            walk_rungs(&mut sites, &format!("sub[{name}]."), rungs);
        }
        sites
    }
}

/// One instruction paired with its reproducible location string.
#[derive(Debug, Clone)]
pub struct InstructionSite<'a> {
    /// The instruction at this site.
    pub instruction: &'a Instruction,
    /// Deterministic path, e.g. `sub[Init].rung[0].instr[1].body[2]`.
    pub location: String,
}

fn walk_rungs<'a>(sites: &mut Vec<InstructionSite<'a>>, scope: &str, rungs: &'a [Rung]) {
    for (rung_index, rung) in rungs.iter().enumerate() {
        for (instr_index, instruction) in rung.instructions.iter().enumerate() {
            let location = format!("{scope}rung[{rung_index}].instr[{instr_index}]");
            walk_instruction(sites, location, instruction);
        }
    }
}

fn walk_instruction<'a>(
    sites: &mut Vec<InstructionSite<'a>>,
    location: String,
    instruction: &'a Instruction,
) {
    if let Instruction::ForLoop(def) = instruction {
        sites.push(InstructionSite {
            instruction,
            location: location.clone(),
        });
        for (child_index, child) in def.body.iter().enumerate() {
            walk_instruction(sites, format!("{location}.body[{child_index}]"), child);
        }
    } else {
        sites.push(InstructionSite {
            instruction,
            location,
        });
    }
}
