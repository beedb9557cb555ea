//! Tag declarations.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::value::{TagType, Value};

/// A named, typed memory cell declared at program-build time.
///
/// Identity (name and type) is fixed once declared; only the value changes,
/// and only inside a committed system state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    name: SmolStr,
    ty: TagType,
    default: Value,
    system: bool,
}

impl Tag {
    pub(crate) fn new(name: SmolStr, ty: TagType, default: Value, system: bool) -> Self {
        Self {
            name,
            ty,
            default,
            system,
        }
    }

    /// Tag name, unique within a program.
    #[must_use]
    pub fn name(&self) -> &SmolStr {
        &self.name
    }

    /// Declared type.
    #[must_use]
    pub fn tag_type(&self) -> TagType {
        self.ty
    }

    /// Initial value on a fresh runner.
    #[must_use]
    pub fn default_value(&self) -> &Value {
        &self.default
    }

    /// System-reserved tags may never be forced or patched.
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.system
    }
}
