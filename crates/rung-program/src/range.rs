//! Block ranges over one memory bank.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::BuildError;

/// Compose the tag name for one address of a bank.
#[must_use]
pub fn address_name(prefix: &str, index: u32) -> SmolStr {
    SmolStr::from(format!("{prefix}{index}"))
}

/// A single bank address, e.g. the destination start of a block copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    prefix: SmolStr,
    index: u32,
}

impl Address {
    /// Address at `prefix{index}`.
    #[must_use]
    pub fn new(prefix: impl Into<SmolStr>, index: u32) -> Self {
        Self {
            prefix: prefix.into(),
            index,
        }
    }

    /// Bank prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Numeric index within the bank.
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Full tag name for this address.
    #[must_use]
    pub fn name(&self) -> SmolStr {
        address_name(&self.prefix, self.index)
    }
}

/// An ordered, directional span of addresses within one bank.
///
/// Forward (low to high) by default; `reverse` flips the iteration order
/// without changing the member addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRange {
    prefix: SmolStr,
    start: u32,
    end: u32,
    reversed: bool,
}

impl BlockRange {
    /// Range over `[start, end]` of a bank, forward order.
    pub fn new(prefix: impl Into<SmolStr>, start: u32, end: u32) -> Result<Self, BuildError> {
        let prefix = prefix.into();
        if start > end {
            return Err(BuildError::InvalidRange { prefix, start, end });
        }
        Ok(Self {
            prefix,
            start,
            end,
            reversed: false,
        })
    }

    /// Equivalent range with the iteration order flipped.
    ///
    /// Pure transform: the receiver is untouched.
    #[must_use]
    pub fn reverse(&self) -> Self {
        Self {
            reversed: !self.reversed,
            ..self.clone()
        }
    }

    /// Whether iteration runs high to low.
    #[must_use]
    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    /// Bank prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Inclusive `(start, end)` bounds, independent of order.
    #[must_use]
    pub fn bounds(&self) -> (u32, u32) {
        (self.start, self.end)
    }

    /// Number of member addresses.
    #[must_use]
    pub fn len(&self) -> usize {
        (self.end - self.start + 1) as usize
    }

    /// A constructed range always holds at least one address.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Member indices in iteration order.
    #[must_use]
    pub fn indices(&self) -> Vec<u32> {
        let forward = self.start..=self.end;
        if self.reversed {
            forward.rev().collect()
        } else {
            forward.collect()
        }
    }

    /// Member tag names in iteration order.
    #[must_use]
    pub fn names(&self) -> Vec<SmolStr> {
        self.indices()
            .into_iter()
            .map(|index| address_name(&self.prefix, index))
            .collect()
    }
}

/// A range whose bounds come from tag values at evaluation time.
///
/// Direction metadata propagates onto the resolved concrete range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndirectBlockRange {
    prefix: SmolStr,
    start_tag: SmolStr,
    end_tag: SmolStr,
    reversed: bool,
}

impl IndirectBlockRange {
    /// Range over `[value(start_tag), value(end_tag)]` of a bank.
    #[must_use]
    pub fn new(
        prefix: impl Into<SmolStr>,
        start_tag: impl Into<SmolStr>,
        end_tag: impl Into<SmolStr>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            start_tag: start_tag.into(),
            end_tag: end_tag.into(),
            reversed: false,
        }
    }

    /// Equivalent indirect range with the iteration order flipped.
    #[must_use]
    pub fn reverse(&self) -> Self {
        Self {
            reversed: !self.reversed,
            ..self.clone()
        }
    }

    /// Whether the resolved range iterates high to low.
    #[must_use]
    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    /// Bank prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Tag holding the inclusive start index.
    #[must_use]
    pub fn start_tag(&self) -> &SmolStr {
        &self.start_tag
    }

    /// Tag holding the inclusive end index.
    #[must_use]
    pub fn end_tag(&self) -> &SmolStr {
        &self.end_tag
    }
}

/// Range operand of an instruction: concrete or resolved at evaluation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeOperand {
    /// Bounds fixed at build time.
    Direct(BlockRange),
    /// Bounds read from tags each evaluation.
    Indirect(IndirectBlockRange),
}

impl RangeOperand {
    /// Equivalent operand with the iteration order flipped.
    #[must_use]
    pub fn reverse(&self) -> Self {
        match self {
            Self::Direct(range) => Self::Direct(range.reverse()),
            Self::Indirect(range) => Self::Indirect(range.reverse()),
        }
    }

    /// Bank prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        match self {
            Self::Direct(range) => range.prefix(),
            Self::Indirect(range) => range.prefix(),
        }
    }

    /// Whether the resolved sequence iterates high to low.
    #[must_use]
    pub fn is_reversed(&self) -> bool {
        match self {
            Self::Direct(range) => range.is_reversed(),
            Self::Indirect(range) => range.is_reversed(),
        }
    }
}

impl From<BlockRange> for RangeOperand {
    fn from(range: BlockRange) -> Self {
        Self::Direct(range)
    }
}

impl From<IndirectBlockRange> for RangeOperand {
    fn from(range: IndirectBlockRange) -> Self {
        Self::Indirect(range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_is_pure() {
        let range = BlockRange::new("C", 1, 5).unwrap();
        let reversed = range.reverse();
        assert!(!range.is_reversed());
        assert!(reversed.is_reversed());
        assert_eq!(range.names(), vec!["C1", "C2", "C3", "C4", "C5"]);
        assert_eq!(reversed.names(), vec!["C5", "C4", "C3", "C2", "C1"]);
        assert_eq!(reversed.reverse(), range);
    }

    #[test]
    fn descending_bounds_rejected() {
        assert!(matches!(
            BlockRange::new("C", 5, 1),
            Err(BuildError::InvalidRange { .. })
        ));
    }

    #[test]
    fn indirect_reverse_propagates() {
        let range = IndirectBlockRange::new("C", "Start", "End");
        assert!(range.reverse().is_reversed());
        assert!(!range.is_reversed());
    }
}
