//! Spell currently being cast or channeled by a unit.

use crate::spell::{InterruptFlags, PreventionType, SchoolMask};
use crate::types::{SpellId, UnitId};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CurrentCast {
    pub spell: SpellId,
    pub target: Option<UnitId>,
    pub channeled: bool,
    /// Remaining cast or channel time in ms.
    pub remaining_ms: i32,
    pub interrupt_flags: InterruptFlags,
    pub prevention: PreventionType,
    pub school: SchoolMask,
}

impl CurrentCast {
    pub fn channel(spell: SpellId, target: Option<UnitId>, duration_ms: i32, school: SchoolMask) -> Self {
        Self {
            spell,
            target,
            channeled: true,
            remaining_ms: duration_ms,
            interrupt_flags: InterruptFlags::INTERRUPT,
            prevention: PreventionType::Silence,
            school,
        }
    }

    /// True when an interrupt effect may cut this cast short.
    pub fn is_interruptible(&self) -> bool {
        self.interrupt_flags.contains(InterruptFlags::INTERRUPT)
    }
}
