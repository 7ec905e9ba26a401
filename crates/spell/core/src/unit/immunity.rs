//! Immunity registrations held by a unit.
//!
//! Every immunity aura registers one entry tagged with the spell that
//! granted it, so removing one aura only drops its own registration even when
//! several auras grant the same immunity.

use crate::types::SpellId;

/// What an immunity entry covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ImmunityKind {
    /// A spell effect kind (raw value).
    Effect,
    /// An aura type (raw value).
    State,
    /// A school mask; blocks whole spells of the school.
    School,
    /// A school mask; blocks only damage of the school.
    Damage,
    /// A dispel category.
    Dispel,
    /// A mechanic mask.
    Mechanic,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImmunityEntry {
    pub kind: ImmunityKind,
    pub value: u32,
    pub spell: SpellId,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpellImmunities {
    entries: Vec<ImmunityEntry>,
}

impl SpellImmunities {
    /// Registers (`apply`) or drops the entry `(kind, value)` granted by `spell`.
    ///
    /// Dropping removes a single matching registration.
    pub fn apply(&mut self, kind: ImmunityKind, value: u32, spell: SpellId, apply: bool) {
        if apply {
            self.entries.push(ImmunityEntry { kind, value, spell });
        } else if let Some(pos) = self
            .entries
            .iter()
            .position(|e| e.kind == kind && e.value == value && e.spell == spell)
        {
            self.entries.remove(pos);
        }
    }

    /// Masks are tested by intersection, scalar kinds by equality.
    pub fn has(&self, kind: ImmunityKind, value: u32) -> bool {
        self.entries.iter().any(|e| {
            e.kind == kind
                && match kind {
                    ImmunityKind::School | ImmunityKind::Damage | ImmunityKind::Mechanic => {
                        e.value & value != 0
                    }
                    ImmunityKind::Effect | ImmunityKind::State | ImmunityKind::Dispel => {
                        e.value == value
                    }
                }
        })
    }

    /// Union of every registered mask of `kind`.
    pub fn mask(&self, kind: ImmunityKind) -> u32 {
        self.entries
            .iter()
            .filter(|e| e.kind == kind)
            .fold(0, |mask, e| mask | e.value)
    }

    pub fn entries(&self) -> &[ImmunityEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
