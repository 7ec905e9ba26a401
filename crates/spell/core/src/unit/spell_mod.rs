//! Spell modifiers granted by add-modifier auras.
//!
//! A modifier adjusts one property (damage, duration, cost...) of every
//! spell whose family flags intersect its mask. Flat modifiers are summed
//! before percent modifiers are applied.

use crate::spell::SpellDefinition;
use crate::types::SpellId;

/// Property of a spell adjusted by a modifier. Values match aura misc values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::FromRepr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum SpellModOp {
    Damage = 0,
    Duration = 1,
    Threat = 2,
    Effect1 = 3,
    Charges = 4,
    Range = 5,
    Radius = 6,
    CriticalChance = 7,
    AllEffects = 8,
    NotLoseCastingTime = 9,
    CastingTime = 10,
    Cooldown = 11,
    Effect2 = 12,
    Cost = 14,
    CritDamageBonus = 15,
    ResistMissChance = 16,
    JumpTargets = 17,
    ChanceOfSuccess = 18,
    ActivationTime = 19,
    EffectPastFirst = 20,
    CastingTimeOld = 21,
    Dot = 22,
    Effect3 = 23,
    SpellBonusDamage = 24,
    MultipleValue = 27,
    ResistDispelChance = 28,
}

impl SpellModOp {
    pub fn from_misc(misc: i32) -> Option<Self> {
        u8::try_from(misc).ok().and_then(Self::from_repr)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpellModKind {
    Flat,
    Pct,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpellModifier {
    pub op: SpellModOp,
    pub kind: SpellModKind,
    pub value: i32,
    pub family_mask: u64,
    /// Spell whose aura granted the modifier.
    pub source: SpellId,
}

impl SpellModifier {
    pub fn affects(&self, spell: &SpellDefinition) -> bool {
        spell.fits_family_mask(self.family_mask)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpellModifiers {
    mods: Vec<SpellModifier>,
}

impl SpellModifiers {
    pub fn add(&mut self, modifier: SpellModifier, apply: bool) {
        if apply {
            self.mods.push(modifier);
        } else if let Some(pos) = self.mods.iter().position(|m| *m == modifier) {
            self.mods.remove(pos);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.mods.is_empty()
    }

    /// Applies every matching modifier of `op` to `value`.
    pub fn apply_i32(&self, spell: &SpellDefinition, op: SpellModOp, value: i32) -> i32 {
        let (flat, pct) = self.totals(spell, op);
        let base = value + flat;
        base + (base as i64 * pct as i64 / 100) as i32
    }

    /// Floating-point variant used for ranges and radii.
    pub fn apply_f32(&self, spell: &SpellDefinition, op: SpellModOp, value: f32) -> f32 {
        let (flat, pct) = self.totals(spell, op);
        let base = value + flat as f32;
        base + base * pct as f32 / 100.0
    }

    fn totals(&self, spell: &SpellDefinition, op: SpellModOp) -> (i32, i32) {
        self.mods
            .iter()
            .filter(|m| m.op == op && m.affects(spell))
            .fold((0, 0), |(flat, pct), m| match m.kind {
                SpellModKind::Flat => (flat + m.value, pct),
                SpellModKind::Pct => (flat, pct + m.value),
            })
    }
}
