//! Static spell templates.
//!
//! A [`SpellDefinition`] is immutable once loaded and shared as
//! `Arc<SpellDefinition>`. The engine never copies a definition; holders keep
//! the `Arc` they were created with and check that it is still the instance
//! the store hands out.

use crate::aura::AuraType;
use crate::config::AuraConfig;
use crate::effect::SpellEffectKind;
use crate::types::{EffectIndex, SpellId};

use super::enums::{
    AuraInterruptFlags, DispelType, ImplicitTarget, InterruptFlags, LinkedSpellKind, Mechanic,
    PowerType, PreventionType, ProcFlags, SchoolMask, SpellAttributes, SpellFamily,
};

/// Per-effect-slot data of a spell.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SpellEffectEntry {
    pub kind: SpellEffectKind,
    pub aura: AuraType,
    /// Value before level scaling and dice.
    pub base_points: i32,
    /// Random spread added to `base_points` (`0..die_sides`); 0 disables it.
    pub die_sides: i32,
    /// Added per caster level above the spell's base level.
    pub points_per_level: i32,
    /// Period of periodic auras in milliseconds.
    pub amplitude_ms: i32,
    pub radius_index: u32,
    pub trigger_spell: Option<SpellId>,
    pub misc_value: i32,
    pub misc_value_b: i32,
    pub mechanic: Mechanic,
    pub target: ImplicitTarget,
    /// Transfer multiplier of leech/drain effects; 0 is treated as 1.
    pub multiple_value: f32,
    /// Item created by create-item effects.
    pub item_type: u32,
    /// Family flags of spells affected by spell-modifier auras.
    pub family_mask: u64,
}

impl SpellEffectEntry {
    pub fn new(kind: SpellEffectKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.kind == SpellEffectKind::Null
    }

    /// Multiplier used by leech and drain effects.
    pub fn transfer_multiplier(&self) -> f32 {
        if self.multiple_value > 0.0 {
            self.multiple_value
        } else {
            1.0
        }
    }
}

/// Duration table row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DurationEntry {
    /// Base duration in ms; `-1` means infinite.
    pub base_ms: i32,
    pub per_level_ms: i32,
    /// Upper bound in ms; `-1` means infinite.
    pub max_ms: i32,
}

impl DurationEntry {
    pub const INFINITE: Self = Self {
        base_ms: -1,
        per_level_ms: 0,
        max_ms: -1,
    };

    pub const fn fixed(ms: i32) -> Self {
        Self {
            base_ms: ms,
            per_level_ms: 0,
            max_ms: ms,
        }
    }

    /// Duration for a caster of `level` casting a spell of `spell_level`.
    pub fn for_level(&self, level: u32, spell_level: u32) -> i32 {
        if self.base_ms < 0 {
            return -1;
        }
        let levels = level.saturating_sub(spell_level) as i32;
        let duration = self.base_ms + self.per_level_ms * levels;
        if self.max_ms > 0 {
            duration.min(self.max_ms)
        } else {
            duration
        }
    }
}

/// Rank chain membership, used to pick the rank an area aura applies to
/// low-level party members.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpellChain {
    pub first: SpellId,
    pub prev: Option<SpellId>,
    pub rank: u32,
}

/// Spell cast or removed alongside another spell's aura.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinkedSpell {
    pub spell: SpellId,
    pub linked: SpellId,
    pub kind: LinkedSpellKind,
}

/// Immutable spell template.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SpellDefinition {
    pub id: SpellId,
    pub name: String,
    pub school_mask: SchoolMask,
    pub dispel: DispelType,
    pub mechanic: Mechanic,
    pub attributes: SpellAttributes,
    /// Shapeshift forms the spell requires (bit per form).
    pub stances: u32,
    pub family: SpellFamily,
    pub family_flags: u64,
    pub duration_index: u32,
    pub power_type: PowerType,
    pub mana_cost: u32,
    pub mana_per_second: u32,
    pub mana_per_second_per_level: u32,
    /// Maximum stack count; 0 means the spell does not stack.
    pub stack_amount: u32,
    pub proc_charges: u32,
    pub proc_chance: u32,
    pub proc_flags: ProcFlags,
    pub spell_level: u32,
    pub base_level: u32,
    pub max_level: u32,
    pub max_range: f32,
    pub prevention_type: PreventionType,
    pub interrupt_flags: InterruptFlags,
    pub aura_interrupt_flags: AuraInterruptFlags,
    pub chain: Option<SpellChain>,
    pub effects: [SpellEffectEntry; AuraConfig::MAX_EFFECT_INDEX],
}

impl SpellDefinition {
    pub fn builder(id: u32) -> SpellBuilder {
        SpellBuilder::new(id)
    }

    pub fn effect(&self, index: EffectIndex) -> &SpellEffectEntry {
        &self.effects[index.as_usize()]
    }

    /// Indices of non-empty effect slots in order.
    pub fn effect_indices(&self) -> impl Iterator<Item = EffectIndex> + '_ {
        EffectIndex::ALL
            .into_iter()
            .filter(|index| !self.effect(*index).is_empty())
    }

    pub fn is_passive(&self) -> bool {
        self.attributes.contains(SpellAttributes::PASSIVE)
    }

    pub fn is_channeled(&self) -> bool {
        self.attributes.contains(SpellAttributes::CHANNELED)
    }

    pub fn is_death_persistent(&self) -> bool {
        self.attributes.contains(SpellAttributes::DEATH_PERSISTENT)
    }

    /// Spells that may only (or also) be cast on dead units.
    pub fn can_target_dead(&self) -> bool {
        self.attributes.contains(SpellAttributes::CAN_TARGET_DEAD)
    }

    pub fn is_seal(&self) -> bool {
        self.attributes.contains(SpellAttributes::SEAL)
    }

    pub fn has_effect(&self, kind: SpellEffectKind) -> bool {
        self.effects.iter().any(|e| e.kind == kind)
    }

    pub fn has_aura(&self, aura: AuraType) -> bool {
        self.effects
            .iter()
            .any(|e| e.kind.applies_aura() && e.aura == aura)
    }

    /// True if any effect builds an aura, so a cast needs a pending holder.
    pub fn applies_auras(&self) -> bool {
        self.effects.iter().any(|e| e.kind.applies_aura())
    }

    pub fn is_area_aura_spell(&self) -> bool {
        self.effects.iter().any(|e| e.kind.is_area_aura())
    }

    /// Mechanic mask of the spell and every effect-level mechanic.
    pub fn all_mechanics_mask(&self) -> u32 {
        self.effects
            .iter()
            .fold(self.mechanic.mask_bit(), |mask, e| mask | e.mechanic.mask_bit())
    }

    pub fn fits_family_mask(&self, mask: u64) -> bool {
        self.family_flags & mask != 0
    }
}

/// Fluent constructor for definitions built in code (tests, scripted content).
#[derive(Clone, Debug)]
pub struct SpellBuilder {
    spell: SpellDefinition,
}

impl SpellBuilder {
    pub fn new(id: u32) -> Self {
        Self {
            spell: SpellDefinition {
                id: SpellId(id),
                name: format!("spell {id}"),
                ..SpellDefinition::default()
            },
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.spell.name = name.into();
        self
    }

    pub fn school(mut self, school: SchoolMask) -> Self {
        self.spell.school_mask = school;
        self
    }

    pub fn dispel(mut self, dispel: DispelType) -> Self {
        self.spell.dispel = dispel;
        self
    }

    pub fn mechanic(mut self, mechanic: Mechanic) -> Self {
        self.spell.mechanic = mechanic;
        self
    }

    pub fn attributes(mut self, attributes: SpellAttributes) -> Self {
        self.spell.attributes |= attributes;
        self
    }

    pub fn family(mut self, family: SpellFamily, flags: u64) -> Self {
        self.spell.family = family;
        self.spell.family_flags = flags;
        self
    }

    pub fn stances(mut self, stances: u32) -> Self {
        self.spell.stances = stances;
        self
    }

    pub fn duration_index(mut self, index: u32) -> Self {
        self.spell.duration_index = index;
        self
    }

    pub fn stack_amount(mut self, stack: u32) -> Self {
        self.spell.stack_amount = stack;
        self
    }

    pub fn proc(mut self, flags: ProcFlags, chance: u32, charges: u32) -> Self {
        self.spell.proc_flags = flags;
        self.spell.proc_chance = chance;
        self.spell.proc_charges = charges;
        self
    }

    pub fn mana_per_second(mut self, power: PowerType, base: u32, per_level: u32) -> Self {
        self.spell.power_type = power;
        self.spell.mana_per_second = base;
        self.spell.mana_per_second_per_level = per_level;
        self
    }

    pub fn levels(mut self, spell_level: u32, base_level: u32, max_level: u32) -> Self {
        self.spell.spell_level = spell_level;
        self.spell.base_level = base_level;
        self.spell.max_level = max_level;
        self
    }

    pub fn max_range(mut self, range: f32) -> Self {
        self.spell.max_range = range;
        self
    }

    pub fn prevention(mut self, prevention: PreventionType) -> Self {
        self.spell.prevention_type = prevention;
        self
    }

    pub fn interrupt_flags(mut self, flags: InterruptFlags) -> Self {
        self.spell.interrupt_flags = flags;
        self
    }

    pub fn aura_interrupt_flags(mut self, flags: AuraInterruptFlags) -> Self {
        self.spell.aura_interrupt_flags = flags;
        self
    }

    pub fn chain(mut self, first: u32, prev: Option<u32>, rank: u32) -> Self {
        self.spell.chain = Some(SpellChain {
            first: SpellId(first),
            prev: prev.map(SpellId),
            rank,
        });
        self
    }

    /// Sets effect slot `index` to `entry`.
    pub fn effect(mut self, index: EffectIndex, entry: SpellEffectEntry) -> Self {
        self.spell.effects[index.as_usize()] = entry;
        self
    }

    /// Shorthand for an apply-aura effect with a base amount and period.
    pub fn aura(self, index: EffectIndex, aura: AuraType, base_points: i32, amplitude_ms: i32) -> Self {
        self.effect(
            index,
            SpellEffectEntry {
                kind: SpellEffectKind::ApplyAura,
                aura,
                base_points,
                amplitude_ms,
                ..SpellEffectEntry::default()
            },
        )
    }

    pub fn build(self) -> SpellDefinition {
        self.spell
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_entry_scaling() {
        let entry = DurationEntry {
            base_ms: 10_000,
            per_level_ms: 1_000,
            max_ms: 15_000,
        };
        assert_eq!(entry.for_level(10, 10), 10_000);
        assert_eq!(entry.for_level(13, 10), 13_000);
        assert_eq!(entry.for_level(60, 10), 15_000);
        assert_eq!(DurationEntry::INFINITE.for_level(60, 1), -1);
        assert_eq!(DurationEntry::fixed(9000).for_level(1, 1), 9000);
    }

    #[test]
    fn builder_sets_effects_and_flags() {
        let spell = SpellDefinition::builder(42)
            .attributes(SpellAttributes::PASSIVE)
            .aura(EffectIndex::Effect1, AuraType::ModStun, 0, 0)
            .build();
        assert!(spell.is_passive());
        assert!(spell.applies_auras());
        assert!(spell.has_aura(AuraType::ModStun));
        let indices: Vec<_> = spell.effect_indices().collect();
        assert_eq!(indices, vec![EffectIndex::Effect1]);
    }

    #[test]
    fn transfer_multiplier_defaults_to_one() {
        let mut entry = SpellEffectEntry::new(SpellEffectKind::HealthLeech);
        assert_eq!(entry.transfer_multiplier(), 1.0);
        entry.multiple_value = 2.5;
        assert_eq!(entry.transfer_multiplier(), 2.5);
    }
}
