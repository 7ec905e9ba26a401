//! Immunity, dispel, positivity and diminishing-returns rules.
//!
//! The engine consults these rules but never hard-codes them, so content with
//! different rule sets can plug in its own [`PolicyOracle`].

use crate::aura::AuraType;
use crate::effect::SpellEffectKind;
use crate::spell::{
    DispelType, ImplicitTarget, Mechanic, SchoolMask, SpellAttributes, SpellDefinition,
};
use crate::types::EffectIndex;
use crate::unit::{DiminishingGroup, ImmunityKind, Unit};

/// Rule set for immunity checks, dispel categories and aura positivity.
pub trait PolicyOracle: Send + Sync {
    /// Whether effect `index` of `spell` benefits its target.
    fn is_positive_effect(&self, spell: &SpellDefinition, index: EffectIndex) -> bool;

    /// A spell is positive when it is not flagged negative and every
    /// non-empty effect is positive.
    fn is_positive_spell(&self, spell: &SpellDefinition) -> bool {
        !spell.attributes.contains(SpellAttributes::NEGATIVE)
            && spell
                .effect_indices()
                .all(|index| self.is_positive_effect(spell, index))
    }

    /// Target is immune to whole spells of `school`.
    fn is_immune_to_school(&self, target: &Unit, school: SchoolMask) -> bool {
        target
            .immunities
            .has(ImmunityKind::School, school.bits())
    }

    /// Target takes no damage of `school`.
    fn is_immune_to_damage(&self, target: &Unit, school: SchoolMask) -> bool {
        target
            .immunities
            .has(ImmunityKind::Damage, school.bits())
            || self.is_immune_to_school(target, school)
    }

    /// Spell-level immunity: dispel category, school (for harmful spells) and mechanic.
    fn is_immune_to_spell(&self, target: &Unit, spell: &SpellDefinition) -> bool {
        if spell.dispel != DispelType::None
            && target
                .immunities
                .has(ImmunityKind::Dispel, spell.dispel as u32)
        {
            return true;
        }
        if !spell
            .attributes
            .intersects(SpellAttributes::UNAFFECTED_BY_INVULNERABILITY | SpellAttributes::IGNORE_IMMUNITY)
            && !self.is_positive_spell(spell)
            && self.is_immune_to_school(target, spell.school_mask)
        {
            return true;
        }
        spell.mechanic != Mechanic::None
            && target
                .immunities
                .has(ImmunityKind::Mechanic, spell.mechanic.mask_bit())
    }

    /// Effect-level immunity: effect kind, effect mechanic and aura type.
    fn is_immune_to_effect(&self, target: &Unit, spell: &SpellDefinition, index: EffectIndex) -> bool {
        let effect = spell.effect(index);
        if target
            .immunities
            .has(ImmunityKind::Effect, u32::from(effect.kind.raw()))
        {
            return true;
        }
        if effect.mechanic != Mechanic::None
            && target
                .immunities
                .has(ImmunityKind::Mechanic, effect.mechanic.mask_bit())
        {
            return true;
        }
        effect.kind.applies_aura()
            && effect.aura != AuraType::None
            && target
                .immunities
                .has(ImmunityKind::State, u32::from(effect.aura.raw()))
    }

    /// Dispel categories removed by a dispel of `dispel`.
    fn dispel_mask(&self, dispel: DispelType) -> u32 {
        dispel.mask()
    }

    fn diminishing_group(&self, spell: &SpellDefinition, triggered: bool) -> DiminishingGroup;

    /// Chance in percent that one dispel attempt on `spell` fails.
    fn dispel_resist_chance(&self, _caster: Option<&Unit>, _target: &Unit, _spell: &SpellDefinition) -> u32 {
        0
    }
}

/// Stock rule set.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultPolicy;

impl DefaultPolicy {
    const HARMFUL_MECHANICS: &'static [Mechanic] = &[
        Mechanic::Charm,
        Mechanic::Disoriented,
        Mechanic::Disarm,
        Mechanic::Distract,
        Mechanic::Fear,
        Mechanic::Fumble,
        Mechanic::Root,
        Mechanic::Pacify,
        Mechanic::Silence,
        Mechanic::Sleep,
        Mechanic::Snare,
        Mechanic::Stun,
        Mechanic::Freeze,
        Mechanic::Knockout,
        Mechanic::Bleed,
        Mechanic::Polymorph,
        Mechanic::Banish,
        Mechanic::Shackle,
        Mechanic::Horror,
        Mechanic::Daze,
        Mechanic::Sapped,
    ];
}

impl PolicyOracle for DefaultPolicy {
    fn is_positive_effect(&self, spell: &SpellDefinition, index: EffectIndex) -> bool {
        if spell.attributes.contains(SpellAttributes::NEGATIVE) {
            return false;
        }
        let effect = spell.effect(index);
        if effect.kind.is_harmful() {
            return false;
        }
        if matches!(
            effect.target,
            ImplicitTarget::EnemiesAroundTarget | ImplicitTarget::CurrentEnemy
        ) {
            return false;
        }
        let mechanic = if effect.mechanic != Mechanic::None {
            effect.mechanic
        } else {
            spell.mechanic
        };
        if Self::HARMFUL_MECHANICS.contains(&mechanic) {
            return false;
        }
        if effect.kind.applies_aura() || effect.kind == SpellEffectKind::PersistentAreaAura {
            let aura = effect.aura;
            if aura.is_always_negative() {
                return false;
            }
            let amount = effect.base_points;
            if aura.is_inverted_benefit() {
                return amount <= 0;
            }
            if amount < 0
                && !matches!(
                    aura,
                    AuraType::Dummy
                        | AuraType::PeriodicTriggerSpell
                        | AuraType::ProcTriggerSpell
                        | AuraType::AddFlatModifier
                        | AuraType::AddPctModifier
                        | AuraType::MechanicImmunity
                        | AuraType::ModShapeshift
                )
            {
                return false;
            }
        }
        true
    }

    fn diminishing_group(&self, spell: &SpellDefinition, triggered: bool) -> DiminishingGroup {
        let mask = spell.all_mechanics_mask();
        if mask == 0 {
            return DiminishingGroup::None;
        }
        let has = |m: Mechanic| mask & m.mask_bit() != 0;
        if has(Mechanic::Stun) {
            return if triggered {
                DiminishingGroup::TriggeredStun
            } else {
                DiminishingGroup::Stun
            };
        }
        if has(Mechanic::Sleep) {
            return DiminishingGroup::Sleep;
        }
        if has(Mechanic::Polymorph) {
            return DiminishingGroup::Polymorph;
        }
        if has(Mechanic::Root) {
            return if triggered {
                DiminishingGroup::TriggeredRoot
            } else {
                DiminishingGroup::Root
            };
        }
        if has(Mechanic::Fear) {
            return DiminishingGroup::Fear;
        }
        if has(Mechanic::Charm) {
            return DiminishingGroup::Charm;
        }
        if has(Mechanic::Silence) {
            return DiminishingGroup::Silence;
        }
        if has(Mechanic::Disarm) {
            return DiminishingGroup::Disarm;
        }
        if has(Mechanic::Freeze) {
            return DiminishingGroup::Freeze;
        }
        if has(Mechanic::Knockout) || has(Mechanic::Sapped) {
            return DiminishingGroup::KnockoutSap;
        }
        if has(Mechanic::Banish) {
            return DiminishingGroup::Banish;
        }
        if has(Mechanic::Horror) {
            return DiminishingGroup::Horror;
        }
        DiminishingGroup::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spell::SchoolMask;
    use crate::types::{SpellId, UnitId};
    use crate::unit::{Faction, UnitKind};

    fn unit() -> Unit {
        Unit::new(UnitId(1), UnitKind::Player, 10, Faction::Alliance).with_health(100)
    }

    #[test]
    fn stun_is_negative_and_stat_buff_positive() {
        let policy = DefaultPolicy;
        let stun = SpellDefinition::builder(1)
            .aura(EffectIndex::Effect0, AuraType::ModStun, 0, 0)
            .build();
        let buff = SpellDefinition::builder(2)
            .aura(EffectIndex::Effect0, AuraType::ModStat, 10, 0)
            .build();
        let debuff = SpellDefinition::builder(3)
            .aura(EffectIndex::Effect0, AuraType::ModStat, -10, 0)
            .build();
        let taken = SpellDefinition::builder(4)
            .aura(EffectIndex::Effect0, AuraType::ModDamagePercentTaken, -20, 0)
            .build();
        assert!(!policy.is_positive_effect(&stun, EffectIndex::Effect0));
        assert!(policy.is_positive_effect(&buff, EffectIndex::Effect0));
        assert!(!policy.is_positive_effect(&debuff, EffectIndex::Effect0));
        assert!(policy.is_positive_effect(&taken, EffectIndex::Effect0));
    }

    #[test]
    fn school_immunity_blocks_only_harmful_spells() {
        let policy = DefaultPolicy;
        let mut target = unit();
        target
            .immunities
            .apply(ImmunityKind::School, SchoolMask::FIRE.bits(), SpellId(50), true);
        let fireball = SpellDefinition::builder(1)
            .school(SchoolMask::FIRE)
            .attributes(SpellAttributes::NEGATIVE)
            .build();
        let fire_buff = SpellDefinition::builder(2)
            .school(SchoolMask::FIRE)
            .aura(EffectIndex::Effect0, AuraType::ModStat, 5, 0)
            .build();
        assert!(policy.is_immune_to_spell(&target, &fireball));
        assert!(!policy.is_immune_to_spell(&target, &fire_buff));
        assert!(policy.is_immune_to_damage(&target, SchoolMask::FIRE));
    }

    #[test]
    fn negative_flag_wins_without_effects() {
        let policy = DefaultPolicy;
        let empty = SpellDefinition::builder(1).build();
        let flagged = SpellDefinition::builder(2)
            .attributes(SpellAttributes::NEGATIVE)
            .build();
        assert!(policy.is_positive_spell(&empty));
        assert!(!policy.is_positive_spell(&flagged));
    }

    #[test]
    fn mechanic_immunity_on_effect() {
        let policy = DefaultPolicy;
        let mut target = unit();
        target.immunities.apply(
            ImmunityKind::Mechanic,
            Mechanic::Stun.mask_bit(),
            SpellId(60),
            true,
        );
        let mut spell = SpellDefinition::builder(1)
            .aura(EffectIndex::Effect0, AuraType::ModStun, 0, 0)
            .build();
        spell.effects[0].mechanic = Mechanic::Stun;
        assert!(policy.is_immune_to_effect(&target, &spell, EffectIndex::Effect0));
    }

    #[test]
    fn diminishing_groups_by_mechanic() {
        let policy = DefaultPolicy;
        let stun = SpellDefinition::builder(1).mechanic(Mechanic::Stun).build();
        let fear = SpellDefinition::builder(2).mechanic(Mechanic::Fear).build();
        let none = SpellDefinition::builder(3).build();
        assert_eq!(policy.diminishing_group(&stun, false), DiminishingGroup::Stun);
        assert_eq!(policy.diminishing_group(&stun, true), DiminishingGroup::TriggeredStun);
        assert_eq!(policy.diminishing_group(&fear, false), DiminishingGroup::Fear);
        assert_eq!(policy.diminishing_group(&none, false), DiminishingGroup::None);
    }
}
