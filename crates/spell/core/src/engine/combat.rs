//! Damage, healing and threat arithmetic.
//!
//! Direct effects and periodic ticks share one pipeline:
//!
//! ```text
//! done bonus -> taken bonus -> armor (physical) -> absorb/resist -> deal
//! ```
//!
//! Absorb shields are consumed in place; an exhausted shield takes its holder
//! with it. Split auras then hand a share of what is left to their caster.

use crate::aura::AuraType;
use crate::engine::{SpellEngine, roll_ctx};
use crate::event::SpellEvent;
use crate::holder::RemovalMode;
use crate::spell::{
    AuraInterruptFlags, DispelType, Mechanic, PowerType, SchoolMask, SpellAttributes, SpellDefinition,
    SpellSchool,
};
use crate::types::{EffectIndex, HolderId, SpellId, UnitId};
use crate::unit::{AuraStateFlags, SpellModOp};

/// One damage exchange on its way through mitigation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DamageInfo {
    pub attacker: Option<UnitId>,
    pub victim: UnitId,
    pub school: SchoolMask,
    /// Damage left after mitigation so far.
    pub damage: u32,
    pub absorbed: u32,
    pub resisted: u32,
    pub spell: Option<SpellId>,
    pub periodic: bool,
}

impl DamageInfo {
    pub fn new(attacker: Option<UnitId>, victim: UnitId, school: SchoolMask, damage: u32) -> Self {
        Self {
            attacker,
            victim,
            school,
            damage,
            absorbed: 0,
            resisted: 0,
            spell: None,
            periodic: false,
        }
    }

    pub fn with_spell(mut self, spell: SpellId) -> Self {
        self.spell = Some(spell);
        self
    }

    pub fn periodic(mut self) -> Self {
        self.periodic = true;
        self
    }
}

/// Fraction of physical damage removed by `armor` against an attacker of `attacker_level`.
pub fn armor_reduction(armor: i32, attacker_level: u32) -> f32 {
    if armor <= 0 {
        return 0.0;
    }
    let armor = armor as f32;
    let reduction = armor / (armor + 400.0 + 85.0 * attacker_level as f32);
    reduction.clamp(0.0, 0.75)
}

/// Weights of the 0/25/50/75 % resist outcomes; the remainder resists fully.
const RESIST_DIVISORS: [f32; 4] = [24.0, 6.0, 4.0, 6.0];

struct Absorber {
    holder: HolderId,
    index: EffectIndex,
    aura_type: AuraType,
    amount: i32,
    mana_per_point: f32,
}

impl SpellEngine<'_> {
    fn aura_multiplier(&self, unit: UnitId, ty: AuraType) -> f32 {
        self.world
            .auras_of_type(unit, ty)
            .fold(1.0, |acc, aura| acc * (100.0 + aura.amount as f32) / 100.0)
    }

    // ========================================================================
    // Bonuses
    // ========================================================================

    /// Caster-side damage modifiers. Flat bonuses only apply to direct hits.
    pub(crate) fn damage_done_bonus(
        &self,
        caster: UnitId,
        spell: &SpellDefinition,
        amount: i32,
        periodic: bool,
    ) -> i32 {
        let Some(unit) = self.world.unit(caster) else {
            return amount;
        };
        let mask = spell.school_mask.bits();
        let mut value = amount as f32;
        if !periodic {
            value += self
                .world
                .total_aura_modifier_by_misc_mask(caster, AuraType::ModDamageDone, mask) as f32;
        }
        value *= self
            .world
            .total_aura_multiplier_by_misc_mask(caster, AuraType::ModDamagePercentDone, mask);
        let op = if periodic { SpellModOp::Dot } else { SpellModOp::Damage };
        let value = unit.spell_mods.apply_f32(spell, op, value);
        value.max(0.0) as i32
    }

    /// Victim-side damage modifiers.
    pub(crate) fn damage_taken_bonus(&self, target: UnitId, school: SchoolMask, amount: i32) -> i32 {
        let mask = school.bits();
        let flat = self
            .world
            .total_aura_modifier_by_misc_mask(target, AuraType::ModDamageTaken, mask);
        let pct = self
            .world
            .total_aura_multiplier_by_misc_mask(target, AuraType::ModDamagePercentTaken, mask);
        (((amount + flat) as f32) * pct).max(0.0) as i32
    }

    pub(crate) fn healing_done_bonus(&self, caster: UnitId, spell: &SpellDefinition, amount: i32) -> i32 {
        let Some(unit) = self.world.unit(caster) else {
            return amount;
        };
        let flat = self.world.total_aura_modifier_by_misc_mask(
            caster,
            AuraType::ModHealingDone,
            spell.school_mask.bits(),
        );
        let value = (amount + flat) as f32 * self.aura_multiplier(caster, AuraType::ModHealingDonePercent);
        unit.spell_mods
            .apply_f32(spell, SpellModOp::Damage, value)
            .max(0.0) as i32
    }

    pub(crate) fn healing_taken_bonus(&self, target: UnitId, amount: i32) -> i32 {
        let flat = self.world.total_aura_modifier(target, AuraType::ModHealing);
        let value = (amount + flat) as f32 * self.aura_multiplier(target, AuraType::ModHealingPct);
        value.max(0.0) as i32
    }

    // ========================================================================
    // Mitigation
    // ========================================================================

    pub(crate) fn apply_armor(&self, info: &mut DamageInfo) {
        let Some(victim) = self.world.unit(info.victim) else {
            return;
        };
        let level = info
            .attacker
            .and_then(|id| self.world.unit(id))
            .map_or(victim.level, |a| a.level);
        let armor = victim.stats.resistance(SpellSchool::Normal);
        let reduction = armor_reduction(armor, level);
        info.damage = (info.damage as f32 * (1.0 - reduction)) as u32;
    }

    /// Rolls magic resistance, then consumes absorb shields of the victim.
    pub(crate) fn calc_absorb_resist(&mut self, info: &mut DamageInfo, spell: Option<&SpellDefinition>) {
        if info.damage == 0 {
            return;
        }
        let Some(victim) = self.world.unit(info.victim) else {
            return;
        };
        let ignores = spell.is_some_and(|s| s.attributes.contains(SpellAttributes::IGNORE_IMMUNITY));
        if !info.school.contains(SchoolMask::NORMAL) && !ignores {
            let level = info
                .attacker
                .and_then(|id| self.world.unit(id))
                .map_or(victim.level, |a| a.level)
                .max(1);
            let penetration = info.attacker.map_or(0, |attacker| {
                self.world
                    .total_aura_modifier_by_misc_mask(attacker, AuraType::ModTargetResistance, info.school.bits())
            });
            let resistance = (victim.stats.resistance(info.school.first_school()) + penetration).max(0);
            let chance = (resistance as f32 * 0.15 / level as f32).clamp(0.0, 0.75);
            if chance > 0.0 {
                let roll = self.roll_range(info.victim, roll_ctx::RESIST, 0, 100) as f32;
                let mut quarters = 0u32;
                let mut cumulative = 0.0;
                for (i, divisor) in RESIST_DIVISORS.iter().enumerate() {
                    cumulative += 2400.0 * chance.powi(i as i32) * (1.0 - chance).powi(4 - i as i32) / divisor;
                    if roll > cumulative {
                        quarters += 1;
                    } else {
                        break;
                    }
                }
                let resisted = if info.periodic && quarters == 4 {
                    info.damage.saturating_sub(1)
                } else {
                    info.damage * quarters / 4
                };
                info.resisted += resisted;
                info.damage -= resisted;
            }
        }

        let school = info.school.bits();
        let absorbers: Vec<Absorber> = self
            .world
            .listed_auras(info.victim)
            .filter(|(_, aura)| {
                matches!(aura.aura_type, AuraType::SchoolAbsorb | AuraType::ManaShield)
                    && aura.misc_value as u32 & school != 0
                    && aura.amount > 0
            })
            .map(|(holder, aura)| Absorber {
                holder: holder.id,
                index: aura.effect_index,
                aura_type: aura.aura_type,
                amount: aura.amount,
                mana_per_point: holder.spell.effect(aura.effect_index).transfer_multiplier(),
            })
            .collect();

        let mut exhausted = Vec::new();
        for absorber in absorbers {
            if info.damage == 0 {
                break;
            }
            let mut absorb = info.damage.min(absorber.amount as u32);
            if absorber.aura_type == AuraType::ManaShield {
                let mana = self.world.unit(info.victim).map_or(0, |u| u.power(PowerType::Mana));
                absorb = absorb.min((mana as f32 / absorber.mana_per_point) as u32);
                let cost = (absorb as f32 * absorber.mana_per_point) as i32;
                self.with_unit(info.victim, |u| u.modify_power(PowerType::Mana, -cost));
            }
            if absorb == 0 {
                continue;
            }
            info.damage -= absorb;
            info.absorbed += absorb;
            if let Some(aura) = self.world.aura_mut(absorber.holder, absorber.index) {
                aura.amount -= absorb as i32;
                if aura.amount <= 0 {
                    exhausted.push(absorber.holder);
                }
            }
        }
        for holder in exhausted {
            tracing::debug!(%holder, "absorb shield exhausted");
            self.remove_holder(holder, RemovalMode::Default);
        }
        self.split_damage(info);
    }

    /// Redirects shares of the damage to the casters of the victim's split auras.
    fn split_damage(&mut self, info: &mut DamageInfo) {
        let school = info.school.bits();
        let splits: Vec<(UnitId, AuraType, u32, SpellId)> = self
            .world
            .listed_auras(info.victim)
            .filter(|(_, aura)| {
                matches!(aura.aura_type, AuraType::SplitDamagePct | AuraType::SplitDamageFlat)
                    && aura.misc_value as u32 & school != 0
                    && aura.amount > 0
            })
            .map(|(holder, aura)| (holder.caster, aura.aura_type, aura.amount as u32, holder.spell.id))
            .collect();
        for (caster, aura_type, amount, spell) in splits {
            if info.damage == 0 {
                break;
            }
            if caster == info.victim || !self.is_alive(caster) {
                continue;
            }
            let share = if aura_type == AuraType::SplitDamagePct {
                (u64::from(info.damage) * u64::from(amount.min(100)) / 100) as u32
            } else {
                info.damage.min(amount)
            };
            if share == 0 {
                continue;
            }
            info.damage -= share;
            let mut redirected = DamageInfo::new(info.attacker, caster, info.school, share).with_spell(spell);
            redirected.periodic = info.periodic;
            tracing::trace!(victim = %info.victim, %caster, share, "damage split");
            self.deal_damage(&redirected);
        }
    }

    /// Chance in percent that `target` shrugs off a harmful `spell`, summed
    /// from mechanic and debuff resistance auras.
    pub(crate) fn spell_resist_chance(&self, target: UnitId, spell: &SpellDefinition) -> i32 {
        let by_misc = |ty: AuraType, misc: i32| -> i32 {
            self.world
                .auras_of_type(target, ty)
                .filter(|aura| aura.misc_value == misc)
                .map(|aura| aura.amount)
                .sum()
        };
        let mut chance = 0;
        if spell.mechanic != Mechanic::None {
            chance += by_misc(AuraType::ModMechanicResistance, spell.mechanic as i32);
        }
        if spell.dispel != DispelType::None {
            chance += by_misc(AuraType::ModDebuffResistance, spell.dispel as i32);
        }
        chance
    }

    // ========================================================================
    // Dealing
    // ========================================================================

    /// Applies mitigated damage. Returns the health actually removed.
    pub(crate) fn deal_damage(&mut self, info: &DamageInfo) -> u32 {
        let Some(victim) = self.world.unit(info.victim) else {
            return 0;
        };
        if !victim.is_alive() {
            return 0;
        }
        let dealt = info.damage.min(victim.health());
        self.with_unit(info.victim, |u| u.modify_health(-(dealt as i32)));
        self.refresh_health_states(info.victim);

        if !info.periodic {
            self.emit(SpellEvent::SpellDamage {
                caster: info.attacker,
                target: info.victim,
                spell: info.spell,
                school: info.school,
                amount: dealt,
                absorbed: info.absorbed,
                resisted: info.resisted,
            });
        }
        if info.damage > 0 {
            self.remove_auras_with_interrupt_flags(info.victim, AuraInterruptFlags::DAMAGE, info.spell);
        }
        if let Some(attacker) = info.attacker
            && attacker != info.victim
        {
            match info.spell.and_then(|id| self.spells.spell(id)) {
                Some(spell) => self.add_threat(info.victim, attacker, dealt as f32, &spell),
                None => self.add_raw_threat(info.victim, attacker, dealt as f32, info.school),
            }
        }

        if self.world.unit(info.victim).is_some_and(|u| u.health() == 0) {
            self.kill_unit(info.victim, info.attacker);
        }
        dealt
    }

    /// Heals a living unit. Returns the health actually gained.
    pub(crate) fn deal_heal(
        &mut self,
        caster: Option<UnitId>,
        target: UnitId,
        amount: u32,
        spell: Option<SpellId>,
    ) -> u32 {
        if !self.is_alive(target) {
            return 0;
        }
        let gain = self
            .with_unit(target, |u| u.modify_health(amount.min(i32::MAX as u32) as i32))
            .unwrap_or(0)
            .max(0) as u32;
        self.refresh_health_states(target);
        if let Some(spell) = spell {
            self.emit(SpellEvent::Heal {
                caster,
                target,
                spell,
                amount: gain,
            });
        }
        gain
    }

    fn refresh_health_states(&mut self, unit: UnitId) {
        self.with_unit(unit, |u| {
            let pct = u.health_pct();
            let alive = u.health() > 0;
            u.aura_state.set(AuraStateFlags::HEALTHLESS_20, alive && pct < 20.0);
            u.aura_state.set(AuraStateFlags::HEALTHLESS_35, alive && pct < 35.0);
        });
    }

    // ========================================================================
    // Threat
    // ========================================================================

    /// Threat `attacker` generates on `victim` with `spell`.
    pub(crate) fn add_threat(&mut self, victim: UnitId, attacker: UnitId, amount: f32, spell: &SpellDefinition) {
        if spell.attributes.contains(SpellAttributes::NO_THREAT) {
            return;
        }
        let amount = self
            .world
            .unit(attacker)
            .map_or(amount, |a| a.spell_mods.apply_f32(spell, SpellModOp::Threat, amount));
        self.add_raw_threat(victim, attacker, amount, spell.school_mask);
    }

    fn add_raw_threat(&mut self, victim: UnitId, attacker: UnitId, amount: f32, school: SchoolMask) {
        if victim == attacker || amount <= 0.0 {
            return;
        }
        let Some(source) = self.world.unit(attacker) else {
            return;
        };
        if !source.is_alive() {
            return;
        }
        let amount = amount * source.threat.school_multiplier(school);
        self.with_unit(victim, |u| {
            if u.is_alive() && u.can_have_threat_list() {
                u.threat.add_threat(attacker, amount);
            }
        });
    }

    /// Helping `helped` earns `helper` a share of threat on everyone fighting `helped`.
    pub(crate) fn threat_assist(&mut self, helper: UnitId, helped: UnitId, amount: f32, spell: &SpellDefinition) {
        if amount <= 0.0 || spell.attributes.contains(SpellAttributes::NO_THREAT) {
            return;
        }
        let Some(helper_unit) = self.world.unit(helper) else {
            return;
        };
        let enemies: Vec<UnitId> = self
            .world
            .units()
            .filter(|u| u.is_alive() && u.is_hostile_to(helper_unit))
            .filter(|u| u.threat.entries().iter().any(|e| e.unit == helped))
            .map(|u| u.id)
            .collect();
        if enemies.is_empty() {
            return;
        }
        let total = amount * self.config.periodic_threat_pct as f32 / 100.0;
        let share = total / enemies.len() as f32;
        for enemy in enemies {
            self.add_threat(enemy, helper, share, spell);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::SpellEffectKind;
    use crate::engine::CastRequest;
    use crate::spell::{ImplicitTarget, SpellEffectEntry};
    use crate::test_utils::Fixture;
    use crate::unit::{Faction, Unit, UnitKind};

    #[test]
    fn armor_reduction_caps_at_three_quarters() {
        assert_eq!(armor_reduction(0, 60), 0.0);
        let half = armor_reduction(400 + 85 * 60, 60);
        assert!((half - 0.5).abs() < 1e-6);
        assert_eq!(armor_reduction(1_000_000, 1), 0.75);
    }

    #[test]
    fn school_absorb_soaks_damage_and_expires_when_spent() {
        let mut fx = Fixture::new();
        let shield = fx.spell(
            SpellDefinition::builder(10)
                .effect(
                    EffectIndex::Effect0,
                    SpellEffectEntry {
                        aura: AuraType::SchoolAbsorb,
                        base_points: 100,
                        misc_value: SchoolMask::FIRE.bits() as i32,
                        target: ImplicitTarget::Caster,
                        ..SpellEffectEntry::new(SpellEffectKind::ApplyAura)
                    },
                )
                .build(),
        );
        let victim = fx.player(1, 0);
        fx.engine()
            .cast(CastRequest::new(victim, shield))
            .expect("shield cast");

        let mut engine = fx.engine();
        let mut info = DamageInfo::new(None, victim, SchoolMask::FIRE, 60);
        engine.calc_absorb_resist(&mut info, None);
        assert_eq!((info.damage, info.absorbed), (0, 60));

        let mut info = DamageInfo::new(None, victim, SchoolMask::FIRE, 60);
        engine.calc_absorb_resist(&mut info, None);
        assert_eq!((info.damage, info.absorbed), (20, 40));
        drop(engine);
        assert!(!fx.world.has_holder_of_spell(victim, shield));
    }

    #[test]
    fn physical_damage_ignores_resist_roll() {
        let mut fx = Fixture::new().with_fixed_rng(99);
        let victim = fx.player(1, 0);
        let mut engine = fx.engine();
        let mut info = DamageInfo::new(None, victim, SchoolMask::NORMAL, 80);
        engine.calc_absorb_resist(&mut info, None);
        assert_eq!((info.damage, info.resisted), (80, 0));
    }

    #[test]
    fn lethal_damage_kills_and_credits_threat() {
        let mut fx = Fixture::new();
        let attacker = fx.player(1, 0);
        let victim = fx.creature(2, 5);
        let mut engine = fx.engine();
        let dealt = engine.deal_damage(&DamageInfo::new(Some(attacker), victim, SchoolMask::NORMAL, 300));
        assert_eq!(dealt, 300);
        assert_eq!(engine.world().unit(victim).map(|u| u.threat.threat(attacker)), Some(300.0));

        let dealt = engine.deal_damage(&DamageInfo::new(Some(attacker), victim, SchoolMask::NORMAL, 5000));
        assert_eq!(dealt, 700);
        drop(engine);
        assert!(!fx.unit(victim).is_alive());
        assert!(fx.world.events().iter().any(|e| matches!(
            e,
            SpellEvent::UnitDied { unit, killer: Some(k) } if *unit == victim && *k == attacker
        )));
    }

    #[test]
    fn assist_threat_is_split_between_enemies() {
        let mut fx = Fixture::new();
        let healer = fx.player(1, 0);
        let tank = fx.player(2, 0);
        for id in [3, 4] {
            fx.world.add_unit(
                Unit::new(UnitId(id), UnitKind::Creature, 60, Faction::Hostile).with_health(100),
            );
            fx.world
                .unit_mut(UnitId(id))
                .expect("unit")
                .threat
                .add_threat(tank, 10.0);
        }
        let spell = SpellDefinition::builder(1).build();
        let mut engine = fx.engine();
        engine.threat_assist(healer, tank, 200.0, &spell);
        drop(engine);
        // 50% of 200 split over two enemies.
        assert_eq!(fx.unit(UnitId(3)).threat.threat(healer), 50.0);
        assert_eq!(fx.unit(UnitId(4)).threat.threat(healer), 50.0);
    }

    fn self_aura(fx: &mut Fixture, id: u32, aura: AuraType, base_points: i32, misc_value: i32) -> SpellId {
        fx.spell(
            SpellDefinition::builder(id)
                .effect(
                    EffectIndex::Effect0,
                    SpellEffectEntry {
                        aura,
                        base_points,
                        misc_value,
                        target: ImplicitTarget::Caster,
                        ..SpellEffectEntry::new(SpellEffectKind::ApplyAura)
                    },
                )
                .build(),
        )
    }

    #[test]
    fn split_damage_hands_half_to_the_protector() {
        let mut fx = Fixture::new();
        let split = fx.spell(
            SpellDefinition::builder(30)
                .effect(
                    EffectIndex::Effect0,
                    SpellEffectEntry {
                        aura: AuraType::SplitDamagePct,
                        base_points: 50,
                        misc_value: SchoolMask::FIRE.bits() as i32,
                        ..SpellEffectEntry::new(SpellEffectKind::ApplyAura)
                    },
                )
                .build(),
        );
        let protector = fx.player(1, 0);
        let ward = fx.player(2, 5);
        fx.engine()
            .cast(CastRequest::new(protector, split).on(ward))
            .expect("cast");

        let mut engine = fx.engine();
        let mut info = DamageInfo::new(None, ward, SchoolMask::FIRE, 100);
        engine.calc_absorb_resist(&mut info, None);
        assert_eq!(info.damage, 50);
        let mut frost = DamageInfo::new(None, ward, SchoolMask::FROST, 100);
        engine.calc_absorb_resist(&mut frost, None);
        assert_eq!(frost.damage, 100);
        drop(engine);
        assert_eq!(fx.unit(protector).health(), 950);
    }

    #[test]
    fn target_resistance_aura_cancels_victim_resistance() {
        let mut fx = Fixture::new().with_fixed_rng(99);
        let attacker = fx.player(1, 0);
        let victim = fx.player(2, 5);
        fx.world
            .unit_mut(victim)
            .expect("unit")
            .stats
            .set_base(crate::unit::UnitMod::ResistFire, 300.0);

        let mut engine = fx.engine();
        let mut info = DamageInfo::new(Some(attacker), victim, SchoolMask::FIRE, 80);
        engine.calc_absorb_resist(&mut info, None);
        assert_eq!((info.damage, info.resisted), (0, 80));
        drop(engine);

        let penetration = self_aura(
            &mut fx,
            31,
            AuraType::ModTargetResistance,
            -300,
            SchoolMask::FIRE.bits() as i32,
        );
        fx.engine()
            .cast(CastRequest::new(attacker, penetration))
            .expect("cast");
        let mut engine = fx.engine();
        let mut info = DamageInfo::new(Some(attacker), victim, SchoolMask::FIRE, 80);
        engine.calc_absorb_resist(&mut info, None);
        assert_eq!((info.damage, info.resisted), (80, 0));
    }

    #[test]
    fn mechanic_resistance_shrugs_off_stuns() {
        let mut fx = Fixture::new();
        let resist = self_aura(
            &mut fx,
            32,
            AuraType::ModMechanicResistance,
            100,
            Mechanic::Stun as i32,
        );
        let stun = fx.spell(
            SpellDefinition::builder(33)
                .mechanic(Mechanic::Stun)
                .aura(EffectIndex::Effect0, AuraType::ModStun, 0, 0)
                .build(),
        );
        let caster = fx.player(1, 0);
        let target = fx.creature(2, 5);
        fx.engine().cast(CastRequest::new(target, resist)).expect("cast");

        let outcome = fx
            .engine()
            .cast(CastRequest::new(caster, stun).on(target))
            .expect("cast");
        assert_eq!(outcome.resisted, vec![target]);
        assert!(outcome.holders.is_empty());
        assert!(!fx.world.has_holder_of_spell(target, stun));
        assert!(fx
            .world
            .events()
            .iter()
            .any(|e| matches!(e, SpellEvent::Resisted { target: t, .. } if *t == target)));
    }
}
