//! Stat, resistance, rating and spell-modifier handlers.

use crate::aura::{AuraCtx, AuraType};
use crate::engine::SpellEngine;
use crate::spell::{PowerType, SchoolMask, Stat};
use crate::unit::{
    ModifierType, SpellModKind, SpellModOp, SpellModifier, Unit, UnitMod, apply_percent_mod,
};

/// Stats addressed by a stat aura misc value; `-1` means all of them.
fn stats_of(misc: i32) -> Vec<Stat> {
    use strum::IntoEnumIterator;
    if misc < 0 {
        Stat::iter().collect()
    } else {
        u8::try_from(misc)
            .ok()
            .and_then(Stat::from_repr)
            .into_iter()
            .collect()
    }
}

impl SpellEngine<'_> {
    pub(super) fn aura_mod_stat(&mut self, ctx: &AuraCtx, apply: bool) {
        let layer = match ctx.aura_type {
            AuraType::ModPercentStat => ModifierType::BasePct,
            AuraType::ModTotalStatPercentage => ModifierType::TotalPct,
            _ => ModifierType::TotalValue,
        };
        let stats = stats_of(ctx.misc_value);
        let amount = ctx.amount as f32;
        self.with_unit(ctx.target, |unit| {
            for stat in stats {
                unit.stats.handle_modifier(UnitMod::stat(stat), layer, amount, apply);
                unit.update_stat_dependents(stat);
            }
        });
    }

    /// Flat increases grant current health on apply and take the same
    /// amount back on removal, never below 1. A stack recompute nets out to
    /// the change in amount.
    pub(super) fn aura_mod_increase_health(&mut self, ctx: &AuraCtx, apply: bool) {
        let layer = if ctx.aura_type == AuraType::ModIncreaseHealthPercent {
            ModifierType::TotalPct
        } else {
            ModifierType::TotalValue
        };
        let amount = ctx.amount;
        let grants = layer == ModifierType::TotalValue && amount > 0;
        self.with_unit(ctx.target, |unit| {
            if grants && !apply {
                let taken = amount.min(unit.health().saturating_sub(1) as i32);
                unit.modify_health(-taken);
            }
            unit.stats
                .handle_modifier(UnitMod::Health, layer, amount as f32, apply);
            unit.update_max_health();
            if grants && apply {
                unit.modify_health(amount);
            }
        });
    }

    pub(super) fn aura_mod_increase_energy(&mut self, ctx: &AuraCtx, apply: bool) {
        let Some(power) = PowerType::from_misc(ctx.misc_value) else {
            tracing::warn!(spell = %ctx.spell_id(), misc = ctx.misc_value, "unknown power type");
            return;
        };
        let layer = if ctx.aura_type == AuraType::ModIncreaseEnergyPercent {
            ModifierType::TotalPct
        } else {
            ModifierType::TotalValue
        };
        let amount = ctx.amount as f32;
        self.with_unit(ctx.target, |unit| {
            unit.stats.handle_modifier(UnitMod::power(power), layer, amount, apply);
            unit.update_max_power(power);
        });
    }

    pub(super) fn aura_mod_resistance(&mut self, ctx: &AuraCtx, apply: bool) {
        let layer = match ctx.aura_type {
            AuraType::ModBaseResistance => ModifierType::BaseValue,
            AuraType::ModResistancePct => ModifierType::TotalPct,
            AuraType::ModBaseResistancePct => ModifierType::BasePct,
            _ => ModifierType::TotalValue,
        };
        let amount = ctx.amount as f32;
        let mask = SchoolMask::from_misc(ctx.misc_value);
        self.with_unit(ctx.target, |unit| {
            for school in mask.schools() {
                unit.stats
                    .handle_modifier(UnitMod::resistance(school), layer, amount, apply);
            }
        });
    }

    /// Only the strongest exclusive resistance per school counts.
    pub(super) fn aura_mod_resistance_exclusive(&mut self, ctx: &AuraCtx) {
        let mask = SchoolMask::from_misc(ctx.misc_value);
        for school in mask.schools() {
            let best = self
                .world
                .auras_of_type(ctx.target, AuraType::ModResistanceExclusive)
                .filter(|aura| SchoolMask::from_misc(aura.misc_value).intersects(school.mask()))
                .map(|aura| aura.amount)
                .max()
                .unwrap_or(0);
            self.with_unit(ctx.target, |unit| {
                unit.stats.ratings.resistance_exclusive[school.index()] = best;
            });
        }
    }

    pub(super) fn aura_mod_attack_power(&mut self, ctx: &AuraCtx, apply: bool) {
        let (m, layer) = match ctx.aura_type {
            AuraType::ModRangedAttackPower => (UnitMod::AttackPowerRanged, ModifierType::TotalValue),
            AuraType::ModAttackPowerPct => (UnitMod::AttackPower, ModifierType::TotalPct),
            AuraType::ModRangedAttackPowerPct => (UnitMod::AttackPowerRanged, ModifierType::TotalPct),
            _ => (UnitMod::AttackPower, ModifierType::TotalValue),
        };
        let amount = ctx.amount as f32;
        self.with_unit(ctx.target, |unit| {
            unit.stats.handle_modifier(m, layer, amount, apply);
        });
    }

    /// Percentage-point chances, hastes and other unlayered modifiers.
    pub(super) fn aura_mod_rating(&mut self, ctx: &AuraCtx, apply: bool) {
        let ty = ctx.aura_type;
        let value = if apply { ctx.amount as f32 } else { -(ctx.amount as f32) };
        let mask = SchoolMask::from_misc(ctx.misc_value);
        self.with_unit(ctx.target, |unit| {
            let ratings = &mut unit.stats.ratings;
            match ty {
                AuraType::ModParryPercent => ratings.parry_pct += value,
                AuraType::ModDodgePercent => ratings.dodge_pct += value,
                AuraType::ModBlockPercent => ratings.block_pct += value,
                AuraType::ModCritPercent => ratings.crit_pct += value,
                AuraType::ModHitChance => ratings.hit_pct += value,
                AuraType::ModSpellHitChance => ratings.spell_hit_pct += value,
                AuraType::ModSpellCritChance => {
                    for crit in &mut ratings.spell_crit_pct {
                        *crit += value;
                    }
                }
                AuraType::ModSpellCritChanceSchool => {
                    for school in mask.schools() {
                        ratings.spell_crit_pct[school.index()] += value;
                    }
                }
                AuraType::ModCastingSpeedNotStack => ratings.casting_speed_pct += value,
                AuraType::ModAttackspeed | AuraType::ModMeleeHaste => ratings.melee_haste_pct += value,
                AuraType::ModRangedHaste => ratings.ranged_haste_pct += value,
                AuraType::ModRangedAmmoHaste => ratings.ammo_haste_pct += value,
                AuraType::ModOffhandDamagePct => ratings.offhand_damage_pct += value,
                AuraType::ModShieldBlockvalue => ratings.shield_block_value += value,
                AuraType::ModShieldBlockvaluePct => ratings.shield_block_value_pct += value,
                AuraType::ModDetectRange => ratings.detect_range += value as i32,
                AuraType::ModScale => ratings.scale_pct += value,
                AuraType::ModSpellDamageOfStatPercent => {
                    for school in mask.schools() {
                        ratings.spell_damage_of_stat_pct[school.index()] += value;
                    }
                }
                AuraType::ModSpellHealingOfStatPercent => ratings.spell_healing_of_stat_pct += value,
                other => tracing::debug!(aura = %other, "not a rating aura"),
            }
        });
    }

    pub(super) fn aura_mod_power_cost(&mut self, ctx: &AuraCtx, apply: bool) {
        let pct = ctx.aura_type == AuraType::ModPowerCostSchoolPct;
        let amount = ctx.amount;
        let mask = SchoolMask::from_misc(ctx.misc_value);
        self.with_unit(ctx.target, |unit| {
            for school in mask.schools() {
                let i = school.index();
                if pct {
                    unit.stats.ratings.power_cost_pct[i] += if apply { amount as f32 } else { -(amount as f32) };
                } else {
                    unit.stats.ratings.power_cost_flat[i] += if apply { amount } else { -amount };
                }
            }
        });
    }

    /// Generated-threat multiplier per school.
    pub(super) fn aura_mod_threat(&mut self, ctx: &AuraCtx, apply: bool) {
        let mask = SchoolMask::from_misc(ctx.misc_value);
        let amount = ctx.amount as f32;
        self.with_unit(ctx.target, |unit| {
            for school in mask.schools() {
                apply_percent_mod(&mut unit.threat.school_modifiers[school.index()], amount, apply);
            }
        });
    }

    /// Temporary threat on the target in every threat list that holds it.
    pub(super) fn aura_mod_total_threat(&mut self, ctx: &AuraCtx, apply: bool) {
        let target = ctx.target;
        let amount = ctx.amount as f32;
        let holders: Vec<_> = self
            .world
            .units()
            .filter(|u| u.threat.entries().iter().any(|e| e.unit == target))
            .map(|u| u.id)
            .collect();
        for id in holders {
            self.with_unit(id, |unit| {
                if apply {
                    unit.threat.add_temp_threat(target, amount);
                } else {
                    unit.threat.reset_temp_threat(target);
                }
            });
        }
    }

    pub(super) fn aura_add_modifier(&mut self, ctx: &AuraCtx, apply: bool) {
        let Some(op) = SpellModOp::from_misc(ctx.misc_value) else {
            tracing::warn!(spell = %ctx.spell_id(), misc = ctx.misc_value, "unknown spell modifier op");
            return;
        };
        let kind = if ctx.aura_type == AuraType::AddPctModifier {
            SpellModKind::Pct
        } else {
            SpellModKind::Flat
        };
        let modifier = SpellModifier {
            op,
            kind,
            value: ctx.amount,
            family_mask: ctx.effect().family_mask,
            source: ctx.spell_id(),
        };
        self.with_unit(ctx.target, |unit| unit.spell_mods.add(modifier, apply));
    }

    pub(super) fn aura_mod_skill(&mut self, ctx: &AuraCtx, apply: bool) {
        let Ok(skill) = u32::try_from(ctx.misc_value) else {
            return;
        };
        let amount = ctx.amount;
        self.with_unit(ctx.target, |unit: &mut Unit| {
            let bonus = &mut unit.stats.ratings.skill_bonus;
            if apply {
                bonus.push((skill, amount));
            } else if let Some(pos) = bonus.iter().position(|b| *b == (skill, amount)) {
                bonus.remove(pos);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CastRequest;
    use crate::holder::RemovalMode;
    use crate::spell::SpellDefinition;
    use crate::test_utils::Fixture;
    use crate::types::{EffectIndex, SpellId, UnitId};

    fn health_buff(fx: &mut Fixture, stack: u32) -> SpellId {
        fx.spell(
            SpellDefinition::builder(70)
                .stack_amount(stack)
                .aura(EffectIndex::Effect0, AuraType::ModIncreaseHealth, 100, 0)
                .build(),
        )
    }

    fn health_of(fx: &Fixture, unit: UnitId) -> (u32, u32) {
        let unit = fx.unit(unit);
        (unit.health(), unit.max_health())
    }

    #[test]
    fn stat_misc_selects_stats() {
        assert_eq!(stats_of(-1).len(), 5);
        assert_eq!(stats_of(2), vec![Stat::Stamina]);
        assert!(stats_of(9).is_empty());
    }

    #[test]
    fn health_buff_toggles_back_to_the_same_health() {
        let mut fx = Fixture::new();
        let spell = health_buff(&mut fx, 0);
        let unit = fx.creature(1, 0);
        fx.world.unit_mut(unit).expect("unit").set_health(500);
        for _ in 0..3 {
            fx.engine().cast(CastRequest::new(unit, spell)).expect("cast");
            assert_eq!(health_of(&fx, unit), (600, 1100));
            fx.engine().remove_auras_by_spell(unit, spell, RemovalMode::Default);
            assert_eq!(health_of(&fx, unit), (500, 1000));
        }
    }

    #[test]
    fn health_take_back_never_kills() {
        let mut fx = Fixture::new();
        let spell = health_buff(&mut fx, 0);
        let unit = fx.creature(1, 0);
        fx.engine().cast(CastRequest::new(unit, spell)).expect("cast");
        fx.world.unit_mut(unit).expect("unit").set_health(50);
        fx.engine().remove_auras_by_spell(unit, spell, RemovalMode::Default);
        assert_eq!(health_of(&fx, unit), (1, 1000));
        assert!(fx.unit(unit).is_alive());
    }

    #[test]
    fn stacked_health_buff_grants_once_per_stack() {
        let mut fx = Fixture::new();
        let spell = health_buff(&mut fx, 5);
        let unit = fx.creature(1, 0);
        fx.world.unit_mut(unit).expect("unit").set_health(100);
        for _ in 0..3 {
            fx.engine().cast(CastRequest::new(unit, spell)).expect("cast");
        }
        assert_eq!(health_of(&fx, unit), (400, 1300));
        fx.engine().remove_auras_by_spell(unit, spell, RemovalMode::Default);
        assert_eq!(health_of(&fx, unit), (100, 1000));
    }
}
