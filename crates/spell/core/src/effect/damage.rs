//! Direct damage, drains and leeches.
//!
//! School and weapon damage only accumulate into [`EffectCtx::damage`]; the
//! cast mitigates and deals the total once every effect on the target ran.

use crate::effect::{EffectCtx, SpellEffectKind};
use crate::engine::{DamageInfo, SpellEngine};
use crate::event::SpellEvent;
use crate::spell::{PowerType, SchoolMask};
use crate::unit::WeaponAttack;

impl SpellEngine<'_> {
    /// Kills outright; no mitigation.
    pub(super) fn effect_instakill(&mut self, ctx: &mut EffectCtx) {
        let Some(target) = self.living_target(ctx) else {
            return;
        };
        let health = self.world.unit(target).map_or(0, |u| u.health());
        let info = DamageInfo::new(Some(ctx.caster), target, ctx.spell.school_mask, health)
            .with_spell(ctx.spell_id());
        self.deal_damage(&info);
    }

    pub(super) fn effect_school_damage(&mut self, ctx: &mut EffectCtx) {
        let Some(target) = self.living_target(ctx) else {
            return;
        };
        let school = ctx.spell.school_mask;
        let damage = self.damage_done_bonus(ctx.caster, &ctx.spell, ctx.amount.max(0), false);
        let damage = self.damage_taken_bonus(target, school, damage);
        ctx.damage = ctx.damage.saturating_add(damage.max(0) as u32);
    }

    /// Damage from the world rather than the caster: no bonuses, no threat.
    pub(super) fn effect_environmental_damage(&mut self, ctx: &mut EffectCtx) {
        let Some(target) = self.living_target(ctx) else {
            return;
        };
        let mut info = DamageInfo::new(None, target, ctx.spell.school_mask, ctx.amount.max(0) as u32)
            .with_spell(ctx.spell_id());
        self.calc_absorb_resist(&mut info, Some(&*ctx.spell));
        self.deal_damage(&info);
    }

    /// Removes power of the misc type; the caster gains it times the multiplier.
    pub(super) fn effect_power_drain(&mut self, ctx: &mut EffectCtx) {
        let Some(target) = self.living_target(ctx) else {
            return;
        };
        let Some(power) = PowerType::from_misc(ctx.effect().misc_value) else {
            return;
        };
        if self.world.unit(target).is_none_or(|u| u.max_power(power) == 0) {
            return;
        }
        let drained = -self
            .with_unit(target, |u| u.modify_power(power, -ctx.amount.max(0)))
            .unwrap_or(0);
        if drained == 0 {
            return;
        }
        self.emit_effect_power(ctx, target, power, -drained);

        let gain_amount = (drained as f32 * self.effect_transfer_multiplier(ctx)) as i32;
        let gain = self
            .with_unit(ctx.caster, |u| u.modify_power(power, gain_amount))
            .unwrap_or(0);
        self.emit_effect_power(ctx, ctx.caster, power, gain);
        if power == PowerType::Mana {
            self.add_threat(target, ctx.caster, gain as f32 * 0.5, &ctx.spell);
        }
    }

    pub(super) fn effect_health_leech(&mut self, ctx: &mut EffectCtx) {
        let Some(target) = self.living_target(ctx) else {
            return;
        };
        let school = ctx.spell.school_mask;
        let damage = self.damage_done_bonus(ctx.caster, &ctx.spell, ctx.amount.max(0), false);
        let damage = self.damage_taken_bonus(target, school, damage);
        let mut info = DamageInfo::new(Some(ctx.caster), target, school, damage.max(0) as u32)
            .with_spell(ctx.spell_id());
        self.calc_absorb_resist(&mut info, Some(&*ctx.spell));
        let dealt = self.deal_damage(&info);

        let heal = (dealt as f32 * self.effect_transfer_multiplier(ctx)) as i32;
        let heal = self.healing_taken_bonus(ctx.caster, heal);
        self.deal_heal(Some(ctx.caster), ctx.caster, heal.max(0) as u32, Some(ctx.spell_id()));
    }

    /// Weapon strikes roll the main-hand range. Flat variants add the
    /// amount; the percent variant scales the roll by it.
    pub(super) fn effect_weapon_damage(&mut self, ctx: &mut EffectCtx) {
        let Some(target) = self.living_target(ctx) else {
            return;
        };
        let Some(range) = self
            .world
            .unit(ctx.caster)
            .map(|u| u.weapons[WeaponAttack::Base.index()])
        else {
            return;
        };
        let roll = self.roll_range(ctx.caster, crate::engine::roll_ctx::DICE, range.min, range.max) as i32;
        let damage = if ctx.kind() == SpellEffectKind::WeaponPercentDamage {
            roll * ctx.amount.max(0) / 100
        } else {
            roll + ctx.amount
        };
        let school = if ctx.kind() == SpellEffectKind::WeaponDamageNoschool {
            SchoolMask::NORMAL
        } else {
            ctx.spell.school_mask
        };
        let damage = self.damage_taken_bonus(target, school, damage.max(0));
        ctx.damage = ctx.damage.saturating_add(damage.max(0) as u32);
    }

    /// Burns power of the target's own type; the burnt amount times the
    /// multiplier becomes damage.
    pub(super) fn effect_power_burn(&mut self, ctx: &mut EffectCtx) {
        let Some(target) = self.living_target(ctx) else {
            return;
        };
        let Some(power) = PowerType::from_misc(ctx.effect().misc_value) else {
            return;
        };
        if self.world.unit(target).is_none_or(|u| u.power_type != power) {
            return;
        }
        let burnt = -self
            .with_unit(target, |u| u.modify_power(power, -ctx.amount.max(0)))
            .unwrap_or(0);
        self.emit_effect_power(ctx, target, power, -burnt);
        let damage = (burnt as f32 * self.effect_transfer_multiplier(ctx)) as u32;
        ctx.damage = ctx.damage.saturating_add(damage);
    }

    pub(super) fn emit_effect_power(&mut self, ctx: &EffectCtx, unit: crate::types::UnitId, power: PowerType, delta: i32) {
        if delta == 0 {
            return;
        }
        self.emit(SpellEvent::PowerChange {
            unit,
            spell: ctx.spell_id(),
            power,
            delta,
        });
    }
}

#[cfg(test)]
mod tests {
    use crate::effect::SpellEffectKind;
    use crate::engine::CastRequest;
    use crate::spell::{PowerType, SchoolMask, SpellDefinition, SpellEffectEntry};
    use crate::test_utils::Fixture;
    use crate::types::{EffectIndex, Position, UnitId};
    use crate::unit::{DeathState, Faction, Unit, UnitKind, WeaponAttack};

    fn single(fx: &mut Fixture, id: u32, entry: SpellEffectEntry) -> crate::types::SpellId {
        fx.spell(
            SpellDefinition::builder(id)
                .school(SchoolMask::SHADOW)
                .effect(EffectIndex::Effect0, entry)
                .build(),
        )
    }

    #[test]
    fn instakill_ignores_health_pool() {
        let mut fx = Fixture::new();
        let spell = single(&mut fx, 80, SpellEffectEntry::new(SpellEffectKind::Instakill));
        let caster = fx.player(1, 0);
        let target = fx.creature(2, 5);
        fx.engine().cast(CastRequest::new(caster, spell).on(target)).expect("cast");
        assert_eq!(fx.unit(target).death_state, DeathState::JustDied);
    }

    #[test]
    fn health_leech_heals_the_caster() {
        let mut fx = Fixture::new();
        let spell = single(
            &mut fx,
            81,
            SpellEffectEntry {
                base_points: 200,
                multiple_value: 0.5,
                ..SpellEffectEntry::new(SpellEffectKind::HealthLeech)
            },
        );
        let caster = fx.player(1, 0);
        let target = fx.creature(2, 5);
        fx.world.unit_mut(caster).expect("unit").set_health(500);
        fx.engine().cast(CastRequest::new(caster, spell).on(target)).expect("cast");
        assert_eq!(fx.unit(target).health(), 800);
        assert_eq!(fx.unit(caster).health(), 600);
    }

    #[test]
    fn power_drain_moves_mana() {
        let mut fx = Fixture::new();
        let spell = single(
            &mut fx,
            82,
            SpellEffectEntry {
                base_points: 150,
                misc_value: 0,
                ..SpellEffectEntry::new(SpellEffectKind::PowerDrain)
            },
        );
        let caster = fx.player(1, 0);
        let target = fx.world.add_unit(
            Unit::new(UnitId(2), UnitKind::Creature, 60, Faction::Hostile)
                .with_health(1000)
                .with_power(PowerType::Mana, 400)
                .at(Position::new(5, 0)),
        );
        fx.world.unit_mut(caster).expect("unit").set_power(PowerType::Mana, 100);
        fx.engine().cast(CastRequest::new(caster, spell).on(target)).expect("cast");
        assert_eq!(fx.unit(target).power(PowerType::Mana), 250);
        assert_eq!(fx.unit(caster).power(PowerType::Mana), 250);
    }

    #[test]
    fn power_burn_requires_matching_power() {
        let mut fx = Fixture::new();
        let spell = single(
            &mut fx,
            83,
            SpellEffectEntry {
                base_points: 300,
                misc_value: 0,
                ..SpellEffectEntry::new(SpellEffectKind::PowerBurn)
            },
        );
        let caster = fx.player(1, 0);
        let warrior = fx.world.add_unit(
            Unit::new(UnitId(2), UnitKind::Creature, 60, Faction::Hostile)
                .with_health(1000)
                .with_power(PowerType::Rage, 100)
                .at(Position::new(5, 0)),
        );
        fx.engine().cast(CastRequest::new(caster, spell).on(warrior)).expect("cast");
        assert_eq!(fx.unit(warrior).health(), 1000);

        let mage = fx.world.add_unit(
            Unit::new(UnitId(3), UnitKind::Creature, 60, Faction::Hostile)
                .with_health(1000)
                .with_power(PowerType::Mana, 200)
                .at(Position::new(6, 0)),
        );
        fx.engine().cast(CastRequest::new(caster, spell).on(mage)).expect("cast");
        assert_eq!(fx.unit(mage).power(PowerType::Mana), 0);
        assert_eq!(fx.unit(mage).health(), 800);
    }

    #[test]
    fn weapon_damage_adds_to_the_roll() {
        let mut fx = Fixture::new().with_fixed_rng(0);
        let spell = fx.spell(
            SpellDefinition::builder(84)
                .effect(
                    EffectIndex::Effect0,
                    SpellEffectEntry {
                        base_points: 50,
                        ..SpellEffectEntry::new(SpellEffectKind::WeaponDamageNoschool)
                    },
                )
                .build(),
        );
        let caster = fx.world.add_unit(
            Unit::new(UnitId(1), UnitKind::Player, 60, Faction::Alliance)
                .with_health(1000)
                .with_weapon(WeaponAttack::Base, 100, 100),
        );
        let target = fx.creature(2, 3);
        fx.engine().cast(CastRequest::new(caster, spell).on(target)).expect("cast");
        assert_eq!(fx.unit(target).health(), 850);
    }
}
