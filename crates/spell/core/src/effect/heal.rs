//! Healing, power restoration and resurrection.

use crate::aura::AuraType;
use crate::effect::EffectCtx;
use crate::engine::SpellEngine;
use crate::spell::PowerType;
use crate::unit::{CreatureType, PlayerFlags, ResurrectRequest};

fn percent_of(max: u32, pct: i32) -> u32 {
    (u64::from(max) * u64::from(pct.clamp(0, 100) as u32) / 100) as u32
}

impl SpellEngine<'_> {
    pub(super) fn effect_heal(&mut self, ctx: &mut EffectCtx) {
        let Some(target) = self.living_target(ctx) else {
            return;
        };
        let heal = self.healing_done_bonus(ctx.caster, &ctx.spell, ctx.amount.max(0));
        self.heal_with_threat(ctx, target, heal);
    }

    /// Heals for the caster's maximum health (lay on hands).
    pub(super) fn effect_heal_max_health(&mut self, ctx: &mut EffectCtx) {
        let Some(target) = self.living_target(ctx) else {
            return;
        };
        let max = self.world.unit(ctx.caster).map_or(0, |u| u.max_health());
        self.heal_with_threat(ctx, target, max.min(i32::MAX as u32) as i32);
    }

    /// Repairs mechanical targets; everything else is unaffected.
    pub(super) fn effect_heal_mechanical(&mut self, ctx: &mut EffectCtx) {
        let Some(target) = self.living_target(ctx) else {
            return;
        };
        let mechanical = self
            .world
            .unit(target)
            .is_some_and(|u| u.creature_type == CreatureType::Mechanical);
        if !mechanical {
            return;
        }
        let heal = self.healing_done_bonus(ctx.caster, &ctx.spell, ctx.amount.max(0));
        self.heal_with_threat(ctx, target, heal);
    }

    fn heal_with_threat(&mut self, ctx: &EffectCtx, target: crate::types::UnitId, heal: i32) {
        let heal = self.healing_taken_bonus(target, heal).max(0) as u32;
        let gain = self.deal_heal(Some(ctx.caster), target, heal, Some(ctx.spell_id()));
        self.threat_assist(ctx.caster, target, gain as f32, &ctx.spell);
    }

    /// Restores power of the misc type.
    pub(super) fn effect_energize(&mut self, ctx: &mut EffectCtx) {
        let Some(target) = self.living_target(ctx) else {
            return;
        };
        let Some(power) = PowerType::from_misc(ctx.effect().misc_value) else {
            return;
        };
        if self.world.unit(target).is_none_or(|u| u.max_power(power) == 0) {
            return;
        }
        let gain = self
            .with_unit(target, |u| u.modify_power(power, ctx.amount.max(0)))
            .unwrap_or(0);
        self.emit_effect_power(ctx, target, power, gain);
        self.threat_assist(ctx.caster, target, gain as f32 * 0.5, &ctx.spell);
    }

    /// Offers resurrection to a dead player at `amount`% of health and mana.
    pub(super) fn effect_resurrect(&mut self, ctx: &mut EffectCtx) {
        let Some(target) = ctx.target else {
            return;
        };
        let caster = ctx.caster;
        let pct = ctx.amount;
        self.with_unit(target, |u| {
            if u.is_alive() || !u.is_player() || u.resurrect_request.is_some() {
                return;
            }
            u.resurrect_request = Some(ResurrectRequest {
                caster,
                health: percent_of(u.max_health(), pct),
                mana: percent_of(u.max_power(PowerType::Mana), pct),
            });
            u.player_flags.insert(PlayerFlags::RESURRECT_PENDING);
        });
    }

    /// Resurrection offer with absolute health (amount) and mana (misc value).
    pub(super) fn effect_resurrect_new(&mut self, ctx: &mut EffectCtx) {
        let Some(target) = ctx.target else {
            return;
        };
        let caster = ctx.caster;
        let health = ctx.amount.max(0) as u32;
        let mana = ctx.effect().misc_value.max(0) as u32;
        self.with_unit(target, |u| {
            if u.is_alive() || !u.is_player() || u.resurrect_request.is_some() {
                return;
            }
            u.resurrect_request = Some(ResurrectRequest { caster, health, mana });
            u.player_flags.insert(PlayerFlags::RESURRECT_PENDING);
        });
    }

    /// Revives the dead caster. A negative amount is a percentage of the
    /// maximum; the misc value gives mana the same way.
    pub(super) fn effect_self_resurrect(&mut self, ctx: &mut EffectCtx) {
        let Some(unit) = self.world.unit(ctx.caster) else {
            return;
        };
        if unit.is_alive() {
            return;
        }
        let scale = |value: i32, max: u32| {
            if value < 0 {
                percent_of(max, -value)
            } else {
                value as u32
            }
        };
        let health = scale(ctx.amount, unit.max_health());
        let mana = scale(ctx.effect().misc_value, unit.max_power(PowerType::Mana));
        self.revive(ctx.caster, health, mana);
    }

    /// Spirit healer: full health and mana, no confirmation.
    pub(super) fn effect_spirit_heal(&mut self, ctx: &mut EffectCtx) {
        let target = ctx.target_or_caster();
        let Some(unit) = self.world.unit(target) else {
            return;
        };
        if unit.is_alive() || !unit.is_player() {
            return;
        }
        let (health, mana) = (unit.max_health(), unit.max_power(PowerType::Mana));
        self.revive(target, health, mana);
        // Ghost form ends with the spirit.
        let ghost: Vec<_> = self
            .world
            .holders_on(target)
            .filter(|h| h.iter_auras().any(|a| a.aura_type == AuraType::Ghost))
            .map(|h| h.id)
            .collect();
        for id in ghost {
            self.remove_holder(id, crate::holder::RemovalMode::Default);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::effect::SpellEffectKind;
    use crate::engine::CastRequest;
    use crate::spell::{PowerType, SpellAttributes, SpellDefinition, SpellEffectEntry};
    use crate::test_utils::Fixture;
    use crate::types::{EffectIndex, SpellId, UnitId};
    use crate::unit::{CreatureType, DeathState, PlayerFlags};

    fn single(fx: &mut Fixture, id: u32, entry: SpellEffectEntry) -> SpellId {
        fx.spell(SpellDefinition::builder(id).effect(EffectIndex::Effect0, entry).build())
    }

    fn kill(fx: &mut Fixture, unit: UnitId) {
        let u = fx.world.unit_mut(unit).expect("unit");
        u.set_health(0);
        u.death_state = DeathState::Corpse;
    }

    #[test]
    fn heal_restores_health() {
        let mut fx = Fixture::new();
        let spell = single(
            &mut fx,
            90,
            SpellEffectEntry {
                base_points: 300,
                ..SpellEffectEntry::new(SpellEffectKind::Heal)
            },
        );
        let caster = fx.player(1, 0);
        let ally = fx.player(2, 3);
        fx.world.unit_mut(ally).expect("unit").set_health(400);
        fx.engine().cast(CastRequest::new(caster, spell).on(ally)).expect("cast");
        assert_eq!(fx.unit(ally).health(), 700);
    }

    #[test]
    fn mechanical_heal_skips_living_flesh() {
        let mut fx = Fixture::new();
        let spell = single(
            &mut fx,
            91,
            SpellEffectEntry {
                base_points: 100,
                ..SpellEffectEntry::new(SpellEffectKind::HealMechanical)
            },
        );
        let caster = fx.player(1, 0);
        let golem = fx.player(2, 3);
        let human = fx.player(3, 4);
        for unit in [golem, human] {
            fx.world.unit_mut(unit).expect("unit").set_health(500);
        }
        fx.world.unit_mut(golem).expect("unit").creature_type = CreatureType::Mechanical;
        fx.engine().cast(CastRequest::new(caster, spell).on(golem)).expect("cast");
        fx.engine().cast(CastRequest::new(caster, spell).on(human)).expect("cast");
        assert_eq!(fx.unit(golem).health(), 600);
        assert_eq!(fx.unit(human).health(), 500);
    }

    #[test]
    fn energize_fills_the_misc_power() {
        let mut fx = Fixture::new();
        let spell = single(
            &mut fx,
            92,
            SpellEffectEntry {
                base_points: 250,
                misc_value: 0,
                ..SpellEffectEntry::new(SpellEffectKind::Energize)
            },
        );
        let caster = fx.player(1, 0);
        fx.world.unit_mut(caster).expect("unit").set_power(PowerType::Mana, 100);
        fx.engine().cast(CastRequest::new(caster, spell)).expect("cast");
        assert_eq!(fx.unit(caster).power(PowerType::Mana), 350);
    }

    #[test]
    fn resurrect_waits_for_acceptance() {
        let mut fx = Fixture::new();
        let spell = fx.spell(
            SpellDefinition::builder(93)
                .attributes(SpellAttributes::CAN_TARGET_DEAD)
                .effect(
                    EffectIndex::Effect0,
                    SpellEffectEntry {
                        base_points: 35,
                        ..SpellEffectEntry::new(SpellEffectKind::Resurrect)
                    },
                )
                .build(),
        );
        let priest = fx.player(1, 0);
        let corpse = fx.player(2, 3);
        kill(&mut fx, corpse);
        fx.engine().cast(CastRequest::new(priest, spell).on(corpse)).expect("cast");
        assert!(fx.unit(corpse).player_flags.contains(PlayerFlags::RESURRECT_PENDING));
        assert!(!fx.unit(corpse).is_alive());

        assert!(fx.engine().accept_resurrect(corpse).expect("known unit"));
        let unit = fx.unit(corpse);
        assert!(unit.is_alive());
        assert_eq!(unit.health(), 350);
        assert_eq!(unit.power(PowerType::Mana), 350);
        assert!(!unit.player_flags.contains(PlayerFlags::RESURRECT_PENDING));
    }

    #[test]
    fn self_resurrect_uses_negative_amount_as_percent() {
        let mut fx = Fixture::new();
        let spell = fx.spell(
            SpellDefinition::builder(94)
                .attributes(SpellAttributes::CAN_TARGET_DEAD)
                .effect(
                    EffectIndex::Effect0,
                    SpellEffectEntry {
                        base_points: -20,
                        misc_value: 300,
                        ..SpellEffectEntry::new(SpellEffectKind::SelfResurrect)
                    },
                )
                .build(),
        );
        let shaman = fx.player(1, 0);
        kill(&mut fx, shaman);
        fx.engine().cast(CastRequest::new(shaman, spell)).expect("cast");
        assert_eq!(fx.unit(shaman).health(), 200);
        assert_eq!(fx.unit(shaman).power(PowerType::Mana), 300);
    }
}
