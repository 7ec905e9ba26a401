//! Threat list manipulation and combat targeting.

use crate::effect::EffectCtx;
use crate::engine::SpellEngine;
use crate::unit::{PlayerFlags, UnitState};

impl SpellEngine<'_> {
    pub(super) fn effect_threat(&mut self, ctx: &mut EffectCtx) {
        let Some(target) = self.living_target(ctx) else {
            return;
        };
        if target == ctx.caster {
            return;
        }
        self.add_threat(target, ctx.caster, ctx.amount as f32, &ctx.spell);
    }

    /// Scales the caster's entry on the target by `amount`%.
    pub(super) fn effect_modify_threat_percent(&mut self, ctx: &mut EffectCtx) {
        let Some(target) = self.living_target(ctx) else {
            return;
        };
        let (caster, pct) = (ctx.caster, ctx.amount);
        self.with_unit(target, |u| u.threat.modify_threat_percent(caster, pct));
    }

    /// Taunt: the caster takes the lead on the target's threat list.
    pub(super) fn effect_attack_me(&mut self, ctx: &mut EffectCtx) {
        let Some(target) = self.living_target(ctx) else {
            return;
        };
        let caster = ctx.caster;
        self.with_unit(target, |u| {
            if !u.can_have_threat_list() {
                return;
            }
            u.threat.raise_to_top(caster);
            u.threat.taunted_by = Some(caster);
            u.victim = Some(caster);
        });
    }

    pub(super) fn effect_attack(&mut self, ctx: &mut EffectCtx) {
        let Some(target) = self.living_target(ctx) else {
            return;
        };
        self.with_unit(ctx.caster, |u| u.victim = Some(target));
    }

    /// Drops the caster from every threat list and marks it untargetable
    /// until it acts again.
    pub(super) fn effect_sanctuary(&mut self, ctx: &mut EffectCtx) {
        let caster = ctx.caster;
        for unit in self.world.unit_ids() {
            self.with_unit(unit, |u| {
                u.threat.remove(caster);
                if u.victim == Some(caster) {
                    u.victim = None;
                }
            });
        }
        self.with_unit(caster, |u| {
            u.player_flags.insert(PlayerFlags::SANCTUARY);
            u.victim = None;
        });
        tracing::debug!(unit = %caster, "sanctuary");
    }

    pub(super) fn effect_distract(&mut self, ctx: &mut EffectCtx) {
        let Some(target) = self.living_target(ctx) else {
            return;
        };
        self.with_unit(target, |u| {
            if !u.is_in_combat() {
                u.state.insert(UnitState::DISTRACTED);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use crate::effect::SpellEffectKind;
    use crate::engine::CastRequest;
    use crate::spell::{SpellDefinition, SpellEffectEntry};
    use crate::test_utils::Fixture;
    use crate::types::{EffectIndex, SpellId};
    use crate::unit::PlayerFlags;

    fn single(fx: &mut Fixture, id: u32, kind: SpellEffectKind, base: i32) -> SpellId {
        fx.spell(
            SpellDefinition::builder(id)
                .effect(
                    EffectIndex::Effect0,
                    SpellEffectEntry {
                        base_points: base,
                        ..SpellEffectEntry::new(kind)
                    },
                )
                .build(),
        )
    }

    #[test]
    fn taunt_takes_the_lead() {
        let mut fx = Fixture::new();
        let taunt = single(&mut fx, 110, SpellEffectKind::AttackMe, 0);
        let tank = fx.player(1, 0);
        let mage = fx.player(2, 1);
        let boss = fx.creature(3, 5);
        fx.world.unit_mut(boss).expect("unit").threat.add_threat(mage, 500.0);
        fx.engine().cast(CastRequest::new(tank, taunt).on(boss)).expect("cast");
        let boss = fx.unit(boss);
        assert_eq!(boss.threat.victim(), Some(tank));
        assert_eq!(boss.victim, Some(tank));
        assert!(boss.threat.threat(tank) >= 500.0);
    }

    #[test]
    fn threat_percent_scales_the_caster_entry() {
        let mut fx = Fixture::new();
        let fade = single(&mut fx, 111, SpellEffectKind::ModifyThreatPercent, -50);
        let rogue = fx.player(1, 0);
        let boss = fx.creature(2, 5);
        fx.world.unit_mut(boss).expect("unit").threat.add_threat(rogue, 400.0);
        fx.engine().cast(CastRequest::new(rogue, fade).on(boss)).expect("cast");
        assert_eq!(fx.unit(boss).threat.threat(rogue), 200.0);
    }

    #[test]
    fn sanctuary_wipes_the_caster_from_threat_lists() {
        let mut fx = Fixture::new();
        let vanish = fx.spell(
            SpellDefinition::builder(112)
                .effect(
                    EffectIndex::Effect0,
                    SpellEffectEntry {
                        target: crate::spell::ImplicitTarget::Caster,
                        ..SpellEffectEntry::new(SpellEffectKind::Sanctuary)
                    },
                )
                .build(),
        );
        let rogue = fx.player(1, 0);
        let boss = fx.creature(2, 5);
        {
            let boss = fx.world.unit_mut(boss).expect("unit");
            boss.threat.add_threat(rogue, 400.0);
            boss.victim = Some(rogue);
        }
        fx.engine().cast(CastRequest::new(rogue, vanish)).expect("cast");
        assert_eq!(fx.unit(boss).threat.threat(rogue), 0.0);
        assert_eq!(fx.unit(boss).victim, None);
        assert!(fx.unit(rogue).player_flags.contains(PlayerFlags::SANCTUARY));
    }
}
