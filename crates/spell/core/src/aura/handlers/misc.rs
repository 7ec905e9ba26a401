use crate::aura::AuraCtx;
use crate::engine::SpellEngine;
use crate::event::SpellEvent;
use crate::holder::RemovalMode;
use crate::unit::PlayerFlags;

impl SpellEngine<'_> {
    /// Scripted auras: reported to the host, no built-in behavior.
    pub(super) fn aura_dummy(&mut self, ctx: &AuraCtx, apply: bool, real: bool) {
        if !real {
            return;
        }
        self.emit(SpellEvent::Dummy {
            caster: ctx.caster,
            target: Some(ctx.target),
            spell: ctx.spell_id(),
            apply,
        });
    }

    pub(super) fn aura_force_reaction(&mut self, ctx: &AuraCtx, apply: bool) {
        let (Ok(faction), Ok(reaction)) = (u32::try_from(ctx.misc_value), u32::try_from(ctx.amount)) else {
            return;
        };
        self.with_unit(ctx.target, |unit| {
            if apply {
                unit.forced_reactions.insert(faction, reaction);
            } else {
                unit.forced_reactions.remove(&faction);
            }
        });
    }

    pub(super) fn aura_extra_attacks(&mut self, ctx: &AuraCtx, apply: bool) {
        let amount = ctx.amount.max(0) as u32;
        self.with_unit(ctx.target, |unit| {
            unit.extra_attacks = if apply {
                unit.extra_attacks.saturating_add(amount)
            } else {
                unit.extra_attacks.saturating_sub(amount)
            };
        });
    }

    pub(super) fn aura_retain_combo_points(&mut self, ctx: &AuraCtx, apply: bool) {
        self.with_unit(ctx.target, |unit| {
            unit.player_flags.set(PlayerFlags::RETAIN_COMBO_POINTS, apply)
        });
    }

    /// The caster receives the effect's item when the target dies under the aura.
    pub(super) fn aura_channel_death_item(&mut self, ctx: &AuraCtx, apply: bool, real: bool) {
        if apply || !real {
            return;
        }
        let died = self
            .world
            .holder(ctx.holder)
            .is_some_and(|h| h.removal_mode == RemovalMode::Death);
        let item = ctx.effect().item_type;
        if died && item != 0 {
            self.create_item_for(ctx.caster, item, 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::aura::AuraType;
    use crate::engine::CastRequest;
    use crate::event::SpellEvent;
    use crate::spell::SpellDefinition;
    use crate::test_utils::Fixture;
    use crate::types::EffectIndex;

    #[test]
    fn stacking_a_dummy_aura_reports_one_apply() {
        let mut fx = Fixture::new();
        let spell = fx.spell(
            SpellDefinition::builder(80)
                .stack_amount(5)
                .aura(EffectIndex::Effect0, AuraType::Dummy, 1, 0)
                .build(),
        );
        let unit = fx.player(1, 0);
        for _ in 0..3 {
            fx.engine().cast(CastRequest::new(unit, spell)).expect("cast");
        }
        let holder = fx.world.find_holder(unit, spell, unit).expect("holder");
        assert_eq!(fx.world.holder(holder).map(|h| h.stack_amount), Some(3));
        let dummies: Vec<bool> = fx
            .world
            .events()
            .iter()
            .filter_map(|e| match e {
                SpellEvent::Dummy { apply, .. } => Some(*apply),
                _ => None,
            })
            .collect();
        assert_eq!(dummies, vec![true]);
    }
}
