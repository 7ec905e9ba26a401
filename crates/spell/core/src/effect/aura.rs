//! Effects that hand work to the aura system.
//!
//! Unit auras are built into the cast's pending holder and attached once
//! every effect on the target ran. Ground effects spawn a dynamic object
//! whose sweep hands the aura to units inside it.

use std::collections::BTreeSet;

use crate::aura::{AreaAuraKind, Aura, AuraType, AuraVariant};
use crate::effect::{EffectCtx, SpellEffectKind};
use crate::engine::SpellEngine;
use crate::event::SpellEvent;
use crate::spell::{ImplicitTarget, PowerType};
use crate::types::{DynObjectId, EffectIndex};
use crate::world::DynamicObject;

impl SpellEngine<'_> {
    pub(super) fn effect_apply_aura(&mut self, ctx: &mut EffectCtx) {
        let Some(holder_id) = ctx.pending.as_ref().map(|h| h.id) else {
            return;
        };
        let aura_type = ctx.effect().aura;
        let positive = self.policy.is_positive_effect(&ctx.spell, ctx.index);
        let mut aura = Aura::new(holder_id, &ctx.spell, ctx.index, ctx.amount, 1, positive)
            .with_default_period(self.default_aura_period(aura_type, ctx.effect().misc_value));
        if aura_type == AuraType::PeriodicTriggerSpell && self.trigger_hits_current_enemy(ctx) {
            let tracked = self.world.unit(ctx.caster).and_then(|u| u.victim);
            aura = aura.with_variant(AuraVariant::SingleEnemy { tracked });
        }
        if let Some(holder) = ctx.pending.as_mut() {
            holder.set_aura(aura);
        }
    }

    /// Period of aura types that tick without an amplitude of their own.
    fn default_aura_period(&self, aura_type: AuraType, misc_value: i32) -> i32 {
        match aura_type {
            AuraType::ModRegen => self.config.regen_period_ms,
            AuraType::ModPowerRegen if PowerType::from_misc(misc_value) == Some(PowerType::Rage) => {
                self.config.rage_regen_period_ms
            }
            AuraType::ModPowerRegen => self.config.power_regen_period_ms,
            AuraType::ObsModMana => self.config.obs_mana_period_ms,
            _ => 0,
        }
    }

    fn trigger_hits_current_enemy(&self, ctx: &EffectCtx) -> bool {
        ctx.effect()
            .trigger_spell
            .and_then(|id| self.spells.spell(id))
            .is_some_and(|trigger| trigger.effect(EffectIndex::Effect0).target == ImplicitTarget::CurrentEnemy)
    }

    /// Only the caster's own application owns an area aura; members get
    /// satellites on the next update.
    pub(super) fn effect_apply_area_aura(&mut self, ctx: &mut EffectCtx) {
        if ctx.target != Some(ctx.caster) {
            return;
        }
        let Some(holder_id) = ctx.pending.as_ref().map(|h| h.id) else {
            return;
        };
        let kind = if ctx.kind() == SpellEffectKind::ApplyAreaAuraPet {
            AreaAuraKind::Pet
        } else {
            AreaAuraKind::Party
        };
        let radius = self.effect_radius(&ctx.spell, ctx.index, ctx.caster);
        let positive = self.policy.is_positive_effect(&ctx.spell, ctx.index);
        let aura = Aura::new(holder_id, &ctx.spell, ctx.index, ctx.amount, 1, positive).with_variant(
            AuraVariant::Area {
                radius,
                kind,
                original_rank: ctx.spell_id(),
            },
        );
        if let Some(holder) = ctx.pending.as_mut() {
            holder.set_aura(aura);
        }
    }

    /// Spawns the ground effect at the destination (or under the caster),
    /// replacing the caster's previous one of the same spell.
    pub(super) fn effect_persistent_area_aura(&mut self, ctx: &mut EffectCtx) {
        let Some(caster) = self.world.unit(ctx.caster) else {
            return;
        };
        let position = ctx.destination.unwrap_or(caster.position);
        let duration_ms = self.spell_duration(&ctx.spell, Some(caster));
        let radius = self.effect_radius(&ctx.spell, ctx.index, ctx.caster);

        if let Some(old) = self.world.find_dynamic_object(ctx.caster, ctx.spell_id(), ctx.index) {
            tracing::debug!(object = old.0, spell = %ctx.spell_id(), "ground effect replaced");
            self.world.remove_dynamic_object(old);
        }
        let object = self.world.insert_dynamic_object(DynamicObject {
            id: DynObjectId(0),
            caster: ctx.caster,
            spell: ctx.spell_id(),
            effect_index: ctx.index,
            position,
            radius,
            duration_ms,
            affected: BTreeSet::new(),
        });
        self.emit(SpellEvent::DynamicObjectSpawned {
            object,
            caster: ctx.caster,
            spell: ctx.spell_id(),
            position,
        });
        self.sweep_dynamic_object(object);
    }
}
