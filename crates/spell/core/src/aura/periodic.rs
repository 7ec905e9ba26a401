//! Per-aura update and periodic ticks.
//!
//! A periodic aura fires at most once per update:
//!
//! ```text
//! timer -= diff
//! if timer <= 0 { timer += period; tick_count += 1; tick() }
//! ```
//!
//! A large `diff` therefore leaves the timer negative and the next update
//! fires again, instead of firing several ticks in one pass.

use crate::aura::{AuraCtx, AuraType, AuraVariant};
use crate::engine::{DamageInfo, SpellEngine};
use crate::event::SpellEvent;
use crate::holder::SpellAuraHolder;
use crate::spell::{Mechanic, PowerType, ProcExtra, ProcFlags, SchoolMask};
use crate::types::{EffectIndex, HolderId};

impl SpellEngine<'_> {
    /// Runs one aura's update: area/persistent maintenance plus its periodic timer.
    pub(crate) fn update_aura(&mut self, id: HolderId, index: EffectIndex, diff: u32) {
        let Some(holder) = self.world.holder(id) else {
            return;
        };
        let owner_side = holder.target == holder.caster;
        let Some(variant) = holder.aura(index).map(|aura| aura.variant) else {
            return;
        };
        match variant {
            AuraVariant::Area { .. } if owner_side => {
                self.propagate_area_aura(id, index);
                self.update_periodic(id, index, diff);
            }
            AuraVariant::Area { .. } => {
                self.update_periodic(id, index, diff);
                if !self.area_satellite_valid(id, index) {
                    self.mark_remove_pending(id, index);
                }
            }
            AuraVariant::Persistent { object } => {
                if self.persistent_aura_valid(id, object) {
                    self.update_periodic(id, index, diff);
                } else {
                    self.mark_remove_pending(id, index);
                }
            }
            AuraVariant::Plain | AuraVariant::SingleEnemy { .. } => {
                self.update_periodic(id, index, diff);
            }
        }
    }

    fn mark_remove_pending(&mut self, id: HolderId, index: EffectIndex) {
        if let Some(aura) = self.world.aura_mut(id, index) {
            aura.remove_pending = true;
        }
    }

    /// Advances the periodic timer and fires a single tick when it runs out.
    pub(crate) fn update_periodic(&mut self, id: HolderId, index: EffectIndex, diff: u32) {
        let Some(holder) = self.world.holder(id) else {
            return;
        };
        if !(holder.duration >= 0 || holder.passive || holder.permanent) {
            return;
        }
        let diff_ms = diff.min(i32::MAX as u32) as i32;
        let Some(aura) = self.world.aura_mut(id, index) else {
            return;
        };
        if !aura.is_periodic || aura.period <= 0 {
            return;
        }
        aura.periodic_timer -= diff_ms;
        if aura.periodic_timer > 0 {
            return;
        }
        aura.periodic_timer += aura.period;
        aura.tick_count += 1;
        aura.in_use += 1;
        self.periodic_tick(id, index);
        if let Some(aura) = self.world.aura_mut(id, index) {
            aura.in_use = aura.in_use.saturating_sub(1);
        }
    }

    /// Fires the payload of one periodic aura.
    pub fn periodic_tick(&mut self, id: HolderId, index: EffectIndex) {
        let Some(ctx) = self.aura_ctx(id, index) else {
            return;
        };
        if !self.is_alive(ctx.target) {
            return;
        }
        tracing::trace!(holder = %id, aura = %ctx.aura_type, amount = ctx.amount, "periodic tick");
        match ctx.aura_type {
            AuraType::PeriodicDamage | AuraType::PeriodicDamagePercent => self.tick_damage(&ctx),
            AuraType::PeriodicLeech => self.tick_leech(&ctx),
            AuraType::PeriodicHealthFunnel => self.tick_health_funnel(&ctx),
            AuraType::PeriodicHeal | AuraType::ObsModHealth => self.tick_heal(&ctx),
            AuraType::PeriodicManaLeech | AuraType::PeriodicManaFunnel => self.tick_mana_leech(&ctx),
            AuraType::PeriodicEnergize | AuraType::ObsModMana => self.tick_energize(&ctx),
            AuraType::PowerBurnMana => self.tick_power_burn(&ctx),
            AuraType::ModRegen => self.tick_regen(&ctx),
            AuraType::ModPowerRegen => self.tick_power_regen(&ctx),
            AuraType::Dummy => self.emit(SpellEvent::Dummy {
                caster: ctx.caster,
                target: Some(ctx.target),
                spell: ctx.spell_id(),
                apply: true,
            }),
            AuraType::PeriodicTriggerSpell => self.tick_trigger_spell(&ctx),
            other => tracing::trace!(aura = %other, "no periodic payload"),
        }
    }

    /// Mitigated damage of a periodic damage aura; `None` when the tick is void.
    fn periodic_damage(&mut self, ctx: &AuraCtx, base: u32) -> Option<DamageInfo> {
        let school = ctx.spell.school_mask;
        let target = self.world.unit(ctx.target)?;
        if self.policy.is_immune_to_damage(target, school) {
            return None;
        }
        let mut damage = self.damage_done_bonus(ctx.caster, &ctx.spell, base as i32, true);
        damage = self.damage_taken_bonus(ctx.target, school, damage);
        let mut info = DamageInfo::new(Some(ctx.caster), ctx.target, school, damage.max(0) as u32)
            .with_spell(ctx.spell_id())
            .periodic();
        if school == SchoolMask::NORMAL && ctx.effect().mechanic != Mechanic::Bleed {
            self.apply_armor(&mut info);
        }
        self.calc_absorb_resist(&mut info, Some(&*ctx.spell));
        Some(info)
    }

    fn tick_damage(&mut self, ctx: &AuraCtx) {
        if self.world.unit(ctx.caster).is_none() {
            return;
        }
        let amount = ctx.amount.max(0) as u32;
        let base = if ctx.aura_type == AuraType::PeriodicDamagePercent {
            let max = self.world.unit(ctx.target).map_or(0, |t| t.max_health());
            (u64::from(max) * u64::from(amount) / 100) as u32
        } else {
            amount
        };
        let Some(info) = self.periodic_damage(ctx, base) else {
            return;
        };
        self.emit_periodic(ctx, info.damage as i32, info.absorbed, info.resisted);
        self.periodic_procs(ctx, info.damage, ProcExtra::INTERNAL_DOT);
        self.deal_damage(&info);
    }

    fn tick_leech(&mut self, ctx: &AuraCtx) {
        if !self.is_alive(ctx.caster) {
            return;
        }
        let Some(mut info) = self.periodic_damage(ctx, ctx.amount.max(0) as u32) else {
            return;
        };
        let health = self.world.unit(ctx.target).map_or(0, |t| t.health());
        info.damage = info.damage.min(health);
        self.emit_periodic(ctx, info.damage as i32, info.absorbed, info.resisted);
        self.periodic_procs(ctx, info.damage, ProcExtra::INTERNAL_DOT);
        let dealt = self.deal_damage(&info);

        let multiplier = self.transfer_multiplier(ctx);
        let heal = self.healing_taken_bonus(ctx.caster, (dealt as f32 * multiplier) as i32);
        let gain = self.deal_heal(Some(ctx.caster), ctx.caster, heal.max(0) as u32, Some(ctx.spell_id()));
        self.threat_assist(ctx.caster, ctx.caster, gain as f32, &ctx.spell);
    }

    /// The caster pays health, the target is healed by it.
    fn tick_health_funnel(&mut self, ctx: &AuraCtx) {
        if !self.is_alive(ctx.caster) {
            return;
        }
        let amount = ctx.amount.max(0) as u32;
        let cost = DamageInfo::new(Some(ctx.caster), ctx.caster, ctx.spell.school_mask, amount)
            .with_spell(ctx.spell_id())
            .periodic();
        let paid = self.deal_damage(&cost);
        let heal = (paid as f32 * self.transfer_multiplier(ctx)) as u32;
        let gain = self.deal_heal(Some(ctx.caster), ctx.target, heal, Some(ctx.spell_id()));
        self.emit_periodic(ctx, gain as i32, 0, 0);
    }

    fn tick_heal(&mut self, ctx: &AuraCtx) {
        let amount = ctx.amount.max(0) as u32;
        let mut heal = if ctx.aura_type == AuraType::ObsModHealth {
            let max = self.world.unit(ctx.target).map_or(0, |t| t.max_health());
            (u64::from(max) * u64::from(amount) / 100) as i32
        } else {
            self.healing_done_bonus(ctx.caster, &ctx.spell, amount as i32)
        };
        heal = self.healing_taken_bonus(ctx.target, heal);
        let heal = heal.max(0) as u32;
        let gain = self.deal_heal(Some(ctx.caster), ctx.target, heal, Some(ctx.spell_id()));
        self.emit_periodic(ctx, heal as i32, 0, 0);
        self.periodic_procs(ctx, gain, ProcExtra::INTERNAL_HOT);
        if self.world.unit(ctx.caster).is_some() {
            self.threat_assist(ctx.caster, ctx.target, gain as f32, &ctx.spell);
        }
    }

    /// Mana leech moves power from target to caster; mana funnel the other way.
    fn tick_mana_leech(&mut self, ctx: &AuraCtx) {
        if !self.is_alive(ctx.caster) {
            return;
        }
        let Some(power) = PowerType::from_misc(ctx.misc_value) else {
            return;
        };
        let amount = ctx.amount.max(0);
        let (source, sink) = if ctx.aura_type == AuraType::PeriodicManaFunnel {
            (ctx.caster, ctx.target)
        } else {
            (ctx.target, ctx.caster)
        };
        let drained = -self
            .with_unit(source, |unit| unit.modify_power(power, -amount))
            .unwrap_or(0);
        self.emit_power_change(source, ctx, power, -drained);
        let gain_amount = (drained as f32 * self.transfer_multiplier(ctx)) as i32;
        self.emit_periodic(ctx, drained, 0, 0);
        if gain_amount > 0 {
            let gain = self
                .with_unit(sink, |unit| unit.modify_power(power, gain_amount))
                .unwrap_or(0);
            self.emit_power_change(sink, ctx, power, gain);
            if ctx.aura_type == AuraType::PeriodicManaLeech {
                self.add_threat(ctx.target, ctx.caster, gain as f32 * 0.5, &ctx.spell);
            }
        }
    }

    fn tick_energize(&mut self, ctx: &AuraCtx) {
        let (power, amount) = if ctx.aura_type == AuraType::ObsModMana {
            let max = self
                .world
                .unit(ctx.target)
                .map_or(0, |t| t.max_power(PowerType::Mana));
            (
                PowerType::Mana,
                (i64::from(max) * i64::from(ctx.amount.max(0)) / 100) as i32,
            )
        } else {
            let Some(power) = PowerType::from_misc(ctx.misc_value) else {
                return;
            };
            (power, ctx.amount.max(0))
        };
        let gain = self
            .with_unit(ctx.target, |unit| unit.modify_power(power, amount))
            .unwrap_or(0);
        self.emit_periodic(ctx, amount, 0, 0);
        self.emit_power_change(ctx.target, ctx, power, gain);
        if self.world.unit(ctx.caster).is_some() {
            self.threat_assist(ctx.caster, ctx.target, gain as f32, &ctx.spell);
        }
    }

    /// Burns power and deals the burnt amount (times the multiplier) as damage.
    fn tick_power_burn(&mut self, ctx: &AuraCtx) {
        if self.world.unit(ctx.caster).is_none() {
            return;
        }
        let Some(power) = PowerType::from_misc(ctx.misc_value) else {
            return;
        };
        let Some(target) = self.world.unit(ctx.target) else {
            return;
        };
        if target.power_type != power
            || self.policy.is_immune_to_damage(target, ctx.spell.school_mask)
        {
            return;
        }
        let burnt = -self
            .with_unit(ctx.target, |unit| unit.modify_power(power, -ctx.amount.max(0)))
            .unwrap_or(0);
        self.emit_power_change(ctx.target, ctx, power, -burnt);
        let damage = (burnt as f32 * self.transfer_multiplier(ctx)) as u32;
        let mut info = DamageInfo::new(Some(ctx.caster), ctx.target, ctx.spell.school_mask, damage)
            .with_spell(ctx.spell_id())
            .periodic();
        self.calc_absorb_resist(&mut info, Some(&*ctx.spell));
        self.emit_periodic(ctx, info.damage as i32, info.absorbed, info.resisted);
        self.periodic_procs(ctx, info.damage, ProcExtra::INTERNAL_DOT);
        self.deal_damage(&info);
    }

    fn tick_regen(&mut self, ctx: &AuraCtx) {
        let gain = self
            .with_unit(ctx.target, |unit| unit.modify_health(ctx.amount))
            .unwrap_or(0);
        self.emit_periodic(ctx, gain, 0, 0);
        if gain > 0 && self.world.unit(ctx.caster).is_some() {
            self.threat_assist(ctx.caster, ctx.target, gain as f32, &ctx.spell);
        }
    }

    /// Only the target's own power type regenerates; rage gains three fifths.
    fn tick_power_regen(&mut self, ctx: &AuraCtx) {
        let Some(target) = self.world.unit(ctx.target) else {
            return;
        };
        let power = target.power_type;
        if Some(power) != PowerType::from_misc(ctx.misc_value) {
            return;
        }
        let amount = if power == PowerType::Rage {
            ctx.amount * 3 / 5
        } else {
            ctx.amount
        };
        let gain = self
            .with_unit(ctx.target, |unit| unit.modify_power(power, amount))
            .unwrap_or(0);
        self.emit_power_change(ctx.target, ctx, power, gain);
    }

    fn tick_trigger_spell(&mut self, ctx: &AuraCtx) {
        let Some(trigger) = ctx.effect().trigger_spell else {
            tracing::error!(spell = %ctx.spell_id(), index = ?ctx.index, "periodic trigger without trigger spell");
            return;
        };
        // Positive and self-cast triggers originate from the target.
        let caster = if ctx.positive || ctx.caster == ctx.target {
            ctx.target
        } else {
            ctx.caster
        };
        // Single-enemy auras keep hitting the enemy picked at application.
        let tracked = match self.world.aura(ctx.holder, ctx.index).map(|a| a.variant) {
            Some(AuraVariant::SingleEnemy { tracked: Some(enemy) }) if self.is_alive(enemy) => Some(enemy),
            _ => None,
        };
        self.cast_triggered(caster, trigger, tracked.unwrap_or(ctx.target));
    }

    fn transfer_multiplier(&self, ctx: &AuraCtx) -> f32 {
        let base = ctx.effect().transfer_multiplier();
        self.world.unit(ctx.caster).map_or(base, |caster| {
            caster
                .spell_mods
                .apply_f32(&ctx.spell, crate::unit::SpellModOp::MultipleValue, base)
        })
    }

    fn emit_periodic(&mut self, ctx: &AuraCtx, amount: i32, absorbed: u32, resisted: u32) {
        self.emit(SpellEvent::PeriodicTick {
            target: ctx.target,
            caster: ctx.caster,
            spell: ctx.spell_id(),
            amount,
            absorbed,
            resisted,
        });
    }

    fn emit_power_change(&mut self, unit: crate::types::UnitId, ctx: &AuraCtx, power: PowerType, delta: i32) {
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

    fn periodic_procs(&mut self, ctx: &AuraCtx, amount: u32, extra: ProcExtra) {
        self.proc_damage_and_spell(
            Some(ctx.caster),
            ctx.target,
            ProcFlags::ON_DO_PERIODIC,
            ProcFlags::ON_TAKE_PERIODIC,
            extra,
            amount,
            Some(ctx.spell_id()),
        );
    }
}

impl SpellAuraHolder {
    /// Periodic auras of this holder with their tick counts.
    pub fn tick_counts(&self) -> Vec<(EffectIndex, u32)> {
        self.iter_auras()
            .filter(|aura| aura.is_periodic)
            .map(|aura| (aura.effect_index, aura.tick_count))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CastRequest;
    use crate::holder::RemovalMode;
    use crate::spell::SpellDefinition;
    use crate::test_utils::Fixture;
    use crate::types::{SpellId, UnitId};

    fn burn(fx: &mut Fixture, amount: i32, period: i32) -> SpellId {
        fx.spell(
            SpellDefinition::builder(100)
                .school(SchoolMask::FIRE)
                .aura(EffectIndex::Effect0, AuraType::PeriodicDamage, amount, period)
                .build(),
        )
    }

    fn burning(fx: &mut Fixture, amount: i32, period: i32) -> (HolderId, UnitId) {
        let spell = burn(fx, amount, period);
        let caster = fx.player(1, 0);
        let target = fx.creature(2, 5);
        let outcome = fx
            .engine()
            .cast(CastRequest::new(caster, spell).on(target))
            .expect("cast");
        (outcome.holders[0], target)
    }

    fn timer(fx: &Fixture, id: HolderId) -> Option<(u32, i32)> {
        fx.world
            .aura(id, EffectIndex::Effect0)
            .map(|aura| (aura.tick_count, aura.periodic_timer))
    }

    #[test]
    fn long_update_fires_one_tick_and_carries_the_overshoot() {
        let mut fx = Fixture::new();
        let (id, _) = burning(&mut fx, 10, 3000);

        fx.engine().update(6500);
        assert_eq!(timer(&fx, id), Some((1, -500)));
        fx.engine().update(100);
        assert_eq!(timer(&fx, id), Some((2, 2400)));
        let ticks = fx
            .world
            .events()
            .iter()
            .filter(|e| matches!(e, SpellEvent::PeriodicTick { .. }))
            .count();
        assert_eq!(ticks, 2);
    }

    #[test]
    fn lethal_tick_frees_its_holder_after_the_update() {
        let mut fx = Fixture::new();
        let (id, target) = burning(&mut fx, 50, 1000);
        fx.world.unit_mut(target).expect("unit").set_health(20);

        fx.engine().update(1000);
        assert!(!fx.unit(target).is_alive());
        assert!(fx.world.holder(id).is_none());
        assert!(fx.world.events().iter().any(|e| matches!(
            e,
            SpellEvent::HolderRemoved { holder, mode: RemovalMode::Death, .. } if *holder == id
        )));
    }
}
