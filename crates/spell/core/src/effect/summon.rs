//! Summons, totems and pets.
//!
//! Summoned units copy the caster's level and faction and stand at the
//! destination, or next to the caster without one. They have no lifetime
//! timer; they live until dismissed, replaced or despawned.

use crate::effect::{EffectCtx, SpellEffectKind};
use crate::engine::SpellEngine;
use crate::event::SpellEvent;
use crate::spell::PowerType;
use crate::types::{Position, UnitId};
use crate::unit::{DeathState, Unit, UnitKind};

const DEFAULT_TOTEM_HEALTH: u32 = 5;

impl SpellEngine<'_> {
    fn spawn_summon(&mut self, ctx: &EffectCtx, kind: UnitKind, health: u32) -> Option<UnitId> {
        let owner = self.world.unit(ctx.caster)?;
        let (level, faction, group) = (owner.level, owner.faction, owner.group);
        let position = ctx
            .destination
            .unwrap_or(Position::new(owner.position.x + 1, owner.position.y));
        let entry = ctx.effect().misc_value;
        let caster = ctx.caster;
        let unit = self.world.spawn_unit(|id| {
            let mut unit = Unit::new(id, kind, level, faction)
                .with_name(format!("summon {entry}"))
                .with_health(health.max(1))
                .at(position);
            unit.owner = Some(caster);
            unit.group = group;
            unit
        });
        tracing::debug!(summoner = %caster, %unit, spell = %ctx.spell_id(), ?kind, "summoned");
        self.emit(SpellEvent::Summoned {
            summoner: caster,
            unit,
            spell: ctx.spell_id(),
        });
        Some(unit)
    }

    /// Health of a summon: the misc B value when set, else the caster's maximum.
    fn summon_health(&self, ctx: &EffectCtx) -> u32 {
        match u32::try_from(ctx.effect().misc_value_b) {
            Ok(health) if health > 0 => health,
            _ => self.world.unit(ctx.caster).map_or(1, |u| u.max_health()),
        }
    }

    pub(super) fn effect_summon(&mut self, ctx: &mut EffectCtx) {
        let health = self.summon_health(ctx);
        let Some(unit) = self.spawn_summon(ctx, UnitKind::Creature, health) else {
            return;
        };
        if ctx.kind() == SpellEffectKind::SummonPossessed {
            let caster = ctx.caster;
            self.with_unit(unit, |u| u.charmer = Some(caster));
            self.with_unit(caster, |u| u.charm = Some(unit));
        }
    }

    /// Totems take a fixed slot; the generic kind uses the first. The old
    /// occupant is removed.
    pub(super) fn effect_summon_totem(&mut self, ctx: &mut EffectCtx) {
        let slot = match ctx.kind() {
            SpellEffectKind::SummonTotemSlot2 => 1,
            SpellEffectKind::SummonTotemSlot3 => 2,
            SpellEffectKind::SummonTotemSlot4 => 3,
            _ => 0,
        };
        if let Some(old) = self.world.unit(ctx.caster).and_then(|u| u.totems[slot]) {
            self.unsummon(old);
        }
        let health = match u32::try_from(ctx.effect().misc_value_b) {
            Ok(health) if health > 0 => health,
            _ => DEFAULT_TOTEM_HEALTH,
        };
        let Some(totem) = self.spawn_summon(ctx, UnitKind::Totem, health) else {
            return;
        };
        self.with_unit(ctx.caster, |u| u.totems[slot] = Some(totem));
    }

    pub(super) fn effect_summon_pet(&mut self, ctx: &mut EffectCtx) {
        if let Some(old) = self.world.unit(ctx.caster).and_then(|u| u.pet) {
            self.unsummon(old);
        }
        let health = self.summon_health(ctx);
        let Some(pet) = self.spawn_summon(ctx, UnitKind::Pet, health) else {
            return;
        };
        self.with_unit(pet, |u| u.power_type = PowerType::Focus);
        self.with_unit(ctx.caster, |u| u.pet = Some(pet));
    }

    /// Revives the caster's dead pet at `amount`% health.
    pub(super) fn effect_summon_dead_pet(&mut self, ctx: &mut EffectCtx) {
        let Some(pet) = self.world.unit(ctx.caster).and_then(|u| u.pet) else {
            return;
        };
        let Some(unit) = self.world.unit(pet) else {
            return;
        };
        if unit.death_state == DeathState::Alive {
            return;
        }
        let health = (u64::from(unit.max_health()) * u64::from(ctx.amount.clamp(0, 100) as u32) / 100) as u32;
        self.revive(pet, health, 0);
    }

    pub(super) fn effect_dismiss_pet(&mut self, ctx: &mut EffectCtx) {
        let pet = match ctx.target {
            Some(target) if self.world.unit(target).is_some_and(|u| u.owner == Some(ctx.caster)) => {
                Some(target)
            }
            _ => self.world.unit(ctx.caster).and_then(|u| u.pet),
        };
        if let Some(pet) = pet {
            self.unsummon(pet);
        }
    }

    pub(super) fn effect_destroy_all_totems(&mut self, ctx: &mut EffectCtx) {
        let totems = self.world.unit(ctx.caster).map(|u| u.totems).unwrap_or_default();
        for totem in totems.into_iter().flatten() {
            self.unsummon(totem);
        }
    }

    /// The target creature becomes the caster's pet.
    pub(super) fn effect_tame_creature(&mut self, ctx: &mut EffectCtx) {
        let Some(target) = self.living_target(ctx) else {
            return;
        };
        let Some(caster) = self.world.unit(ctx.caster) else {
            return;
        };
        let (faction, old_pet) = (caster.faction, caster.pet);
        let tameable = self
            .world
            .unit(target)
            .is_some_and(|u| u.kind == UnitKind::Creature && u.owner.is_none());
        if !tameable {
            return;
        }
        if let Some(old) = old_pet {
            self.unsummon(old);
        }
        let owner = ctx.caster;
        self.with_unit(target, |u| {
            u.kind = UnitKind::Pet;
            u.owner = Some(owner);
            u.faction = faction;
            u.native_faction = faction;
            u.threat.clear();
            u.victim = None;
        });
        for unit in self.world.unit_ids() {
            self.with_unit(unit, |u| u.threat.remove(target));
        }
        self.with_unit(owner, |u| u.pet = Some(target));
        tracing::debug!(%owner, pet = %target, "creature tamed");
    }

    /// The caster sees through the target's eyes.
    pub(super) fn effect_add_farsight(&mut self, ctx: &mut EffectCtx) {
        let Some(target) = ctx.target.filter(|t| *t != ctx.caster) else {
            self.emit(SpellEvent::EffectRecorded {
                caster: ctx.caster,
                target: None,
                spell: ctx.spell_id(),
                effect: ctx.kind(),
            });
            return;
        };
        self.with_unit(ctx.caster, |u| u.farsight = Some(target));
    }
}
