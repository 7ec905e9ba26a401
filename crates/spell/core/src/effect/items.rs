//! Item creation, enchanting, durability and corpse looting.

use crate::effect::EffectCtx;
use crate::engine::SpellEngine;
use crate::event::SpellEvent;
use crate::spell::PowerType;
use crate::types::{EffectIndex, ItemId, UnitId};
use crate::unit::{DeathState, EquipSlot, InventoryResult, PlayerFlags, UnitKind};

const SKINNING_SKILL: u32 = 393;
const DEFAULT_TEMP_ENCHANT_MS: u32 = 30 * 60 * 1000;
const DEFAULT_HELD_ENCHANT_MS: u32 = 10_000;

/// Equipment slot named by a durability effect's misc value.
fn slot_from_misc(misc: i32) -> Option<EquipSlot> {
    Some(match misc {
        0 => EquipSlot::MainHand,
        1 => EquipSlot::OffHand,
        2 => EquipSlot::Ranged,
        3 => EquipSlot::Chest,
        4 => EquipSlot::Head,
        5 => EquipSlot::Legs,
        _ => return None,
    })
}

impl SpellEngine<'_> {
    /// Places `count` items of `item_type` into the unit's inventory. What
    /// does not fit is dropped and reported.
    pub(crate) fn create_item_for(&mut self, unit: UnitId, item_type: u32, count: u32) {
        let item = ItemId(item_type);
        let Some(template) = self.items.and_then(|items| items.item(item)) else {
            tracing::warn!(%unit, item = item_type, "item template missing");
            self.emit(SpellEvent::InventoryFailure {
                unit,
                item,
                result: InventoryResult::ItemNotFound,
            });
            return;
        };
        let Some((result, stored)) = self.with_unit(unit, |u| {
            let (result, storable) = u.inventory.can_store(&template, count);
            (result, u.inventory.store(&template, storable))
        }) else {
            return;
        };
        if stored > 0 {
            self.emit(SpellEvent::ItemCreated { unit, item, count: stored });
        }
        if result != InventoryResult::Ok {
            tracing::debug!(%unit, item = item_type, stored, wanted = count, %result, "item creation cut short");
            self.emit(SpellEvent::InventoryFailure { unit, item, result });
        }
    }

    pub(super) fn effect_create_item(&mut self, ctx: &mut EffectCtx) {
        let item_type = ctx.effect().item_type;
        let unit = ctx.target_or_caster();
        if !self.world.unit(unit).is_some_and(|u| u.is_player()) {
            return;
        }
        self.create_item_for(unit, item_type, ctx.amount.max(1) as u32);
    }

    /// Permanent enchant of the misc id on the target's main hand.
    pub(super) fn effect_enchant_item(&mut self, ctx: &mut EffectCtx) {
        let enchant = ctx.effect().misc_value.max(0) as u32;
        let unit = ctx.target_or_caster();
        self.with_unit(unit, |u| {
            if let Some(item) = u.inventory.equipped_mut(EquipSlot::MainHand) {
                item.enchant = Some(enchant);
            }
        });
    }

    /// Timed enchant lasting the spell's duration, half an hour without one.
    pub(super) fn effect_enchant_item_temporary(&mut self, ctx: &mut EffectCtx) {
        let duration = self.spell_duration(&ctx.spell, self.world.unit(ctx.caster));
        let duration_ms = u32::try_from(duration)
            .ok()
            .filter(|d| *d > 0)
            .unwrap_or(DEFAULT_TEMP_ENCHANT_MS);
        self.set_temp_enchant(ctx.target_or_caster(), ctx.effect().misc_value, duration_ms);
    }

    /// Enchant of the held weapon lasting `amount` seconds.
    pub(super) fn effect_enchant_held_item(&mut self, ctx: &mut EffectCtx) {
        let duration_ms = match u32::try_from(ctx.amount) {
            Ok(secs) if secs > 0 => secs.saturating_mul(1000),
            _ => DEFAULT_HELD_ENCHANT_MS,
        };
        self.set_temp_enchant(ctx.target_or_caster(), ctx.effect().misc_value, duration_ms);
    }

    fn set_temp_enchant(&mut self, unit: UnitId, enchant: i32, duration_ms: u32) {
        let enchant = enchant.max(0) as u32;
        self.with_unit(unit, |u| {
            if let Some(item) = u.inventory.equipped_mut(EquipSlot::MainHand) {
                item.temp_enchant = Some((enchant, duration_ms));
            }
        });
    }

    /// Removes `amount` durability from the misc slot, or every slot for -1.
    pub(super) fn effect_durability_damage(&mut self, ctx: &mut EffectCtx) {
        let loss = ctx.amount.max(0) as u32;
        self.damage_durability(ctx, |_| loss);
    }

    /// Removes `amount`% of the maximum durability.
    pub(super) fn effect_durability_damage_pct(&mut self, ctx: &mut EffectCtx) {
        let pct = ctx.amount.clamp(0, 100) as u32;
        self.damage_durability(ctx, |max| (u64::from(max) * u64::from(pct) / 100) as u32);
    }

    fn damage_durability(&mut self, ctx: &EffectCtx, loss: impl Fn(u32) -> u32) {
        let misc = ctx.effect().misc_value;
        let slot = slot_from_misc(misc);
        if misc != -1 && slot.is_none() {
            return;
        }
        let Some(target) = self.living_target(ctx) else {
            return;
        };
        self.with_unit(target, |u| {
            for item in u.inventory.equipped.iter_mut() {
                if slot.is_some_and(|s| s != item.slot) || item.max_durability == 0 {
                    continue;
                }
                item.durability = item.durability.saturating_sub(loss(item.max_durability));
            }
        });
    }

    /// Loots a living creature once.
    pub(super) fn effect_pickpocket(&mut self, ctx: &mut EffectCtx) {
        let Some(target) = self.living_target(ctx) else {
            return;
        };
        let picked = self
            .with_unit(target, |u| {
                if u.kind != UnitKind::Creature || u.pickpocketed {
                    return false;
                }
                u.pickpocketed = true;
                true
            })
            .unwrap_or(false);
        if picked {
            self.effect_record(ctx);
        }
    }

    /// Skins a dead creature and trains the caster's skinning skill.
    pub(super) fn effect_skinning(&mut self, ctx: &mut EffectCtx) {
        let Some(target) = ctx.target else {
            return;
        };
        let skinned = self
            .with_unit(target, |u| {
                if u.death_state == DeathState::Alive || !u.skinnable {
                    return false;
                }
                u.skinnable = false;
                true
            })
            .unwrap_or(false);
        if !skinned {
            return;
        }
        self.with_unit(ctx.caster, |u| {
            if let Some((value, max)) = u.skills.get_mut(&SKINNING_SKILL) {
                *value = (*value + 1).min(*max);
            }
        });
        self.effect_record(ctx);
    }

    /// Takes the insignia of a dead player.
    pub(super) fn effect_skin_player_corpse(&mut self, ctx: &mut EffectCtx) {
        let Some(target) = ctx.target else {
            return;
        };
        self.with_unit(target, |u| {
            if u.is_player() && !u.is_alive() {
                u.player_flags.insert(PlayerFlags::INSIGNIA_REMOVED);
            }
        });
    }

    /// Feeds the caster's pet: the trigger spell runs on the pet with
    /// `amount` as its first effect's value.
    pub(super) fn effect_feed_pet(&mut self, ctx: &mut EffectCtx) {
        let Some(pet) = self.world.unit(ctx.caster).and_then(|u| u.pet) else {
            return;
        };
        if !self.is_alive(pet) {
            return;
        }
        match ctx.effect().trigger_spell {
            Some(trigger) => {
                let mut request = crate::engine::CastRequest::new(ctx.caster, trigger)
                    .on(pet)
                    .triggered()
                    .with_base_points(EffectIndex::Effect0, ctx.amount);
                request.destination = self.world.unit(pet).map(|u| u.position);
                self.cast_triggered_request(request);
            }
            None => {
                let gain = self
                    .with_unit(pet, |u| u.modify_power(PowerType::Happiness, ctx.amount.max(0)))
                    .unwrap_or(0);
                self.emit_effect_power(ctx, pet, PowerType::Happiness, gain);
            }
        }
    }
}
