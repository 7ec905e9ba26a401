//! Holder creation, attachment, teardown and per-tick update.
//!
//! Teardown is a single routine ([`SpellEngine::remove_holder`]) shared by
//! expiry, dispel, death, replacement and explicit removal. It is idempotent:
//! a holder already being removed is left alone, so handlers that trigger
//! further removals while unapplying never tear the same holder down twice.
//! A holder pinned by an update pass (`in_use > 0`) is marked deleted and
//! only leaves the arena once the pass releases it.

use std::sync::Arc;

use crate::aura::{AuraState, AuraVariant};
use crate::engine::{SpellEngine, roll_ctx};
use crate::event::SpellEvent;
use crate::holder::{RemovalMode, SpellAuraHolder};
use crate::spell::{
    AuraInterruptFlags, LinkedSpellKind, SpellAttributes, SpellDefinition,
};
use crate::types::{EffectIndex, HolderId, ItemId, SpellId, UnitId};
use crate::unit::{AuraStateFlags, DiminishingGroup};

/// Resist threshold out of one million: `((elapsed + diff) / 15)^2`, with
/// `elapsed` the ms the holder has already run.
pub(crate) fn heartbeat_threshold(elapsed: i32, diff: i32) -> f64 {
    let ms = f64::from(elapsed.max(0)) + f64::from(diff.max(0));
    (ms / 15.0).powi(2)
}

impl SpellEngine<'_> {
    // ========================================================================
    // Creation and attachment
    // ========================================================================

    /// Builds an empty pending holder with a fresh id. It is not attached
    /// until [`Self::add_holder`].
    pub fn create_holder(
        &mut self,
        spell: Arc<SpellDefinition>,
        target: UnitId,
        caster: UnitId,
        cast_item: Option<ItemId>,
    ) -> SpellAuraHolder {
        let id = self.world.alloc_holder_id();
        let positive = self.policy.is_positive_spell(&spell);
        let caster_unit = self.world.unit(caster);
        let caster_level = caster_unit.map_or(1, |c| c.level);
        let caster_is_player = caster_unit.is_some_and(|c| c.is_player());
        let target_is_player = self.world.unit(target).is_some_and(|t| t.is_player());
        let heartbeat = spell.attributes.contains(SpellAttributes::HEARTBEAT_RESIST)
            && caster_is_player
            && target_is_player;
        let mut holder = SpellAuraHolder::new(id, spell, target, caster, cast_item);
        holder.positive = positive;
        holder.caster_level = caster_level;
        holder.heartbeat_subject = heartbeat;
        holder.mana_drain_timer = self.config.mana_drain_interval_ms;
        holder
    }

    /// Attaches `holder` to its target and applies its auras in index order.
    ///
    /// Returns the id of the holder now carrying the application: the new
    /// holder, or an existing one of the same spell and caster that absorbed
    /// it as a stack. Returns `None` when stacking rules or a dead target
    /// reject it.
    pub fn add_holder(&mut self, mut holder: SpellAuraHolder) -> Option<HolderId> {
        let target = holder.target;
        let spell = Arc::clone(&holder.spell);
        let Some(unit) = self.world.unit(target) else {
            tracing::trace!(unit = %target, spell = %spell.id, "holder target missing");
            return None;
        };
        if !unit.is_alive() && !holder.death_persistent && !spell.can_target_dead() {
            tracing::debug!(unit = %target, spell = %spell.id, "dead target rejects holder");
            return None;
        }

        let same_spell: Vec<(HolderId, UnitId)> = self
            .world
            .holders_on(target)
            .filter(|h| h.spell.id == spell.id && h.id != holder.id)
            .map(|h| (h.id, h.caster))
            .collect();
        for (other, other_caster) in same_spell {
            if other_caster == holder.caster {
                if spell.stack_amount > 0 {
                    self.mod_stack_amount(other, holder.stack_amount as i32);
                    return Some(other);
                }
                self.remove_holder(other, RemovalMode::Stack);
            } else if !holder
                .iter_auras()
                .all(|aura| aura.aura_type.stacks_across_casters())
            {
                self.remove_holder(other, RemovalMode::Stack);
            }
        }

        if !self.remove_no_stack_holders(&holder) {
            tracing::debug!(unit = %target, spell = %spell.id, "higher rank present, holder rejected");
            return None;
        }

        if holder.is_single_target() {
            let previous: Vec<HolderId> = self
                .world
                .single_target_holders(holder.caster)
                .into_iter()
                .filter(|id| self.world.holder(*id).is_some_and(|h| h.spell.id == spell.id))
                .collect();
            for id in previous {
                self.remove_holder(id, RemovalMode::Default);
            }
            holder.single_target_tracked = true;
            self.world.track_single_target(holder.caster, holder.id);
        }

        let id = holder.id;
        let caster = holder.caster;
        let group = holder.diminishing_group;
        holder.removal_mode = RemovalMode::Default;
        for aura in holder.auras.iter_mut().flatten() {
            aura.state = AuraState::Applying;
            aura.applied = false;
        }
        self.world.insert_holder(holder);

        let now = self.world.clock_ms();
        if let Some(unit) = self.world.unit_mut(target) {
            unit.holders.push(id);
            if group != DiminishingGroup::None {
                unit.diminishing.increment(group, now);
                unit.diminishing.apply_aura(group, true, now);
            }
            if spell.is_seal() {
                unit.aura_state.insert(AuraStateFlags::JUDGEMENT);
            }
        }
        self.assign_visible_slot(id);
        tracing::debug!(%id, unit = %target, spell = %spell.id, caster = %caster, "holder added");
        self.emit(SpellEvent::HolderApplied {
            unit: target,
            holder: id,
            spell: spell.id,
            caster,
        });

        for index in EffectIndex::ALL {
            if !self.world.holder(id).is_some_and(SpellAuraHolder::is_live) {
                break;
            }
            self.apply_aura_modifier(id, index);
        }

        if self.world.holder(id).is_some_and(SpellAuraHolder::is_live) {
            for link in self.spells.linked_spells(spell.id) {
                if link.kind == LinkedSpellKind::Boost {
                    self.cast_triggered(target, link.linked, target);
                }
            }
        }
        Some(id)
    }

    /// Runs the apply handler of one aura once.
    pub(crate) fn apply_aura_modifier(&mut self, holder: HolderId, index: EffectIndex) {
        let Some(aura) = self.world.aura_mut(holder, index) else {
            return;
        };
        if aura.applied || !aura.state.is_listed() {
            return;
        }
        aura.applied = true;
        let Some(ctx) = self.aura_ctx(holder, index) else {
            return;
        };
        self.handle_aura(&ctx, true, true);
        if let Some(aura) = self.world.aura_mut(holder, index)
            && aura.state == AuraState::Applying
        {
            aura.state = AuraState::Active;
        }
    }

    /// Runs the unapply handler of one applied aura and marks it destroyed.
    pub(crate) fn unapply_aura_modifier(&mut self, holder: HolderId, index: EffectIndex) {
        let Some(aura) = self.world.aura_mut(holder, index) else {
            return;
        };
        if matches!(aura.state, AuraState::Unapplying | AuraState::Destroyed) {
            return;
        }
        if !aura.applied {
            aura.state = AuraState::Destroyed;
            return;
        }
        aura.state = AuraState::Unapplying;
        if let Some(ctx) = self.aura_ctx(holder, index) {
            self.handle_aura(&ctx, false, true);
        }
        if let Some(aura) = self.world.aura_mut(holder, index) {
            aura.state = AuraState::Destroyed;
            aura.applied = false;
        }
    }

    /// Unapply, recompute and reapply one aura with a new amount. The aura
    /// stays logically applied, so handlers see `real = false` and skip work
    /// that belongs to a genuine add or remove.
    pub(crate) fn reapply_aura_amount(&mut self, holder: HolderId, index: EffectIndex, amount: i32) {
        let Some(aura) = self.world.aura(holder, index) else {
            return;
        };
        if aura.amount == amount {
            return;
        }
        let was_applied = aura.applied && aura.state.is_listed();
        if was_applied && let Some(ctx) = self.aura_ctx(holder, index) {
            self.handle_aura(&ctx, false, false);
        }
        if let Some(aura) = self.world.aura_mut(holder, index) {
            aura.amount = amount;
        }
        if was_applied && let Some(ctx) = self.aura_ctx(holder, index) {
            self.handle_aura(&ctx, true, false);
        }
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// Removes a holder from its target. Returns `false` when the holder is
    /// unknown or already being removed.
    pub fn remove_holder(&mut self, id: HolderId, mode: RemovalMode) -> bool {
        let Some(holder) = self.world.holder_mut(id) else {
            return false;
        };
        if holder.removing || holder.deleted {
            return false;
        }
        holder.removing = true;
        holder.removal_mode = mode;
        let target = holder.target;
        let caster = holder.caster;
        let spell = Arc::clone(&holder.spell);
        let tracked = holder.single_target_tracked;
        let group = holder.diminishing_group;
        let persistent_objects: Vec<_> = holder
            .iter_auras()
            .filter_map(|aura| match aura.variant {
                AuraVariant::Persistent { object } => Some(object),
                _ => None,
            })
            .collect();
        tracing::debug!(%id, unit = %target, spell = %spell.id, %mode, "removing holder");

        if tracked {
            self.world.untrack_single_target(id);
        }
        for index in EffectIndex::ALL {
            self.unapply_aura_modifier(id, index);
        }
        for object in persistent_objects {
            if let Some(object) = self.world.dynamic_object_mut(object) {
                object.affected.remove(&target);
            }
        }
        self.release_visible_slot(id);

        let now = self.world.clock_ms();
        let other_seal = spell.is_seal()
            && self
                .world
                .holders_on(target)
                .any(|h| h.id != id && h.spell.is_seal());
        if let Some(unit) = self.world.unit_mut(target) {
            unit.holders.retain(|h| *h != id);
            if group != DiminishingGroup::None {
                unit.diminishing.apply_aura(group, false, now);
            }
            if spell.is_seal() && !other_seal {
                unit.aura_state.remove(AuraStateFlags::JUDGEMENT);
            }
        }
        self.emit(SpellEvent::HolderRemoved {
            unit: target,
            holder: id,
            spell: spell.id,
            mode,
        });

        if mode != RemovalMode::Stack {
            self.cleanup_triggered_spells(&spell, target);
        }
        if !matches!(mode, RemovalMode::Stack | RemovalMode::Delete) {
            for link in self.spells.linked_spells(spell.id) {
                match link.kind {
                    LinkedSpellKind::CastOnRemove => self.cast_triggered(target, link.linked, target),
                    LinkedSpellKind::Boost | LinkedSpellKind::RemoveOnRemove => {
                        self.remove_auras_by_spell(target, link.linked, RemovalMode::Default);
                    }
                }
            }
        }
        if mode != RemovalMode::Expire && spell.is_channeled() && caster != target {
            self.interrupt_channel_of(caster, spell.id);
        }

        if let Some(holder) = self.world.holder_mut(id) {
            holder.deleted = true;
            if holder.in_use == 0 {
                self.world.free_holder(id);
            } else {
                tracing::debug!(%id, "holder in use, release deferred");
            }
        }
        true
    }

    /// Removes a single aura from its holder; the holder goes when it is left empty.
    ///
    /// An aura pinned by its own periodic tick is only marked; the holder's
    /// update drains it once the tick returns.
    pub(crate) fn remove_single_aura(&mut self, id: HolderId, index: EffectIndex, mode: RemovalMode) {
        if !self.world.holder(id).is_some_and(SpellAuraHolder::is_live) {
            return;
        }
        if let Some(aura) = self.world.aura_mut(id, index)
            && aura.in_use > 0
        {
            aura.remove_pending = true;
            tracing::debug!(holder = %id, %index, "aura in use, removal deferred");
            return;
        }
        self.unapply_aura_modifier(id, index);
        let empty = match self.world.holder_mut(id) {
            Some(holder) => {
                holder.auras[index.as_usize()] = None;
                holder.is_empty()
            }
            None => return,
        };
        if empty {
            self.remove_holder(id, mode);
        } else {
            self.refresh_visible_slot(id);
        }
    }

    /// Removes infinite auras granted by this spell's trigger spells.
    fn cleanup_triggered_spells(&mut self, spell: &SpellDefinition, target: UnitId) {
        for index in spell.effect_indices() {
            let effect = spell.effect(index);
            let Some(trigger_id) = effect.trigger_spell else {
                continue;
            };
            let Some(trigger) = self.spells.spell(trigger_id) else {
                continue;
            };
            let duration = self.spell_duration(&trigger, None);
            if duration >= 0 {
                continue;
            }
            if effect.aura == crate::aura::AuraType::PeriodicTriggerSpell
                && duration == effect.amplitude_ms
            {
                continue;
            }
            self.remove_auras_by_spell(target, trigger_id, RemovalMode::Default);
        }
    }

    // ========================================================================
    // Bulk removal
    // ========================================================================

    fn remove_holders_matching(
        &mut self,
        unit: UnitId,
        mode: RemovalMode,
        predicate: impl Fn(&SpellAuraHolder) -> bool,
    ) -> usize {
        let ids: Vec<HolderId> = self
            .world
            .holders_on(unit)
            .filter(|h| predicate(h))
            .map(|h| h.id)
            .collect();
        ids.into_iter()
            .filter(|id| self.remove_holder(*id, mode))
            .count()
    }

    pub fn remove_auras_by_spell(&mut self, unit: UnitId, spell: SpellId, mode: RemovalMode) -> usize {
        self.remove_holders_matching(unit, mode, |h| h.spell.id == spell)
    }

    pub fn remove_auras_by_caster_spell(
        &mut self,
        unit: UnitId,
        spell: SpellId,
        caster: UnitId,
        mode: RemovalMode,
    ) -> usize {
        self.remove_holders_matching(unit, mode, |h| h.spell.id == spell && h.caster == caster)
    }

    /// Removes holders whose spell carries any of `flags`, except those of `except`.
    pub fn remove_auras_with_interrupt_flags(
        &mut self,
        unit: UnitId,
        flags: AuraInterruptFlags,
        except: Option<SpellId>,
    ) -> usize {
        self.remove_holders_matching(unit, RemovalMode::Default, |h| {
            h.spell.aura_interrupt_flags.intersects(flags) && Some(h.spell.id) != except
        })
    }

    /// Removes holders whose spell or any effect carries a mechanic in `mask`.
    pub fn remove_auras_by_mechanic(&mut self, unit: UnitId, mask: u32, mode: RemovalMode) -> usize {
        self.remove_holders_matching(unit, mode, |h| {
            !h.passive && h.spell.all_mechanics_mask() & mask != 0
        })
    }

    pub fn remove_all_auras(&mut self, unit: UnitId, mode: RemovalMode) -> usize {
        self.remove_holders_matching(unit, mode, |_| true)
    }

    // ========================================================================
    // Update
    // ========================================================================

    /// Advances one holder by `diff` ms: duration, mana drain, heartbeat
    /// resist, aura updates and channel maintenance.
    pub(crate) fn update_holder(&mut self, id: HolderId, diff: u32) {
        let Some(holder) = self.world.holder_mut(id) else {
            return;
        };
        if !holder.is_live() {
            return;
        }
        holder.in_use += 1;
        let diff_ms = diff.min(i32::MAX as u32) as i32;

        let mut mana_drain = None;
        let mut heartbeat_elapsed = None;
        if holder.duration > 0 {
            holder.duration = (holder.duration - diff_ms).max(0);
            if holder.spell.mana_per_second > 0 {
                holder.mana_drain_timer -= diff_ms;
                if holder.mana_drain_timer <= 0 {
                    holder.mana_drain_timer += self.config.mana_drain_interval_ms;
                    let cost = holder.spell.mana_per_second
                        + holder.spell.mana_per_second_per_level * holder.caster_level;
                    mana_drain = Some((holder.caster, holder.spell.power_type, cost));
                }
            }
            if holder.heartbeat_subject && holder.duration > 0 {
                heartbeat_elapsed = Some(holder.max_duration - holder.duration);
            }
        }

        if let Some((caster, power, cost)) = mana_drain
            && let Some(unit) = self.world.unit_mut(caster)
        {
            unit.modify_power(power, -(cost.min(i32::MAX as u32) as i32));
        }
        if let Some(elapsed) = heartbeat_elapsed
            && self.config.heartbeat_resist
        {
            let target = self.world.holder(id).map_or(UnitId::SYSTEM, |h| h.target);
            let threshold = heartbeat_threshold(elapsed, diff_ms);
            let roll = self.roll_range(target, roll_ctx::HEARTBEAT, 0, 1_000_000);
            // Short updates only get a proportional share of the check.
            let checked = diff >= 1000
                || self.roll_range(target, roll_ctx::HEARTBEAT_GATE, 1, 1000) < diff;
            if f64::from(roll) < threshold
                && checked
                && let Some(holder) = self.world.holder_mut(id)
            {
                tracing::debug!(%id, elapsed, "heartbeat resist ends holder");
                holder.duration = 1;
            }
        }

        for index in EffectIndex::ALL {
            if !self.world.holder(id).is_some_and(SpellAuraHolder::is_live) {
                break;
            }
            if self
                .world
                .aura(id, index)
                .is_some_and(|aura| aura.state == AuraState::Active)
            {
                self.update_aura(id, index, diff);
            }
        }

        let pending: Vec<EffectIndex> = self
            .world
            .holder(id)
            .filter(|h| h.is_live())
            .map(|h| {
                h.iter_auras()
                    .filter(|aura| aura.remove_pending)
                    .map(|aura| aura.effect_index)
                    .collect()
            })
            .unwrap_or_default();
        for index in pending {
            self.remove_single_aura(id, index, RemovalMode::Default);
        }

        self.update_channel(id);
        self.release_holder(id);
    }

    /// Drops one `in_use` pin; frees a deleted holder once nothing pins it.
    pub(crate) fn release_holder(&mut self, id: HolderId) {
        if let Some(holder) = self.world.holder_mut(id) {
            holder.in_use = holder.in_use.saturating_sub(1);
            if holder.deleted && holder.in_use == 0 {
                self.world.free_holder(id);
            }
        }
    }

    /// Channeled holders on other units follow their caster's channel.
    fn update_channel(&mut self, id: HolderId) {
        let Some(holder) = self.world.holder(id) else {
            return;
        };
        if !holder.is_live() || !holder.is_channeled() || holder.caster == holder.target {
            return;
        }
        let (caster, target, spell) = (holder.caster, holder.target, Arc::clone(&holder.spell));
        let Some(caster_unit) = self.world.unit(caster) else {
            self.remove_holder(id, RemovalMode::Default);
            return;
        };
        let channeling = caster_unit
            .current_cast
            .as_ref()
            .is_some_and(|cast| cast.channeled && cast.spell == spell.id);
        if !channeling {
            self.remove_holder(id, RemovalMode::Default);
            return;
        }
        let out_of_range = spell.max_range > 0.0
            && self
                .world
                .unit(target)
                .is_some_and(|t| t.distance_to(caster_unit) > spell.max_range);
        if out_of_range {
            self.interrupt_channel_of(caster, spell.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aura::AuraType;
    use crate::engine::CastRequest;
    use crate::spell::{DurationEntry, Mechanic};
    use crate::test_utils::Fixture;

    #[test]
    fn heartbeat_threshold_grows_with_time_under_control() {
        assert_eq!(heartbeat_threshold(0, 15), 1.0);
        assert_eq!(heartbeat_threshold(1485, 15), 10_000.0);
        assert_eq!(heartbeat_threshold(-50, 15), 1.0);
        assert!(heartbeat_threshold(9000, 1000) > heartbeat_threshold(1000, 1000));
    }

    fn pvp_stun(fx: &mut Fixture) -> (SpellId, UnitId) {
        fx.catalog.insert_duration(2, DurationEntry::fixed(10_000));
        let spell = fx.spell(
            SpellDefinition::builder(90)
                .duration_index(2)
                .mechanic(Mechanic::Stun)
                .attributes(SpellAttributes::HEARTBEAT_RESIST)
                .aura(EffectIndex::Effect0, AuraType::ModStun, 0, 0)
                .build(),
        );
        let caster = fx.player(1, 0);
        let target = fx.player(2, 5);
        fx.engine()
            .cast(CastRequest::new(caster, spell).on(target))
            .expect("cast");
        (spell, target)
    }

    #[test]
    fn heartbeat_resist_breaks_control_between_players() {
        let mut fx = Fixture::new().with_fixed_rng(0);
        fx.config.heartbeat_resist = true;
        let (spell, target) = pvp_stun(&mut fx);
        let id = fx.world.find_holder(target, spell, UnitId(1)).expect("holder");
        assert!(fx.world.holder(id).is_some_and(|h| h.heartbeat_subject));

        fx.engine().update(1000);
        assert_eq!(fx.world.holder(id).map(|h| h.duration), Some(1));
        fx.engine().update(1);
        assert!(!fx.world.has_holder_of_spell(target, spell));
    }

    #[test]
    fn heartbeat_resist_off_keeps_full_duration() {
        let mut fx = Fixture::new().with_fixed_rng(0);
        let (spell, target) = pvp_stun(&mut fx);
        fx.engine().update(1000);
        fx.engine().update(1);
        assert!(fx.world.has_holder_of_spell(target, spell));
    }

    #[test]
    fn pinned_aura_is_removed_after_its_update() {
        let mut fx = Fixture::new();
        let spell = fx.spell(
            SpellDefinition::builder(91)
                .aura(EffectIndex::Effect0, AuraType::ModStat, 5, 0)
                .aura(EffectIndex::Effect1, AuraType::ModResistance, 5, 0)
                .build(),
        );
        let unit = fx.creature(1, 0);
        fx.engine().cast(CastRequest::new(unit, spell)).expect("cast");
        let id = fx.world.find_holder(unit, spell, unit).expect("holder");

        fx.world.aura_mut(id, EffectIndex::Effect0).expect("aura").in_use = 1;
        fx.engine().remove_single_aura(id, EffectIndex::Effect0, RemovalMode::Default);
        assert!(fx
            .world
            .aura(id, EffectIndex::Effect0)
            .is_some_and(|aura| aura.remove_pending && aura.applied));

        fx.world.aura_mut(id, EffectIndex::Effect0).expect("aura").in_use = 0;
        fx.engine().update(100);
        assert!(fx.world.aura(id, EffectIndex::Effect0).is_none());
        assert!(fx.world.aura(id, EffectIndex::Effect1).is_some());
    }

    #[test]
    fn pinned_holder_leaves_the_arena_on_release() {
        let mut fx = Fixture::new();
        let spell = fx.spell(
            SpellDefinition::builder(92)
                .aura(EffectIndex::Effect0, AuraType::ModStat, 5, 0)
                .build(),
        );
        let unit = fx.creature(1, 0);
        fx.engine().cast(CastRequest::new(unit, spell)).expect("cast");
        let id = fx.world.find_holder(unit, spell, unit).expect("holder");

        fx.world.holder_mut(id).expect("holder").in_use = 1;
        assert!(fx.engine().remove_holder(id, RemovalMode::Default));
        assert!(fx.world.holder(id).is_some_and(|h| h.deleted));
        assert!(!fx.engine().remove_holder(id, RemovalMode::Default));

        fx.engine().release_holder(id);
        assert!(fx.world.holder(id).is_none());
    }
}
