//! Visible aura slot bookkeeping.
//!
//! Positive holders take the first free slot in `0..32`, negative ones in
//! `32..48`. Passive holders only get a slot when a totem cast them. Each
//! change is reported as an `AuraSlotUpdate`.

use crate::config::AuraConfig;
use crate::engine::SpellEngine;
use crate::event::SpellEvent;
use crate::types::HolderId;
use crate::unit::AuraSlot;

impl SpellEngine<'_> {
    /// Gives `holder` a visible slot on its target if it qualifies and one is free.
    pub(crate) fn assign_visible_slot(&mut self, holder: HolderId) {
        let Some(h) = self.world.holder(holder) else {
            return;
        };
        let caster_is_totem = self.world.unit(h.caster).is_some_and(|c| c.is_totem());
        if h.passive && !caster_is_totem {
            return;
        }
        let range = if h.positive {
            0..AuraConfig::MAX_POSITIVE_SLOTS
        } else {
            AuraConfig::MAX_POSITIVE_SLOTS..AuraConfig::MAX_VISIBLE_SLOTS
        };
        let target = h.target;
        let Some(slot) = self.world.unit(target).and_then(|u| u.free_slot(range)) else {
            tracing::debug!(%holder, unit = %target, "no free visible slot");
            return;
        };
        if let Some(h) = self.world.holder_mut(holder) {
            h.visible_slot = Some(slot);
        }
        self.refresh_visible_slot(holder);
    }

    /// Rewrites the slot content (flags, level, applications) and reports it.
    pub(crate) fn refresh_visible_slot(&mut self, holder: HolderId) {
        let Some(h) = self.world.holder(holder) else {
            return;
        };
        let Some(slot) = h.visible_slot else {
            return;
        };
        let mut flags = h.effect_mask();
        if h.positive {
            flags |= AuraSlot::FLAG_POSITIVE;
        }
        let count = h.display_count();
        let content = AuraSlot {
            spell: h.spell.id,
            holder,
            flags,
            level: h.caster_level.min(255) as u8,
            applications: count
                .saturating_sub(1)
                .min(AuraConfig::MAX_STACK_DISPLAY - 1) as u8,
        };
        let (target, spell, duration) = (h.target, h.spell.id, h.duration);
        if let Some(entry) = self
            .world
            .unit_mut(target)
            .and_then(|u| u.visible_slots.get_mut(slot as usize))
        {
            *entry = Some(content);
        }
        self.emit(SpellEvent::AuraSlotUpdate {
            unit: target,
            slot,
            spell: Some(spell),
            duration,
            stack_count: count,
        });
    }

    /// Frees the slot of `holder` and reports the cleared slot.
    pub(crate) fn release_visible_slot(&mut self, holder: HolderId) {
        let Some(h) = self.world.holder_mut(holder) else {
            return;
        };
        let Some(slot) = h.visible_slot.take() else {
            return;
        };
        let target = h.target;
        if let Some(entry) = self
            .world
            .unit_mut(target)
            .and_then(|u| u.visible_slots.get_mut(slot as usize))
            && entry.is_some_and(|s| s.holder == holder)
        {
            *entry = None;
        }
        self.emit(SpellEvent::AuraSlotUpdate {
            unit: target,
            slot,
            spell: None,
            duration: 0,
            stack_count: 0,
        });
    }
}

#[cfg(test)]
mod tests {
    use crate::aura::AuraType;
    use crate::engine::CastRequest;
    use crate::event::SpellEvent;
    use crate::holder::RemovalMode;
    use crate::spell::{SpellAttributes, SpellDefinition};
    use crate::test_utils::Fixture;
    use crate::types::{EffectIndex, HolderId};

    #[test]
    fn positive_and_negative_holders_use_separate_ranges() {
        let mut fx = Fixture::new();
        let buff = fx.spell(
            SpellDefinition::builder(120)
                .aura(EffectIndex::Effect0, AuraType::ModStat, 5, 0)
                .build(),
        );
        let stun = fx.spell(
            SpellDefinition::builder(121)
                .aura(EffectIndex::Effect0, AuraType::ModStun, 0, 0)
                .build(),
        );
        let caster = fx.player(1, 0);
        let target = fx.creature(2, 5);
        let buffed = fx.engine().cast(CastRequest::new(target, buff)).expect("cast");
        let stunned = fx
            .engine()
            .cast(CastRequest::new(caster, stun).on(target))
            .expect("cast");

        let slot_of = |fx: &Fixture, id: HolderId| fx.world.holder(id).and_then(|h| h.visible_slot);
        assert_eq!(slot_of(&fx, buffed.holders[0]), Some(0));
        assert_eq!(slot_of(&fx, stunned.holders[0]), Some(32));
        assert_eq!(fx.unit(target).visible_slot(32).map(|s| s.spell), Some(stun));

        fx.engine().remove_auras_by_spell(target, buff, RemovalMode::Default);
        assert!(fx.unit(target).visible_slot(0).is_none());
        assert!(fx.world.events().iter().any(|e| matches!(
            e,
            SpellEvent::AuraSlotUpdate { slot: 0, spell: None, .. }
        )));
    }

    #[test]
    fn passive_holders_stay_hidden() {
        let mut fx = Fixture::new();
        let passive = fx.spell(
            SpellDefinition::builder(122)
                .attributes(SpellAttributes::PASSIVE)
                .aura(EffectIndex::Effect0, AuraType::ModStat, 5, 0)
                .build(),
        );
        let unit = fx.player(1, 0);
        let outcome = fx.engine().cast(CastRequest::new(unit, passive)).expect("cast");
        assert_eq!(fx.world.holder(outcome.holders[0]).and_then(|h| h.visible_slot), None);
        assert!(fx.unit(unit).visible_slots.iter().all(Option::is_none));
    }
}
