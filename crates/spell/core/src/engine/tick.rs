//! The simulation tick: holders, ground effects, casts and lockouts.
//!
//! Every collection is walked through an id snapshot taken up front; each
//! id is re-resolved before use because any step may remove units, holders
//! or objects further down the list.

use std::sync::Arc;

use crate::aura::{Aura, AuraVariant};
use crate::engine::SpellEngine;
use crate::holder::RemovalMode;
use crate::types::{DynObjectId, HolderId, UnitId};

impl SpellEngine<'_> {
    /// Advances the world by `diff` milliseconds.
    ///
    /// Units are processed in id order, holders of a unit in insertion
    /// order. Holders whose duration ran out during the pass are removed
    /// with [`RemovalMode::Expire`] once the unit's pass ends.
    pub fn update(&mut self, diff: u32) {
        self.world.advance_clock(diff);
        tracing::trace!(diff, clock = self.world.clock_ms(), "update");

        for unit in self.world.unit_ids() {
            self.update_unit_holders(unit, diff);
        }
        for object in self.world.dynamic_object_ids() {
            self.update_dynamic_object(object, diff);
        }
        for unit in self.world.unit_ids() {
            self.update_cast(unit, diff);
        }
        self.finish_command();
    }

    fn update_unit_holders(&mut self, unit: UnitId, diff: u32) {
        let ids = self.world.holder_ids(unit);
        for id in &ids {
            self.update_holder(*id, diff);
        }
        let expired: Vec<HolderId> = ids
            .into_iter()
            .filter(|id| {
                self.world
                    .holder(*id)
                    .is_some_and(|h| h.is_live() && h.duration == 0 && !h.permanent)
            })
            .collect();
        for id in expired {
            tracing::debug!(holder = %id, %unit, "holder expired");
            self.remove_holder(id, RemovalMode::Expire);
        }
    }

    fn update_dynamic_object(&mut self, id: DynObjectId, diff: u32) {
        let diff_ms = diff.min(i32::MAX as u32) as i32;
        let Some(object) = self.world.dynamic_object_mut(id) else {
            return;
        };
        if object.duration_ms > 0 {
            object.duration_ms = (object.duration_ms - diff_ms).max(0);
        }
        let expired = object.duration_ms == 0;
        let caster = object.caster;
        if expired || self.world.unit(caster).is_none() {
            tracing::debug!(object = id.0, %caster, "ground effect gone");
            self.world.remove_dynamic_object(id);
            return;
        }
        self.sweep_dynamic_object(id);
    }

    /// Hands the object's persistent aura to every hostile living unit in
    /// its radius that does not carry it yet.
    pub(crate) fn sweep_dynamic_object(&mut self, id: DynObjectId) {
        let Some(object) = self.world.dynamic_object(id) else {
            return;
        };
        let (caster, spell_id, index, duration) =
            (object.caster, object.spell, object.effect_index, object.duration_ms);
        let Some(caster_unit) = self.world.unit(caster) else {
            return;
        };
        let fresh: Vec<UnitId> = self
            .world
            .units_within(&object.position, object.radius)
            .into_iter()
            .filter(|unit| !object.affected.contains(unit))
            .filter(|unit| {
                self.world
                    .unit(*unit)
                    .is_some_and(|u| u.is_alive() && caster_unit.is_hostile_to(u))
            })
            .collect();
        if fresh.is_empty() {
            return;
        }
        let Some(spell) = self.lookup_spell(spell_id) else {
            return;
        };

        for target in fresh {
            let immune = self
                .world
                .unit(target)
                .is_some_and(|u| self.policy.is_immune_to_spell(u, &spell));
            if immune {
                continue;
            }
            let amount = self.calculate_amount(&spell, index, caster, None);
            let positive = self.policy.is_positive_effect(&spell, index);
            let variant = AuraVariant::Persistent { object: id };

            let carrier = match self.world.find_holder(target, spell.id, caster) {
                Some(existing) => {
                    let has_slot = self.world.holder(existing).is_some_and(|h| h.aura(index).is_some());
                    if !has_slot {
                        let aura = Aura::new(existing, &spell, index, amount, 1, positive).with_variant(variant);
                        if let Some(holder) = self.world.holder_mut(existing) {
                            holder.set_aura(aura);
                        }
                        self.apply_aura_modifier(existing, index);
                        self.refresh_visible_slot(existing);
                    }
                    Some(existing)
                }
                None => {
                    let mut holder = self.create_holder(Arc::clone(&spell), target, caster, None);
                    holder.set_duration(duration);
                    let aura = Aura::new(holder.id, &spell, index, amount, 1, positive).with_variant(variant);
                    holder.set_aura(aura);
                    self.add_holder(holder)
                }
            };
            if carrier.is_some()
                && let Some(object) = self.world.dynamic_object_mut(id)
            {
                object.affected.insert(target);
            }
        }
    }

    /// Counts down the unit's cast, school lockouts and temporary enchants.
    fn update_cast(&mut self, unit: UnitId, diff: u32) {
        let diff_ms = diff.min(i32::MAX as u32) as i32;
        let finished = self
            .with_unit(unit, |u| {
                for lockout in &mut u.school_lockout_ms {
                    *lockout = lockout.saturating_sub(diff);
                }
                for item in &mut u.inventory.equipped {
                    if let Some((enchant, remaining)) = item.temp_enchant {
                        item.temp_enchant =
                            (remaining > diff).then(|| (enchant, remaining - diff));
                    }
                }
                let cast = u.current_cast.as_mut()?;
                if cast.remaining_ms < 0 {
                    return None;
                }
                cast.remaining_ms = (cast.remaining_ms - diff_ms).max(0);
                (cast.remaining_ms == 0).then_some(cast.spell)
            })
            .flatten();
        if let Some(spell) = finished {
            tracing::trace!(%unit, %spell, "cast finished");
            self.with_unit(unit, |u| u.current_cast = None);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::aura::AuraType;
    use crate::effect::SpellEffectKind;
    use crate::engine::CastRequest;
    use crate::event::SpellEvent;
    use crate::holder::RemovalMode;
    use crate::spell::{DurationEntry, ImplicitTarget, SchoolMask, SpellDefinition, SpellEffectEntry};
    use crate::test_utils::Fixture;
    use crate::types::{EffectIndex, Position};

    #[test]
    fn holders_expire_after_their_duration() {
        let mut fx = Fixture::new();
        fx.catalog.insert_duration(2, DurationEntry::fixed(1000));
        let spell = fx.spell(
            SpellDefinition::builder(60)
                .duration_index(2)
                .aura(EffectIndex::Effect0, AuraType::ModStun, 0, 0)
                .build(),
        );
        let caster = fx.player(1, 0);
        let target = fx.creature(2, 5);
        fx.engine().cast(CastRequest::new(caster, spell).on(target)).expect("cast");

        fx.engine().update(600);
        assert!(fx.world.has_holder_of_spell(target, spell));
        fx.engine().update(600);
        assert!(!fx.world.has_holder_of_spell(target, spell));
        assert!(fx.world.events().iter().any(|e| matches!(
            e,
            SpellEvent::HolderRemoved { mode: RemovalMode::Expire, .. }
        )));
    }

    #[test]
    fn ground_effect_applies_to_enemies_and_despawns() {
        let mut fx = Fixture::new();
        fx.catalog.insert_duration(4, DurationEntry::fixed(3000));
        fx.catalog.insert_radius(3, 8.0);
        let blizzard = fx.spell(
            SpellDefinition::builder(61)
                .school(SchoolMask::FROST)
                .duration_index(4)
                .effect(
                    EffectIndex::Effect0,
                    SpellEffectEntry {
                        aura: AuraType::PeriodicDamage,
                        base_points: 20,
                        amplitude_ms: 1000,
                        radius_index: 3,
                        target: ImplicitTarget::Destination,
                        ..SpellEffectEntry::new(SpellEffectKind::PersistentAreaAura)
                    },
                )
                .build(),
        );
        let caster = fx.player(1, 0);
        let inside = fx.creature(2, 20);
        let outside = fx.creature(3, 40);
        fx.engine()
            .cast(CastRequest::new(caster, blizzard).at(Position::new(22, 0)))
            .expect("cast");
        assert!(fx.world.has_holder_of_spell(inside, blizzard));
        assert!(!fx.world.has_holder_of_spell(outside, blizzard));

        // The second enemy walks in and is picked up on the next sweep.
        fx.world.unit_mut(outside).expect("unit").position = Position::new(25, 0);
        fx.engine().update(1000);
        assert!(fx.world.has_holder_of_spell(outside, blizzard));
        assert!(fx.unit(inside).health() < 1000);

        fx.engine().update(2000);
        assert!(fx.world.dynamic_object_ids().is_empty());
        fx.engine().update(100);
        assert!(!fx.world.has_holder_of_spell(inside, blizzard));
    }

    #[test]
    fn school_lockout_counts_down() {
        let mut fx = Fixture::new();
        let unit = fx.player(1, 0);
        fx.world.unit_mut(unit).expect("unit").school_lockout_ms[2] = 1500;
        fx.engine().update(1000);
        assert_eq!(fx.unit(unit).school_lockout_ms[2], 500);
        fx.engine().update(1000);
        assert_eq!(fx.unit(unit).school_lockout_ms[2], 0);
    }
}
