//! Area aura propagation and persistent (ground) aura maintenance.
//!
//! The owner's aura (holder target == caster) recomputes its members every
//! update and hands each new member a satellite aura, possibly of a lower
//! rank. It never removes satellites itself: each satellite validates its
//! link to the owner on its own update and drops out when the link breaks.

use std::sync::Arc;

use crate::aura::{AreaAuraKind, Aura, AuraVariant};
use crate::engine::SpellEngine;
use crate::types::{DynObjectId, EffectIndex, GroupId, HolderId, UnitId};
use crate::unit::Unit;

impl SpellEngine<'_> {
    /// Group a unit counts as a member of: its owner's group for pets and
    /// totems, its own otherwise.
    fn party_group(&self, unit: &Unit) -> Option<GroupId> {
        unit.charmer_or_owner()
            .and_then(|owner| self.world.unit(owner))
            .map_or(unit.group, |owner| owner.group)
    }

    /// Units that should carry the owner's area aura, excluding the owner.
    pub(crate) fn area_members(&self, owner_id: UnitId, kind: AreaAuraKind, radius: f32) -> Vec<UnitId> {
        let Some(owner) = self.world.unit(owner_id) else {
            return Vec::new();
        };
        let in_reach = |unit: &Unit| {
            unit.id != owner_id
                && unit.is_alive()
                && !unit.isolated
                && owner.distance_to(unit) <= radius
        };
        let master = owner.charmer_or_owner().and_then(|id| self.world.unit(id));
        match kind {
            AreaAuraKind::Pet => master
                .filter(|m| in_reach(m))
                .map(|m| vec![m.id])
                .unwrap_or_default(),
            AreaAuraKind::Party => {
                if let Some(group) = self.party_group(owner) {
                    self.world
                        .units()
                        .filter(|u| self.party_group(u) == Some(group))
                        .filter(|u| owner.is_friendly_to(u) && in_reach(u))
                        .map(|u| u.id)
                        .collect()
                } else {
                    let pet = owner.pet.and_then(|id| self.world.unit(id));
                    master
                        .into_iter()
                        .chain(pet)
                        .filter(|u| in_reach(u))
                        .map(|u| u.id)
                        .collect()
                }
            }
        }
    }

    /// Owner side: gives every member in reach a satellite aura it lacks.
    pub(crate) fn propagate_area_aura(&mut self, id: HolderId, index: EffectIndex) {
        let Some(holder) = self.world.holder(id) else {
            return;
        };
        let Some(aura) = holder.aura(index) else {
            return;
        };
        let AuraVariant::Area { radius, kind, .. } = aura.variant else {
            return;
        };
        let (owner, spell, base, duration) = (
            holder.target,
            Arc::clone(&holder.spell),
            aura.stack_scaled_base,
            holder.duration,
        );
        if self.world.unit(owner).is_none_or(|u| u.isolated) {
            return;
        }

        for member in self.area_members(owner, kind, radius) {
            let Some(level) = self.world.unit(member).map(|u| u.level) else {
                continue;
            };
            let Some(rank) = self.spells.rank_for_level(&spell, level) else {
                continue;
            };
            let present = self
                .world
                .holders_on(member)
                .any(|h| h.spell.id == rank.id && h.aura(index).is_some());
            if present {
                continue;
            }
            let rank_base = if rank.id == spell.id {
                base
            } else {
                rank.effect(index).base_points
            };
            let positive = self.policy.is_positive_effect(&rank, index);
            let variant = AuraVariant::Area {
                radius,
                kind,
                original_rank: spell.id,
            };

            if let Some(existing) = self.world.find_holder(member, rank.id, owner) {
                let aura = Aura::new(existing, &rank, index, rank_base, 1, positive).with_variant(variant);
                if let Some(holder) = self.world.holder_mut(existing) {
                    holder.set_aura(aura);
                }
                self.apply_aura_modifier(existing, index);
                self.refresh_visible_slot(existing);
                continue;
            }

            let mut satellite = self.create_holder(Arc::clone(&rank), member, owner, None);
            satellite.set_duration(duration);
            let aura = Aura::new(satellite.id, &rank, index, rank_base, 1, positive).with_variant(variant);
            satellite.set_aura(aura);
            tracing::trace!(holder = %id, unit = %member, spell = %rank.id, "area aura reaches member");
            self.add_holder(satellite);
        }
    }

    /// Satellite side: whether the aura may stay on its target.
    pub(crate) fn area_satellite_valid(&self, id: HolderId, index: EffectIndex) -> bool {
        let Some(holder) = self.world.holder(id) else {
            return false;
        };
        let Some(AuraVariant::Area {
            radius,
            kind,
            original_rank,
        }) = holder.aura(index).map(|aura| aura.variant)
        else {
            return true;
        };
        let (Some(caster), Some(target)) = (self.world.unit(holder.caster), self.world.unit(holder.target))
        else {
            return false;
        };
        let owner_keeps_aura = self.world.holders_on(caster.id).any(|h| {
            h.spell.id == original_rank
                && h.target == caster.id
                && h.aura(index).is_some_and(Aura::is_listed)
        });
        if caster.isolated
            || !owner_keeps_aura
            || caster.distance_to(target) > radius
            || !caster.is_friendly_to(target)
        {
            return false;
        }
        match kind {
            AreaAuraKind::Pet => caster.charmer_or_owner() == Some(target.id),
            AreaAuraKind::Party => {
                if caster.charmer_or_owner() == Some(target.id)
                    || target.charmer_or_owner() == Some(caster.id)
                {
                    return true;
                }
                let group = self.party_group(caster);
                group.is_some() && group == self.party_group(target)
            }
        }
    }

    /// Persistent aura check: the ground object still exists and covers the target.
    ///
    /// A target that walked out is dropped from the object's affected set so
    /// it picks the aura up again on return.
    pub(crate) fn persistent_aura_valid(&mut self, id: HolderId, object: DynObjectId) -> bool {
        let Some(holder) = self.world.holder(id) else {
            return false;
        };
        let target = holder.target;
        let caster_present = self.world.unit(holder.caster).is_some();
        let Some(position) = self.world.unit(target).map(|u| u.position) else {
            return false;
        };
        let Some(dyn_object) = self.world.dynamic_object_mut(object) else {
            return false;
        };
        if dyn_object.covers(&position) && caster_present {
            return true;
        }
        dyn_object.affected.remove(&target);
        false
    }
}
