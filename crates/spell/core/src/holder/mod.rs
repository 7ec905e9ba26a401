//! Per-(spell, caster, target) container of up to three auras.
//!
//! A [`SpellAuraHolder`] lives in the world's holder arena keyed by
//! [`HolderId`]. Units reference holders by id only; the engine resolves ids
//! through the arena each time and tolerates holders that vanished in the
//! meantime. Lifecycle operations (add, stack, remove, update) are
//! implemented on [`crate::engine::SpellEngine`] in [`lifecycle`],
//! [`stacking`] and [`slots`].

pub mod lifecycle;
pub mod slots;
pub mod stacking;

use std::sync::Arc;

use crate::aura::Aura;
use crate::config::AuraConfig;
use crate::spell::SpellDefinition;
use crate::types::{EffectIndex, HolderId, ItemId, SpellId, UnitId};
use crate::unit::DiminishingGroup;

/// Why a holder left its target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RemovalMode {
    #[default]
    Default,
    Expire,
    Dispel,
    /// Replaced by a newer application; linked and triggered cleanup is skipped.
    Stack,
    Death,
    /// World teardown; no follow-up casts.
    Delete,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpellAuraHolder {
    pub id: HolderId,
    #[cfg_attr(feature = "serde", serde(with = "spell_ref"))]
    pub spell: Arc<SpellDefinition>,
    pub target: UnitId,
    /// Re-resolved through the world on every use; the caster may be gone.
    pub caster: UnitId,
    pub cast_item: Option<ItemId>,
    pub auras: [Option<Aura>; AuraConfig::MAX_EFFECT_INDEX],
    /// Remaining ms; `-1` for infinite.
    pub duration: i32,
    pub max_duration: i32,
    pub stack_amount: u32,
    pub proc_charges: u32,
    pub removal_mode: RemovalMode,
    pub visible_slot: Option<u8>,
    pub passive: bool,
    pub permanent: bool,
    pub death_persistent: bool,
    pub removed_on_shape_lost: bool,
    pub positive: bool,
    pub triggered: bool,
    /// Caster level when the holder was built; drives slot level and mana drain.
    pub caster_level: u32,
    pub in_use: u32,
    pub deleted: bool,
    pub removing: bool,
    pub heartbeat_subject: bool,
    pub mana_drain_timer: i32,
    pub single_target_tracked: bool,
    pub diminishing_group: DiminishingGroup,
}

impl SpellAuraHolder {
    pub fn new(
        id: HolderId,
        spell: Arc<SpellDefinition>,
        target: UnitId,
        caster: UnitId,
        cast_item: Option<ItemId>,
    ) -> Self {
        let passive = spell.is_passive();
        let death_persistent = spell.is_death_persistent();
        let proc_charges = spell.proc_charges;
        Self {
            id,
            target,
            caster,
            cast_item,
            auras: [None, None, None],
            duration: -1,
            max_duration: -1,
            stack_amount: 1,
            proc_charges,
            removal_mode: RemovalMode::Default,
            visible_slot: None,
            passive,
            permanent: true,
            death_persistent,
            removed_on_shape_lost: spell.stances != 0 && passive,
            positive: true,
            triggered: false,
            caster_level: 1,
            in_use: 0,
            deleted: false,
            removing: false,
            heartbeat_subject: false,
            mana_drain_timer: 0,
            single_target_tracked: false,
            diminishing_group: DiminishingGroup::None,
            spell,
        }
    }

    pub fn spell_id(&self) -> SpellId {
        self.spell.id
    }

    /// Sets both the current and maximum duration. Negative means infinite.
    pub fn set_duration(&mut self, duration: i32) {
        self.duration = duration;
        self.max_duration = duration;
        self.permanent = duration < 0;
    }

    pub fn refresh_duration(&mut self) {
        self.duration = self.max_duration;
    }

    pub fn aura(&self, index: EffectIndex) -> Option<&Aura> {
        self.auras[index.as_usize()].as_ref()
    }

    pub fn aura_mut(&mut self, index: EffectIndex) -> Option<&mut Aura> {
        self.auras[index.as_usize()].as_mut()
    }

    pub fn set_aura(&mut self, aura: Aura) {
        let index = aura.effect_index.as_usize();
        self.auras[index] = Some(aura);
    }

    pub fn iter_auras(&self) -> impl Iterator<Item = &Aura> {
        self.auras.iter().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.auras.iter().all(Option::is_none)
    }

    /// Holder is still attached and not being torn down.
    pub fn is_live(&self) -> bool {
        !self.deleted && !self.removing
    }

    pub fn is_channeled(&self) -> bool {
        self.spell.is_channeled()
    }

    pub fn is_single_target(&self) -> bool {
        self.spell
            .attributes
            .contains(crate::spell::SpellAttributes::SINGLE_TARGET)
    }

    /// Application count shown in the visible slot.
    pub fn display_count(&self) -> u32 {
        if self.proc_charges > 0 {
            self.proc_charges * self.stack_amount
        } else {
            self.stack_amount
        }
    }

    /// Bit per occupied effect index.
    pub fn effect_mask(&self) -> u8 {
        self.iter_auras()
            .fold(0, |mask, aura| mask | aura.effect_index.mask_bit())
    }
}

/// Holders serialize their spell by id; snapshot loading rebinds the
/// definition through the spell store.
#[cfg(feature = "serde")]
pub(crate) mod spell_ref {
    use std::sync::Arc;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::spell::SpellDefinition;
    use crate::types::SpellId;

    pub fn serialize<S: Serializer>(spell: &Arc<SpellDefinition>, serializer: S) -> Result<S::Ok, S::Error> {
        spell.id.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Arc<SpellDefinition>, D::Error> {
        let id = SpellId::deserialize(deserializer)?;
        Ok(Arc::new(SpellDefinition::builder(id.0).build()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aura::AuraType;

    #[test]
    fn display_count_multiplies_charges() {
        let spell = Arc::new(SpellDefinition::builder(1).build());
        let mut holder = SpellAuraHolder::new(HolderId(1), spell, UnitId(1), UnitId(1), None);
        holder.stack_amount = 3;
        assert_eq!(holder.display_count(), 3);
        holder.proc_charges = 2;
        assert_eq!(holder.display_count(), 6);
    }

    #[test]
    fn effect_mask_tracks_occupied_slots() {
        let spell = Arc::new(
            SpellDefinition::builder(1)
                .aura(EffectIndex::Effect0, AuraType::ModStat, 5, 0)
                .aura(EffectIndex::Effect2, AuraType::ModResistance, 5, 0)
                .build(),
        );
        let mut holder =
            SpellAuraHolder::new(HolderId(1), Arc::clone(&spell), UnitId(1), UnitId(1), None);
        for index in [EffectIndex::Effect0, EffectIndex::Effect2] {
            holder.set_aura(Aura::new(HolderId(1), &spell, index, 5, 1, true));
        }
        assert_eq!(holder.effect_mask(), 0b101);
        holder.set_duration(-1);
        assert!(holder.permanent);
        holder.set_duration(5000);
        assert!(!holder.permanent);
    }
}
