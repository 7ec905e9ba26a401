//! Single effect instances owned by a holder.
//!
//! An [`Aura`] is one effect slot of a [`crate::holder::SpellAuraHolder`]
//! applied to a unit. It carries the modifier (type, amount, misc values),
//! periodic timing and a variant payload for area and persistent auras.
//! Behavior lives in the engine: [`handlers`] for apply/unapply,
//! [`periodic`] for ticks and [`area`] for propagation.

pub mod area;
pub mod handlers;
mod kind;
pub mod periodic;

use std::sync::Arc;

pub use kind::AuraType;

use crate::spell::SpellDefinition;
use crate::types::{DynObjectId, EffectIndex, HolderId, SpellId, UnitId};

/// Lifecycle of an aura inside its holder.
///
/// Scans over a unit's auras only see `Applying` and `Active` auras, so a
/// handler running its unapply never finds its own aura.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AuraState {
    #[default]
    Applying,
    Active,
    Unapplying,
    Destroyed,
}

impl AuraState {
    /// True while the aura is visible to scans of the target's auras.
    pub const fn is_listed(self) -> bool {
        matches!(self, Self::Applying | Self::Active)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AreaAuraKind {
    /// Party members around the caster.
    Party,
    /// The caster's owner (pet auras).
    Pet,
}

/// Variant payload of an aura.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AuraVariant {
    #[default]
    Plain,
    Area {
        radius: f32,
        kind: AreaAuraKind,
        /// Rank the caster holds; satellites may carry a lower rank.
        original_rank: SpellId,
    },
    Persistent {
        object: DynObjectId,
    },
    SingleEnemy {
        tracked: Option<UnitId>,
    },
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aura {
    pub holder: HolderId,
    pub effect_index: EffectIndex,
    pub aura_type: AuraType,
    /// Current modifier amount: `stack_scaled_base × stack_amount`.
    pub amount: i32,
    /// Amount of a single stack.
    pub stack_scaled_base: i32,
    pub misc_value: i32,
    pub misc_value_b: i32,
    /// Remaining ms until the next periodic tick.
    pub periodic_timer: i32,
    pub period: i32,
    pub tick_count: u32,
    pub is_periodic: bool,
    pub is_positive: bool,
    pub state: AuraState,
    pub in_use: u32,
    /// Set before the apply handler runs; teardown only unapplies applied auras.
    pub applied: bool,
    /// Marked by an update pass; the aura leaves its holder once the pass ends.
    pub remove_pending: bool,
    pub variant: AuraVariant,
}

impl Aura {
    /// Builds an aura for effect `index` of `spell` with a per-stack amount.
    ///
    /// The periodic timer starts at one full period, so the first tick fires
    /// one period after application.
    pub fn new(
        holder: HolderId,
        spell: &SpellDefinition,
        index: EffectIndex,
        base_amount: i32,
        stack: u32,
        positive: bool,
    ) -> Self {
        let effect = spell.effect(index);
        let aura_type = effect.aura;
        let period = effect.amplitude_ms.max(0);
        Self {
            holder,
            effect_index: index,
            aura_type,
            amount: base_amount.saturating_mul(stack.max(1) as i32),
            stack_scaled_base: base_amount,
            misc_value: effect.misc_value,
            misc_value_b: effect.misc_value_b,
            periodic_timer: period,
            period,
            tick_count: 0,
            is_periodic: aura_type.is_periodic() && period > 0,
            is_positive: positive,
            state: AuraState::Applying,
            in_use: 0,
            applied: false,
            remove_pending: false,
            variant: AuraVariant::Plain,
        }
    }

    pub fn with_variant(mut self, variant: AuraVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Sets the period for types that tick without an amplitude (regen auras).
    pub fn with_default_period(mut self, period: i32) -> Self {
        if self.period <= 0 && self.aura_type.is_periodic() && period > 0 {
            self.period = period;
            self.periodic_timer = period;
            self.is_periodic = true;
        }
        self
    }

    pub fn is_area_aura(&self) -> bool {
        matches!(self.variant, AuraVariant::Area { .. })
    }

    pub fn is_persistent(&self) -> bool {
        matches!(self.variant, AuraVariant::Persistent { .. })
    }

    pub fn is_listed(&self) -> bool {
        self.state.is_listed()
    }
}

/// Snapshot handed to aura handlers.
///
/// Handlers may mutate the world freely, including removing the holder this
/// snapshot came from, so they never borrow the aura itself.
#[derive(Clone, Debug)]
pub struct AuraCtx {
    pub holder: HolderId,
    pub index: EffectIndex,
    pub spell: Arc<SpellDefinition>,
    pub aura_type: AuraType,
    pub amount: i32,
    pub misc_value: i32,
    pub misc_value_b: i32,
    pub target: UnitId,
    pub caster: UnitId,
    pub positive: bool,
    pub stack: u32,
    pub period: i32,
    pub base_amount: i32,
}

impl AuraCtx {
    pub fn spell_id(&self) -> SpellId {
        self.spell.id
    }

    pub fn effect(&self) -> &crate::spell::SpellEffectEntry {
        self.spell.effect(self.index)
    }

    /// Signed amount for the apply or unapply direction.
    pub fn signed(&self, apply: bool) -> i32 {
        if apply { self.amount } else { -self.amount }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_starts_at_one_period() {
        let spell = SpellDefinition::builder(1)
            .aura(EffectIndex::Effect0, AuraType::PeriodicDamage, 10, 3000)
            .build();
        let aura = Aura::new(HolderId(1), &spell, EffectIndex::Effect0, 10, 2, false);
        assert!(aura.is_periodic);
        assert_eq!(aura.periodic_timer, 3000);
        assert_eq!(aura.amount, 20);
        assert_eq!(aura.state, AuraState::Applying);
    }

    #[test]
    fn regen_without_amplitude_takes_default_period() {
        let spell = SpellDefinition::builder(2)
            .aura(EffectIndex::Effect0, AuraType::ModRegen, 5, 0)
            .build();
        let aura = Aura::new(HolderId(1), &spell, EffectIndex::Effect0, 5, 1, true);
        assert!(!aura.is_periodic);
        let aura = aura.with_default_period(5000);
        assert!(aura.is_periodic);
        assert_eq!(aura.period, 5000);
    }

    #[test]
    fn unapplying_auras_are_not_listed() {
        assert!(AuraState::Applying.is_listed());
        assert!(AuraState::Active.is_listed());
        assert!(!AuraState::Unapplying.is_listed());
        assert!(!AuraState::Destroyed.is_listed());
    }
}
