//! Stealth, invisibility and detection handlers.
//!
//! Levels and masks are recomputed from the listed auras on every change,
//! so removing one aura never clears what another still grants.

use crate::aura::{AuraCtx, AuraType};
use crate::engine::SpellEngine;
use crate::types::UnitId;
use crate::unit::{DynamicFlags, PlayerFlags, Visibility};

impl SpellEngine<'_> {
    /// Mask of `1 << misc` over listed auras of `ty`.
    fn misc_bit_mask(&self, unit: UnitId, ty: AuraType) -> u32 {
        self.world
            .auras_of_type(unit, ty)
            .filter_map(|aura| u32::try_from(aura.misc_value).ok())
            .filter(|bit| *bit < 32)
            .fold(0, |mask, bit| mask | (1 << bit))
    }

    /// Stealth wins over invisibility; neither leaves the unit visible.
    fn update_visibility(&mut self, unit: UnitId) {
        let stealthed = self.world.has_aura_type(unit, AuraType::ModStealth);
        let level = self.world.total_aura_modifier(unit, AuraType::ModStealth)
            + self.world.total_aura_modifier(unit, AuraType::ModStealthLevel);
        let invisibility = self.misc_bit_mask(unit, AuraType::ModInvisibility);
        self.with_unit(unit, |u| {
            u.stealth_level = if stealthed { level } else { 0 };
            u.invisibility_mask = invisibility;
            u.visibility = if stealthed {
                Visibility::Stealthed
            } else if invisibility != 0 {
                Visibility::Invisible
            } else {
                Visibility::Visible
            };
        });
    }

    pub(super) fn aura_mod_stealth(&mut self, ctx: &AuraCtx, apply: bool, real: bool) {
        if apply && real && ctx.aura_type == AuraType::ModStealth {
            self.interrupt_cast(ctx.target);
        }
        self.update_visibility(ctx.target);
    }

    pub(super) fn aura_mod_invisibility(&mut self, ctx: &AuraCtx, apply: bool, real: bool) {
        if apply && real {
            self.interrupt_cast(ctx.target);
        }
        self.update_visibility(ctx.target);
    }

    pub(super) fn aura_mod_stealth_detect(&mut self, ctx: &AuraCtx) {
        let detect = self
            .world
            .total_aura_modifier(ctx.target, AuraType::ModStealthDetect);
        self.with_unit(ctx.target, |unit| unit.stealth_detect = detect);
    }

    pub(super) fn aura_mod_invisibility_detection(&mut self, ctx: &AuraCtx) {
        let mask = self.misc_bit_mask(ctx.target, AuraType::ModInvisibilityDetection);
        self.with_unit(ctx.target, |unit| unit.invisibility_detect_mask = mask);
    }

    pub(super) fn aura_player_flag(&mut self, ctx: &AuraCtx, apply: bool) {
        let flag = match ctx.aura_type {
            AuraType::TrackStealthed => PlayerFlags::TRACK_STEALTHED,
            AuraType::DetectAmore => PlayerFlags::DETECT_AMORE,
            AuraType::AurasVisible => PlayerFlags::AURAS_VISIBLE,
            _ => return,
        };
        if !apply && self.other_aura_of(ctx, &[ctx.aura_type]) {
            return;
        }
        self.with_unit(ctx.target, |unit| unit.player_flags.set(flag, apply));
    }

    pub(super) fn aura_untrackable(&mut self, ctx: &AuraCtx, apply: bool) {
        if !apply && self.other_aura_of(ctx, &[AuraType::Untrackable]) {
            return;
        }
        self.with_unit(ctx.target, |unit| unit.dynamic_flags.set(DynamicFlags::UNTRACKABLE, apply));
    }

    pub(super) fn aura_empathy(&mut self, ctx: &AuraCtx, apply: bool) {
        if !apply && self.other_aura_of(ctx, &[AuraType::Empathy]) {
            return;
        }
        self.with_unit(ctx.target, |unit| unit.dynamic_flags.set(DynamicFlags::SPECIAL_INFO, apply));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::SpellEffectKind;
    use crate::engine::CastRequest;
    use crate::holder::RemovalMode;
    use crate::spell::{SpellDefinition, SpellEffectEntry};
    use crate::test_utils::Fixture;
    use crate::types::{EffectIndex, SpellId};

    fn veil(fx: &mut Fixture, id: u32, aura: AuraType, base_points: i32, misc_value: i32) -> SpellId {
        fx.spell(
            SpellDefinition::builder(id)
                .effect(
                    EffectIndex::Effect0,
                    SpellEffectEntry {
                        aura,
                        base_points,
                        misc_value,
                        ..SpellEffectEntry::new(SpellEffectKind::ApplyAura)
                    },
                )
                .build(),
        )
    }

    #[test]
    fn stealth_outranks_invisibility_and_unwinds_in_order() {
        let mut fx = Fixture::new();
        let invisibility = veil(&mut fx, 160, AuraType::ModInvisibility, 0, 0);
        let stealth = veil(&mut fx, 161, AuraType::ModStealth, 5, 0);
        let unit = fx.player(1, 0);

        fx.engine().cast(CastRequest::new(unit, invisibility)).expect("cast");
        assert_eq!(fx.unit(unit).visibility, Visibility::Invisible);
        assert_eq!(fx.unit(unit).invisibility_mask, 1);

        fx.engine().cast(CastRequest::new(unit, stealth)).expect("cast");
        assert_eq!(fx.unit(unit).visibility, Visibility::Stealthed);
        assert_eq!(fx.unit(unit).stealth_level, 5);

        fx.engine().remove_auras_by_spell(unit, stealth, RemovalMode::Default);
        assert_eq!(fx.unit(unit).visibility, Visibility::Invisible);
        assert_eq!(fx.unit(unit).stealth_level, 0);

        fx.engine().remove_auras_by_spell(unit, invisibility, RemovalMode::Default);
        assert_eq!(fx.unit(unit).visibility, Visibility::Visible);
        assert_eq!(fx.unit(unit).invisibility_mask, 0);
    }
}
