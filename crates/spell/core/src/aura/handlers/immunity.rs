//! Immunity handlers.
//!
//! Each aura registers one immunity entry tagged with its spell. Gaining
//! dispel, school or mechanic immunity also strips the target's other
//! holders that the new immunity covers.

use crate::aura::{AuraCtx, AuraType};
use crate::engine::SpellEngine;
use crate::holder::RemovalMode;
use crate::holder::SpellAuraHolder;
use crate::spell::{DispelType, Mechanic, SchoolMask, SpellAttributes};
use crate::unit::ImmunityKind;

impl SpellEngine<'_> {
    fn register_immunity(&mut self, ctx: &AuraCtx, kind: ImmunityKind, value: u32, apply: bool) {
        let spell = ctx.spell_id();
        self.with_unit(ctx.target, |unit| unit.immunities.apply(kind, value, spell, apply));
    }

    /// Removes the target's other holders matching `covered`.
    fn strip_covered(&mut self, ctx: &AuraCtx, covered: impl Fn(&SpellAuraHolder) -> bool) {
        let ids: Vec<_> = self
            .world
            .holders_on(ctx.target)
            .filter(|h| h.id != ctx.holder && !h.passive && covered(h))
            .map(|h| h.id)
            .collect();
        for id in ids {
            self.remove_holder(id, RemovalMode::Default);
        }
    }

    pub(super) fn aura_effect_immunity(&mut self, ctx: &AuraCtx, apply: bool) {
        let Ok(kind) = u32::try_from(ctx.misc_value) else {
            return;
        };
        self.register_immunity(ctx, ImmunityKind::Effect, kind, apply);
    }

    pub(super) fn aura_state_immunity(&mut self, ctx: &AuraCtx, apply: bool, real: bool) {
        let Some(ty) = u32::try_from(ctx.misc_value).ok().and_then(AuraType::from_raw) else {
            return;
        };
        self.register_immunity(ctx, ImmunityKind::State, u32::from(ty.raw()), apply);
        if apply && real {
            self.strip_covered(ctx, |h| h.iter_auras().any(|aura| aura.aura_type == ty));
        }
    }

    pub(super) fn aura_school_immunity(&mut self, ctx: &AuraCtx, apply: bool, real: bool) {
        let mask = SchoolMask::from_misc(ctx.misc_value);
        self.register_immunity(ctx, ImmunityKind::School, mask.bits(), apply);
        if apply && real {
            self.strip_covered(ctx, |h| {
                !h.positive
                    && h.spell.school_mask.intersects(mask)
                    && !h
                        .spell
                        .attributes
                        .contains(SpellAttributes::UNAFFECTED_BY_INVULNERABILITY)
            });
        }
    }

    pub(super) fn aura_damage_immunity(&mut self, ctx: &AuraCtx, apply: bool) {
        let mask = SchoolMask::from_misc(ctx.misc_value);
        self.register_immunity(ctx, ImmunityKind::Damage, mask.bits(), apply);
    }

    pub(super) fn aura_dispel_immunity(&mut self, ctx: &AuraCtx, apply: bool, real: bool) {
        let dispel = DispelType::from_misc(ctx.misc_value);
        if dispel == DispelType::None {
            return;
        }
        self.register_immunity(ctx, ImmunityKind::Dispel, dispel as u32, apply);
        if apply && real {
            self.strip_covered(ctx, |h| h.spell.dispel == dispel);
        }
    }

    /// Single-mechanic immunity takes the mechanic id; the mask variant a bit mask.
    pub(super) fn aura_mechanic_immunity(&mut self, ctx: &AuraCtx, apply: bool, real: bool) {
        let mask = if ctx.aura_type == AuraType::MechanicImmunityMask {
            ctx.misc_value as u32
        } else {
            Mechanic::from_misc(ctx.misc_value).mask_bit()
        };
        if mask == 0 {
            return;
        }
        self.register_immunity(ctx, ImmunityKind::Mechanic, mask, apply);
        if apply && real {
            self.strip_covered(ctx, |h| h.spell.all_mechanics_mask() & mask != 0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::SpellEffectKind;
    use crate::engine::CastRequest;
    use crate::spell::{SpellDefinition, SpellEffectEntry};
    use crate::test_utils::Fixture;
    use crate::types::{EffectIndex, SpellId};

    fn ward(fx: &mut Fixture, id: u32, aura: AuraType, misc_value: i32) -> SpellId {
        fx.spell(
            SpellDefinition::builder(id)
                .effect(
                    EffectIndex::Effect0,
                    SpellEffectEntry {
                        aura,
                        misc_value,
                        ..SpellEffectEntry::new(SpellEffectKind::ApplyAura)
                    },
                )
                .build(),
        )
    }

    #[test]
    fn school_immunity_strips_and_blocks_harmful_spells() {
        let mut fx = Fixture::new();
        let burn = fx.spell(
            SpellDefinition::builder(150)
                .school(SchoolMask::FIRE)
                .aura(EffectIndex::Effect0, AuraType::PeriodicDamage, 10, 1000)
                .build(),
        );
        let shield = ward(&mut fx, 151, AuraType::SchoolImmunity, SchoolMask::FIRE.bits() as i32);
        let caster = fx.player(1, 0);
        let target = fx.creature(2, 5);

        fx.engine().cast(CastRequest::new(caster, burn).on(target)).expect("cast");
        fx.engine().cast(CastRequest::new(target, shield)).expect("cast");
        assert!(!fx.world.has_holder_of_spell(target, burn));

        let outcome = fx
            .engine()
            .cast(CastRequest::new(caster, burn).on(target))
            .expect("cast");
        assert_eq!(outcome.immune, vec![target]);

        fx.engine().remove_auras_by_spell(target, shield, RemovalMode::Default);
        assert!(!fx.unit(target).immunities.has(ImmunityKind::School, SchoolMask::FIRE.bits()));
    }

    #[test]
    fn mechanic_immunity_clears_matching_control() {
        let mut fx = Fixture::new();
        let stun = fx.spell(
            SpellDefinition::builder(152)
                .mechanic(Mechanic::Stun)
                .aura(EffectIndex::Effect0, AuraType::ModStun, 0, 0)
                .build(),
        );
        let freedom = ward(&mut fx, 153, AuraType::MechanicImmunity, Mechanic::Stun as i32);
        let caster = fx.player(1, 0);
        let target = fx.creature(2, 5);

        fx.engine().cast(CastRequest::new(caster, stun).on(target)).expect("cast");
        fx.engine().cast(CastRequest::new(target, freedom)).expect("cast");
        assert!(!fx.world.has_holder_of_spell(target, stun));
        assert!(fx.unit(target).immunities.has(ImmunityKind::Mechanic, Mechanic::Stun.mask_bit()));
    }
}
