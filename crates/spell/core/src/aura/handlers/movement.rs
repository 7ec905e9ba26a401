//! Speed and movement-flag handlers.

use crate::aura::{AuraCtx, AuraType};
use crate::engine::SpellEngine;
use crate::types::UnitId;
use crate::unit::{MoveType, MovementFlags, PlayerFlags, UnitFlags};

impl SpellEngine<'_> {
    pub(super) fn aura_mod_speed(&mut self, ctx: &AuraCtx) {
        self.update_speed(ctx.target);
    }

    /// Recomputes every speed channel from the listed speed auras.
    ///
    /// Increases of the same type add up, "not stack" types contribute their
    /// strongest aura only, and slows apply the strongest slow as a factor.
    pub(crate) fn update_speed(&mut self, unit: UnitId) {
        let world = &*self.world;
        let Some(mounted) = world.unit(unit).map(|u| u.flags.contains(UnitFlags::MOUNTED)) else {
            return;
        };
        let normal_only = world.has_aura_type(unit, AuraType::UseNormalMovementSpeed);
        let mut bonus = 0;
        if !normal_only {
            bonus += world.total_aura_modifier(unit, AuraType::ModIncreaseSpeed)
                + world.max_positive_aura_modifier(unit, AuraType::ModSpeedNotStack)
                + world.total_aura_modifier(unit, AuraType::ModSpeedAlways);
            if mounted {
                bonus += world.total_aura_modifier(unit, AuraType::ModIncreaseMountedSpeed)
                    + world.max_positive_aura_modifier(unit, AuraType::ModMountedSpeedNotStack)
                    + world.total_aura_modifier(unit, AuraType::ModMountedSpeedAlways);
            }
        }
        let swim_bonus = world.total_aura_modifier(unit, AuraType::ModIncreaseSwimSpeed);
        let slow = world.max_negative_aura_modifier(unit, AuraType::ModDecreaseSpeed);
        let slow_factor = ((100 + slow).max(0)) as f32 / 100.0;

        let run = ((100 + bonus).max(0)) as f32 / 100.0 * slow_factor;
        let swim = ((100 + swim_bonus).max(0)) as f32 / 100.0 * slow_factor;
        self.with_unit(unit, |u| {
            u.speed.set(MoveType::Run, run);
            u.speed.set(MoveType::Walk, run);
            u.speed.set(MoveType::RunBack, slow_factor);
            u.speed.set(MoveType::Swim, swim);
            u.speed.set(MoveType::SwimBack, slow_factor);
        });
    }

    fn toggle_movement(&mut self, ctx: &AuraCtx, apply: bool, types: &[AuraType], flag: MovementFlags) {
        if !apply && self.other_aura_of(ctx, types) {
            return;
        }
        self.with_unit(ctx.target, |unit| unit.movement.set(flag, apply));
    }

    pub(super) fn aura_water_walk(&mut self, ctx: &AuraCtx, apply: bool) {
        self.toggle_movement(ctx, apply, &[AuraType::WaterWalk], MovementFlags::WATER_WALK);
    }

    pub(super) fn aura_safe_fall(&mut self, ctx: &AuraCtx, apply: bool) {
        self.toggle_movement(
            ctx,
            apply,
            &[AuraType::FeatherFall, AuraType::SafeFall],
            MovementFlags::SAFE_FALL,
        );
    }

    pub(super) fn aura_hover(&mut self, ctx: &AuraCtx, apply: bool) {
        self.toggle_movement(ctx, apply, &[AuraType::Hover], MovementFlags::HOVER);
    }

    pub(super) fn aura_water_breathing(&mut self, ctx: &AuraCtx, apply: bool) {
        if !apply && self.other_aura_of(ctx, &[AuraType::WaterBreathing]) {
            return;
        }
        self.with_unit(ctx.target, |unit| {
            unit.player_flags.set(PlayerFlags::WATER_BREATHING, apply)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CastRequest;
    use crate::holder::RemovalMode;
    use crate::spell::SpellDefinition;
    use crate::test_utils::Fixture;
    use crate::types::{EffectIndex, SpellId};

    fn speed_aura(fx: &mut Fixture, id: u32, aura: AuraType, amount: i32) -> SpellId {
        fx.spell(
            SpellDefinition::builder(id)
                .aura(EffectIndex::Effect0, aura, amount, 0)
                .build(),
        )
    }

    fn run_speed(fx: &Fixture, unit: UnitId) -> f32 {
        fx.unit(unit).speed.get(MoveType::Run)
    }

    #[test]
    fn only_the_strongest_slow_applies() {
        let mut fx = Fixture::new();
        let sprint = speed_aura(&mut fx, 170, AuraType::ModIncreaseSpeed, 40);
        let chill = speed_aura(&mut fx, 171, AuraType::ModDecreaseSpeed, -30);
        let hamstring = speed_aura(&mut fx, 172, AuraType::ModDecreaseSpeed, -50);
        let caster = fx.player(1, 0);
        let target = fx.creature(2, 5);

        fx.engine().cast(CastRequest::new(target, sprint)).expect("cast");
        assert!((run_speed(&fx, target) - 1.4).abs() < 1e-4);
        for slow in [chill, hamstring] {
            fx.engine().cast(CastRequest::new(caster, slow).on(target)).expect("cast");
        }
        assert!((run_speed(&fx, target) - 0.7).abs() < 1e-4);

        fx.engine().remove_auras_by_spell(target, hamstring, RemovalMode::Default);
        assert!((run_speed(&fx, target) - 0.98).abs() < 1e-4);
    }

    #[test]
    fn water_walk_stays_while_another_grants_it() {
        let mut fx = Fixture::new();
        let first = speed_aura(&mut fx, 173, AuraType::WaterWalk, 0);
        let second = speed_aura(&mut fx, 174, AuraType::WaterWalk, 0);
        let unit = fx.player(1, 0);
        for spell in [first, second] {
            fx.engine().cast(CastRequest::new(unit, spell)).expect("cast");
        }
        fx.engine().remove_auras_by_spell(unit, first, RemovalMode::Default);
        assert!(fx.unit(unit).movement.contains(MovementFlags::WATER_WALK));
        fx.engine().remove_auras_by_spell(unit, second, RemovalMode::Default);
        assert!(!fx.unit(unit).movement.contains(MovementFlags::WATER_WALK));
    }
}
