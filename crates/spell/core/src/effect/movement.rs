//! Teleports, leaps, charges and knockbacks.

use crate::effect::{EffectCtx, SpellEffectKind};
use crate::engine::SpellEngine;
use crate::event::SpellEvent;
use crate::spell::AuraInterruptFlags;
use crate::types::{Position, UnitId};

impl SpellEngine<'_> {
    /// Moves a unit as part of an effect: movement-interrupt auras break and
    /// observers see a teleport.
    pub(crate) fn relocate(&mut self, unit: UnitId, position: Position) {
        let moved = self
            .with_unit(unit, |u| {
                let moved = u.position != position;
                u.position = position;
                moved
            })
            .unwrap_or(false);
        if !moved {
            return;
        }
        self.remove_auras_with_interrupt_flags(unit, AuraInterruptFlags::MOVE, None);
        self.emit(SpellEvent::Teleported { unit, position });
    }

    fn position_of(&self, unit: UnitId) -> Option<Position> {
        self.world.unit(unit).map(|u| u.position)
    }

    pub(super) fn effect_teleport_units(&mut self, ctx: &mut EffectCtx) {
        let Some(destination) = ctx.destination else {
            tracing::debug!(spell = %ctx.spell_id(), "teleport without destination");
            return;
        };
        let unit = ctx.target_or_caster();
        self.relocate(unit, destination);
    }

    /// Puts the target `radius` yards from its position towards the caster.
    pub(super) fn effect_teleport_face_caster(&mut self, ctx: &mut EffectCtx) {
        let Some(target) = self.living_target(ctx) else {
            return;
        };
        let (Some(from), Some(to)) = (self.position_of(target), self.position_of(ctx.caster)) else {
            return;
        };
        let radius = self.effect_radius(&ctx.spell, ctx.index, ctx.caster) as i32;
        let distance = (from.distance(&to) as i32 - radius.max(1)).max(0);
        self.relocate(target, from.step_towards(&to, distance));
    }

    /// Blink: the caster jumps forward by the effect radius, towards the
    /// destination if one was given.
    pub(super) fn effect_leap(&mut self, ctx: &mut EffectCtx) {
        let Some(from) = self.position_of(ctx.caster) else {
            return;
        };
        let radius = self.effect_radius(&ctx.spell, ctx.index, ctx.caster) as i32;
        let to = match ctx.destination {
            Some(destination) => destination,
            None => Position::new(from.x + radius, from.y),
        };
        let distance = (from.distance(&to) as i32).min(radius.max(0));
        self.relocate(ctx.caster, from.step_towards(&to, distance));
    }

    /// Runs the caster up to the target and makes it the caster's victim.
    pub(super) fn effect_charge(&mut self, ctx: &mut EffectCtx) {
        let Some(target) = self.living_target(ctx) else {
            return;
        };
        let (Some(from), Some(to)) = (self.position_of(ctx.caster), self.position_of(target)) else {
            return;
        };
        let distance = (from.distance(&to) as i32 - 1).max(0);
        self.relocate(ctx.caster, from.step_towards(&to, distance));
        self.with_unit(ctx.caster, |u| u.victim = Some(target));
    }

    /// Pushes the target away from the caster by misc/10 yards.
    pub(super) fn effect_knock_back(&mut self, ctx: &mut EffectCtx) {
        let Some(target) = self.living_target(ctx) else {
            return;
        };
        let (Some(from), Some(origin)) = (self.position_of(target), self.position_of(ctx.caster)) else {
            return;
        };
        let yards = ctx.effect().misc_value / 10;
        if yards <= 0 {
            return;
        }
        let to = if from == origin {
            Position::new(from.x + yards, from.y)
        } else {
            // Stepping a negative distance towards the caster moves away from it.
            from.step_towards(&origin, -yards)
        };
        self.relocate(target, to);
    }

    /// Drags the target next to the caster. The player variant only moves players.
    pub(super) fn effect_pull(&mut self, ctx: &mut EffectCtx) {
        let Some(target) = self.living_target(ctx) else {
            return;
        };
        if ctx.kind() == SpellEffectKind::PlayerPull
            && !self.world.unit(target).is_some_and(|u| u.is_player())
        {
            return;
        }
        let (Some(from), Some(to)) = (self.position_of(target), self.position_of(ctx.caster)) else {
            return;
        };
        let distance = (from.distance(&to) as i32 - 1).max(0);
        self.relocate(target, from.step_towards(&to, distance));
    }

    /// Unstuck: back to the bind point.
    pub(super) fn effect_stuck(&mut self, ctx: &mut EffectCtx) {
        let Some(home) = self.world.unit(ctx.caster).and_then(|u| u.home) else {
            return;
        };
        self.relocate(ctx.caster, home);
    }

    pub(super) fn effect_bind(&mut self, ctx: &mut EffectCtx) {
        let unit = ctx.target_or_caster();
        self.with_unit(unit, |u| u.home = Some(u.position));
    }

    pub(super) fn effect_teleport_graveyard(&mut self, ctx: &mut EffectCtx) {
        let unit = ctx.target_or_caster();
        let Some(home) = self.world.unit(unit).map(|u| u.home.unwrap_or(Position::ORIGIN)) else {
            return;
        };
        self.relocate(unit, home);
    }

    /// Summons the target player to the caster's side.
    pub(super) fn effect_summon_player(&mut self, ctx: &mut EffectCtx) {
        let Some(target) = self.living_target(ctx) else {
            return;
        };
        if !self.world.unit(target).is_some_and(|u| u.is_player()) {
            return;
        }
        let Some(to) = self.position_of(ctx.caster) else {
            return;
        };
        self.relocate(target, to);
    }
}

#[cfg(test)]
mod tests {
    use crate::aura::AuraType;
    use crate::effect::SpellEffectKind;
    use crate::engine::CastRequest;
    use crate::event::SpellEvent;
    use crate::spell::{AuraInterruptFlags, ImplicitTarget, SpellDefinition, SpellEffectEntry};
    use crate::test_utils::Fixture;
    use crate::types::{EffectIndex, Position};

    #[test]
    fn teleport_breaks_movement_auras() {
        let mut fx = Fixture::new();
        let drink = fx.spell(
            SpellDefinition::builder(120)
                .aura_interrupt_flags(AuraInterruptFlags::MOVE)
                .aura(EffectIndex::Effect0, AuraType::ModRegen, 10, 0)
                .build(),
        );
        let port = fx.spell(
            SpellDefinition::builder(121)
                .effect(
                    EffectIndex::Effect0,
                    SpellEffectEntry {
                        target: ImplicitTarget::Caster,
                        ..SpellEffectEntry::new(SpellEffectKind::TeleportUnits)
                    },
                )
                .build(),
        );
        let mage = fx.player(1, 0);
        fx.engine().cast(CastRequest::new(mage, drink)).expect("cast");
        assert!(fx.world.has_holder_of_spell(mage, drink));
        fx.engine()
            .cast(CastRequest::new(mage, port).at(Position::new(100, 40)))
            .expect("cast");
        assert_eq!(fx.unit(mage).position, Position::new(100, 40));
        assert!(!fx.world.has_holder_of_spell(mage, drink));
        assert!(fx.world.events().contains(&SpellEvent::Teleported {
            unit: mage,
            position: Position::new(100, 40),
        }));
    }

    #[test]
    fn charge_closes_the_gap() {
        let mut fx = Fixture::new();
        let charge = fx.spell(
            SpellDefinition::builder(122)
                .effect(EffectIndex::Effect0, SpellEffectEntry::new(SpellEffectKind::Charge))
                .build(),
        );
        let warrior = fx.player(1, 0);
        let target = fx.creature(2, 20);
        fx.engine().cast(CastRequest::new(warrior, charge).on(target)).expect("cast");
        assert_eq!(fx.unit(warrior).position, Position::new(19, 0));
        assert_eq!(fx.unit(warrior).victim, Some(target));
    }

    #[test]
    fn knock_back_pushes_away_from_the_caster() {
        let mut fx = Fixture::new();
        let wave = fx.spell(
            SpellDefinition::builder(123)
                .effect(
                    EffectIndex::Effect0,
                    SpellEffectEntry {
                        misc_value: 100,
                        ..SpellEffectEntry::new(SpellEffectKind::KnockBack)
                    },
                )
                .build(),
        );
        let mage = fx.player(1, 0);
        let target = fx.creature(2, 5);
        fx.engine().cast(CastRequest::new(mage, wave).on(target)).expect("cast");
        assert_eq!(fx.unit(target).position, Position::new(15, 0));
    }

    #[test]
    fn bind_then_teleport_home() {
        let mut fx = Fixture::new();
        let bind = fx.spell(
            SpellDefinition::builder(124)
                .effect(
                    EffectIndex::Effect0,
                    SpellEffectEntry {
                        target: ImplicitTarget::Caster,
                        ..SpellEffectEntry::new(SpellEffectKind::Bind)
                    },
                )
                .build(),
        );
        let hearth = fx.spell(
            SpellDefinition::builder(125)
                .effect(
                    EffectIndex::Effect0,
                    SpellEffectEntry {
                        target: ImplicitTarget::Caster,
                        ..SpellEffectEntry::new(SpellEffectKind::Stuck)
                    },
                )
                .build(),
        );
        let player = fx.player(1, 30);
        fx.engine().cast(CastRequest::new(player, bind)).expect("cast");
        fx.engine().move_unit(player, Position::new(-50, 12)).expect("move");
        fx.engine().cast(CastRequest::new(player, hearth)).expect("cast");
        assert_eq!(fx.unit(player).position, Position::new(30, 0));
    }
}
