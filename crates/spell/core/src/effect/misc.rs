//! Character progress, combat resources, triggers and script hand-offs.

use crate::effect::{EffectCtx, SpellEffectKind};
use crate::engine::CastRequest;
use crate::engine::SpellEngine;
use crate::event::SpellEvent;
use crate::spell::PreventionType;
use crate::types::{SpellId, UnitId};
use crate::unit::PlayerFlags;

const MAX_COMBO_POINTS: u8 = 5;
const MAX_DRUNK: u8 = 100;
/// Skill cap gained per skill step.
const SKILL_PER_STEP: u32 = 75;

impl SpellEngine<'_> {
    fn player_target(&self, ctx: &EffectCtx) -> Option<UnitId> {
        let unit = ctx.target_or_caster();
        self.world.unit(unit).is_some_and(|u| u.is_player()).then_some(unit)
    }

    /// Adds a spell to the unit's spell book. Passive spells take effect
    /// right away.
    fn learn_spell(&mut self, unit: UnitId, spell: SpellId) {
        let learned = self.with_unit(unit, |u| u.known_spells.insert(spell)).unwrap_or(false);
        if !learned {
            return;
        }
        tracing::debug!(%unit, %spell, "spell learned");
        self.emit(SpellEvent::SpellLearned { unit, spell });
        if self.spells.spell(spell).is_some_and(|s| s.is_passive()) {
            self.cast_triggered(unit, spell, unit);
        }
    }

    pub(super) fn effect_learn_spell(&mut self, ctx: &mut EffectCtx) {
        let Some(spell) = ctx.effect().trigger_spell else {
            return;
        };
        let Some(unit) = self.player_target(ctx) else {
            return;
        };
        self.learn_spell(unit, spell);
    }

    pub(super) fn effect_learn_pet_spell(&mut self, ctx: &mut EffectCtx) {
        let Some(spell) = ctx.effect().trigger_spell else {
            return;
        };
        let Some(pet) = self.world.unit(ctx.target_or_caster()).and_then(|u| u.pet) else {
            return;
        };
        self.learn_spell(pet, spell);
    }

    /// Raises the misc skill's cap to `amount` steps, learning it at 1.
    pub(super) fn effect_skill_step(&mut self, ctx: &mut EffectCtx) {
        let Some(unit) = self.player_target(ctx) else {
            return;
        };
        let skill = ctx.effect().misc_value.max(0) as u32;
        let max = (ctx.amount.max(1) as u32).saturating_mul(SKILL_PER_STEP);
        self.with_unit(unit, |u| {
            let entry = u.skills.entry(skill).or_insert((0, 0));
            *entry = (entry.0.max(1).min(max), max);
        });
    }

    pub(super) fn effect_player_ability(&mut self, ctx: &mut EffectCtx) {
        let Some(unit) = self.player_target(ctx) else {
            return;
        };
        let flag = match ctx.kind() {
            SpellEffectKind::Parry => PlayerFlags::CAN_PARRY,
            SpellEffectKind::Block => PlayerFlags::CAN_BLOCK,
            _ => PlayerFlags::CAN_DUAL_WIELD,
        };
        self.with_unit(unit, |u| u.player_flags.insert(flag));
    }

    pub(super) fn effect_add_honor(&mut self, ctx: &mut EffectCtx) {
        let Some(unit) = self.player_target(ctx) else {
            return;
        };
        let honor = ctx.amount.max(0) as u32;
        self.with_unit(unit, |u| u.honor = u.honor.saturating_add(honor));
    }

    pub(super) fn effect_reputation(&mut self, ctx: &mut EffectCtx) {
        let Some(unit) = self.player_target(ctx) else {
            return;
        };
        let faction = ctx.effect().misc_value.max(0) as u32;
        let delta = ctx.amount;
        self.with_unit(unit, |u| {
            let standing = u.reputation.entry(faction).or_insert(0);
            *standing = standing.saturating_add(delta);
        });
    }

    pub(super) fn effect_quest_complete(&mut self, ctx: &mut EffectCtx) {
        let Some(unit) = self.player_target(ctx) else {
            return;
        };
        let quest = ctx.effect().misc_value.max(0) as u32;
        self.with_unit(unit, |u| u.completed_quests.insert(quest));
    }

    pub(super) fn effect_inebriate(&mut self, ctx: &mut EffectCtx) {
        let Some(unit) = self.player_target(ctx) else {
            return;
        };
        let amount = ctx.amount.clamp(0, i32::from(MAX_DRUNK)) as u8;
        self.with_unit(unit, |u| u.drunk = u.drunk.saturating_add(amount).min(MAX_DRUNK));
    }

    /// Combo points belong to one target; a new target starts from zero.
    pub(super) fn effect_add_combo_points(&mut self, ctx: &mut EffectCtx) {
        let Some(target) = ctx.target.filter(|t| *t != ctx.caster) else {
            return;
        };
        let amount = ctx.amount.clamp(0, i32::from(MAX_COMBO_POINTS)) as u8;
        self.with_unit(ctx.caster, |u| {
            if u.combo_target != Some(target) {
                u.combo_target = Some(target);
                u.combo_points = 0;
            }
            u.combo_points = u.combo_points.saturating_add(amount).min(MAX_COMBO_POINTS);
        });
    }

    pub(super) fn effect_add_extra_attacks(&mut self, ctx: &mut EffectCtx) {
        let Some(unit) = self.living_target(ctx) else {
            return;
        };
        let amount = ctx.amount.max(0) as u32;
        self.with_unit(unit, |u| u.extra_attacks = u.extra_attacks.saturating_add(amount));
    }

    /// Interrupts the target's cast. Silenceable casts also lock their
    /// schools for the spell's duration.
    pub(super) fn effect_interrupt_cast(&mut self, ctx: &mut EffectCtx) {
        let Some(target) = self.living_target(ctx) else {
            return;
        };
        let Some(cast) = self
            .world
            .unit(target)
            .and_then(|u| u.current_cast.clone())
            .filter(|c| c.is_interruptible())
        else {
            return;
        };
        if cast.prevention == PreventionType::Silence {
            let lockout = self.spell_duration(&ctx.spell, self.world.unit(ctx.caster)).max(0) as u32;
            self.with_unit(target, |u| {
                for school in cast.school.schools() {
                    let slot = &mut u.school_lockout_ms[school.index()];
                    *slot = (*slot).max(lockout);
                }
            });
            tracing::debug!(unit = %target, school = ?cast.school, lockout, "school locked");
        }
        self.interrupt_cast(target);
    }

    pub(super) fn effect_trigger_spell(&mut self, ctx: &mut EffectCtx) {
        let Some(trigger) = ctx.effect().trigger_spell else {
            tracing::debug!(spell = %ctx.spell_id(), "trigger effect without a spell");
            return;
        };
        self.cast_triggered(ctx.caster, trigger, ctx.target_or_caster());
    }

    /// Triggers a spell aimed at the cast's destination.
    pub(super) fn effect_trigger_missile(&mut self, ctx: &mut EffectCtx) {
        let Some(trigger) = ctx.effect().trigger_spell else {
            return;
        };
        let mut request = CastRequest::new(ctx.caster, trigger).triggered();
        request.target = ctx.target;
        request.destination = ctx.destination.or_else(|| {
            ctx.target
                .and_then(|t| self.world.unit(t))
                .map(|u| u.position)
        });
        self.cast_triggered_request(request);
    }

    /// Hands the misc event id to whatever scripts observe the world.
    pub(super) fn effect_script(&mut self, ctx: &mut EffectCtx) {
        self.emit(SpellEvent::ScriptEvent {
            caster: ctx.caster,
            event_id: ctx.effect().misc_value,
        });
    }

    pub(super) fn effect_dummy(&mut self, ctx: &mut EffectCtx) {
        self.emit(SpellEvent::Dummy {
            caster: ctx.caster,
            target: ctx.target,
            spell: ctx.spell_id(),
            apply: true,
        });
    }
}

#[cfg(test)]
mod tests {
    use crate::aura::AuraType;
    use crate::effect::SpellEffectKind;
    use crate::engine::CastRequest;
    use crate::event::SpellEvent;
    use crate::spell::{
        DurationEntry, ImplicitTarget, SchoolMask, SpellAttributes, SpellDefinition, SpellEffectEntry,
        SpellSchool,
    };
    use crate::test_utils::Fixture;
    use crate::types::{EffectIndex, SpellId};
    use crate::unit::CurrentCast;

    fn spell_with(fx: &mut Fixture, id: u32, entry: SpellEffectEntry) -> SpellId {
        fx.spell(SpellDefinition::builder(id).effect(EffectIndex::Effect0, entry).build())
    }

    #[test]
    fn learning_a_passive_spell_applies_it() {
        let mut fx = Fixture::new();
        let passive = fx.spell(
            SpellDefinition::builder(150)
                .attributes(SpellAttributes::PASSIVE)
                .aura(EffectIndex::Effect0, AuraType::ModRegen, 5, 0)
                .build(),
        );
        let teach = spell_with(
            &mut fx,
            151,
            SpellEffectEntry {
                trigger_spell: Some(passive),
                target: ImplicitTarget::Caster,
                ..SpellEffectEntry::new(SpellEffectKind::LearnSpell)
            },
        );
        let player = fx.player(1, 0);
        fx.engine().cast(CastRequest::new(player, teach)).expect("cast");
        assert!(fx.unit(player).known_spells.contains(&passive));
        assert!(fx.world.has_holder_of_spell(player, passive));
        assert!(fx.world.events().contains(&SpellEvent::SpellLearned {
            unit: player,
            spell: passive,
        }));
    }

    #[test]
    fn combo_points_reset_on_a_new_target() {
        let mut fx = Fixture::new();
        let strike = spell_with(
            &mut fx,
            152,
            SpellEffectEntry {
                base_points: 2,
                ..SpellEffectEntry::new(SpellEffectKind::AddComboPoints)
            },
        );
        let rogue = fx.player(1, 0);
        let first = fx.creature(2, 2);
        let second = fx.creature(3, 2);
        for _ in 0..4 {
            fx.engine().cast(CastRequest::new(rogue, strike).on(first)).expect("cast");
        }
        assert_eq!(fx.unit(rogue).combo_points, 5);
        fx.engine().cast(CastRequest::new(rogue, strike).on(second)).expect("cast");
        assert_eq!(fx.unit(rogue).combo_points, 2);
        assert_eq!(fx.unit(rogue).combo_target, Some(second));
    }

    #[test]
    fn interrupt_locks_the_cast_school() {
        let mut fx = Fixture::new();
        fx.catalog.insert_duration(5, DurationEntry::fixed(4000));
        let kick = fx.spell(
            SpellDefinition::builder(153)
                .duration_index(5)
                .effect(EffectIndex::Effect0, SpellEffectEntry::new(SpellEffectKind::InterruptCast))
                .build(),
        );
        let rogue = fx.player(1, 0);
        let mage = fx.creature(2, 2);
        fx.world.unit_mut(mage).expect("unit").current_cast = Some(CurrentCast::channel(
            SpellId(999),
            Some(rogue),
            5000,
            SchoolMask::FROST,
        ));
        fx.engine().cast(CastRequest::new(rogue, kick).on(mage)).expect("cast");
        let mage_unit = fx.unit(mage);
        assert!(mage_unit.current_cast.is_none());
        assert_eq!(mage_unit.school_lockout_ms[SpellSchool::Frost.index()], 4000);
        assert_eq!(mage_unit.school_lockout_ms[SpellSchool::Fire.index()], 0);
        assert!(fx.world.events().contains(&SpellEvent::Interrupted {
            unit: mage,
            spell: SpellId(999),
        }));
    }

    #[test]
    fn skill_step_raises_the_cap() {
        let mut fx = Fixture::new();
        let train = spell_with(
            &mut fx,
            154,
            SpellEffectEntry {
                base_points: 2,
                misc_value: 164,
                target: ImplicitTarget::Caster,
                ..SpellEffectEntry::new(SpellEffectKind::SkillStep)
            },
        );
        let smith = fx.player(1, 0);
        fx.engine().cast(CastRequest::new(smith, train)).expect("cast");
        assert_eq!(fx.unit(smith).skills.get(&164), Some(&(1, 150)));
    }

    #[test]
    fn inebriation_caps_at_one_hundred() {
        let mut fx = Fixture::new();
        let ale = spell_with(
            &mut fx,
            155,
            SpellEffectEntry {
                base_points: 40,
                target: ImplicitTarget::Caster,
                ..SpellEffectEntry::new(SpellEffectKind::Inebriate)
            },
        );
        let dwarf = fx.player(1, 0);
        for _ in 0..3 {
            fx.engine().cast(CastRequest::new(dwarf, ale)).expect("cast");
        }
        assert_eq!(fx.unit(dwarf).drunk, 100);
    }

    #[test]
    fn dummy_and_script_effects_surface_as_events() {
        let mut fx = Fixture::new();
        let spell = fx.spell(
            SpellDefinition::builder(156)
                .effect(EffectIndex::Effect0, SpellEffectEntry::new(SpellEffectKind::Dummy))
                .effect(
                    EffectIndex::Effect1,
                    SpellEffectEntry {
                        misc_value: 42,
                        ..SpellEffectEntry::new(SpellEffectKind::SendEvent)
                    },
                )
                .build(),
        );
        let caster = fx.player(1, 0);
        let target = fx.player(2, 1);
        fx.engine().cast(CastRequest::new(caster, spell).on(target)).expect("cast");
        let events = fx.world.events();
        assert!(events.contains(&SpellEvent::Dummy {
            caster,
            target: Some(target),
            spell,
            apply: true,
        }));
        assert!(events.contains(&SpellEvent::ScriptEvent { caster, event_id: 42 }));
    }
}
