//! Cast resolution: target selection, effect dispatch per target, pending
//! holder finalization and the procs of the exchange.

use std::sync::Arc;

use crate::effect::EffectCtx;
use crate::engine::{DamageInfo, EngineError, SpellEngine, roll_ctx};
use crate::event::SpellEvent;
use crate::holder::SpellAuraHolder;
use crate::spell::{
    AuraInterruptFlags, ImplicitTarget, PreventionType, ProcExtra, ProcFlags, SchoolMask,
    SpellAttributes, SpellDefinition,
};
use crate::types::{EffectIndex, HolderId, ItemId, Position, SpellId, UnitId};
use crate::unit::{
    CurrentCast, DiminishingGroup, DiminishingLevel, DiminishingScope, SpellModOp, Unit,
};

/// A request to cast one spell.
#[derive(Clone, Debug, PartialEq)]
pub struct CastRequest {
    pub caster: UnitId,
    pub spell: SpellId,
    /// Explicit unit target; effects targeting it fall back to the caster.
    pub target: Option<UnitId>,
    pub destination: Option<Position>,
    pub cast_item: Option<ItemId>,
    /// Triggered casts skip cast-interrupt handling and never start a channel.
    pub triggered: bool,
    /// Per-effect base point overrides; dice are not rolled for overridden slots.
    pub base_points: [Option<i32>; 3],
}

impl CastRequest {
    pub fn new(caster: UnitId, spell: SpellId) -> Self {
        Self {
            caster,
            spell,
            target: None,
            destination: None,
            cast_item: None,
            triggered: false,
            base_points: [None; 3],
        }
    }

    pub fn on(mut self, target: UnitId) -> Self {
        self.target = Some(target);
        self
    }

    pub fn at(mut self, destination: Position) -> Self {
        self.destination = Some(destination);
        self
    }

    pub fn with_item(mut self, item: ItemId) -> Self {
        self.cast_item = Some(item);
        self
    }

    pub fn triggered(mut self) -> Self {
        self.triggered = true;
        self
    }

    pub fn with_base_points(mut self, index: EffectIndex, value: i32) -> Self {
        self.base_points[index.as_usize()] = Some(value);
        self
    }
}

/// What a resolved cast did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CastOutcome {
    pub spell: SpellId,
    /// Units the spell's effects ran against, in resolution order.
    pub targets: Vec<UnitId>,
    /// Holders that now carry the cast's auras.
    pub holders: Vec<HolderId>,
    /// Targets that were immune to the whole spell.
    pub immune: Vec<UnitId>,
    /// Targets that resisted the whole spell.
    pub resisted: Vec<UnitId>,
}

/// Effect indices resolved against one target.
struct TargetEffects {
    unit: UnitId,
    indices: Vec<EffectIndex>,
}

impl SpellEngine<'_> {
    /// Casts `request.spell` instantly and runs every effect to completion.
    ///
    /// # Errors
    ///
    /// Unknown caster, target or spell, and base point overrides for empty
    /// effect slots.
    pub fn cast(&mut self, request: CastRequest) -> Result<CastOutcome, EngineError> {
        let spell = self
            .spells
            .spell(request.spell)
            .ok_or(EngineError::UnknownSpell(request.spell))?;
        self.cast_with_definition(&spell, request)
    }

    /// Casts with a definition the caller already holds. It must be the
    /// store's canonical instance.
    ///
    /// # Errors
    ///
    /// As [`Self::cast`], plus [`EngineError::NonCanonicalSpell`].
    pub fn cast_with_definition(
        &mut self,
        spell: &Arc<SpellDefinition>,
        request: CastRequest,
    ) -> Result<CastOutcome, EngineError> {
        self.check_canonical(spell)?;
        if self.world.unit(request.caster).is_none() {
            return Err(EngineError::UnknownUnit(request.caster));
        }
        if let Some(target) = request.target
            && self.world.unit(target).is_none()
        {
            return Err(EngineError::UnknownUnit(target));
        }
        for index in EffectIndex::ALL {
            if request.base_points[index.as_usize()].is_some() && spell.effect(index).is_empty() {
                return Err(EngineError::InvalidEffectIndex {
                    spell: spell.id,
                    index: index.as_usize(),
                });
            }
        }

        let outcome = self.execute_cast(spell, &request);
        self.finish_command();
        Ok(outcome)
    }

    /// Casts a spell on behalf of an aura, proc or effect. Unknown spells
    /// and chains nested too deep are logged and dropped.
    pub(crate) fn cast_triggered(&mut self, caster: UnitId, spell: SpellId, target: UnitId) {
        let mut request = CastRequest::new(caster, spell).on(target).triggered();
        request.destination = self.world.unit(target).map(|u| u.position);
        self.cast_triggered_request(request);
    }

    pub(crate) fn cast_triggered_request(&mut self, request: CastRequest) {
        if self.trigger_depth >= self.config.max_trigger_depth {
            let err = EngineError::TriggerDepthExceeded {
                spell: request.spell,
                depth: self.trigger_depth,
            };
            tracing::warn!(caster = %request.caster, error = %err, "triggered cast dropped");
            return;
        }
        let Some(spell) = self.lookup_spell(request.spell) else {
            return;
        };
        if self.world.unit(request.caster).is_none() {
            tracing::trace!(caster = %request.caster, spell = %spell.id, "triggering unit gone");
            return;
        }
        self.trigger_depth += 1;
        self.execute_cast(&spell, &request);
        self.trigger_depth -= 1;
    }

    fn execute_cast(&mut self, spell: &Arc<SpellDefinition>, request: &CastRequest) -> CastOutcome {
        let caster = request.caster;
        let mut outcome = CastOutcome {
            spell: spell.id,
            ..CastOutcome::default()
        };
        tracing::debug!(%caster, spell = %spell.id, target = ?request.target, triggered = request.triggered, "cast");

        if !request.triggered {
            self.remove_auras_with_interrupt_flags(caster, AuraInterruptFlags::CAST, Some(spell.id));
            if spell.is_channeled() {
                self.start_channel(spell, request);
            }
        }

        let (per_target, destination_only) = self.select_targets(spell, request);
        for entry in per_target {
            self.resolve_on_target(spell, request, entry, &mut outcome);
        }
        if !destination_only.is_empty() {
            let mut ctx = EffectCtx::new(caster, Arc::clone(spell), None, request);
            for index in destination_only {
                ctx.index = index;
                ctx.amount = self.calculate_amount(spell, index, caster, request.base_points[index.as_usize()]);
                self.dispatch_effect(&mut ctx);
            }
        }
        outcome
    }

    fn start_channel(&mut self, spell: &SpellDefinition, request: &CastRequest) {
        let duration = self.spell_duration(spell, self.world.unit(request.caster));
        let mut cast = CurrentCast::channel(spell.id, request.target, duration, spell.school_mask);
        cast.interrupt_flags |= spell.interrupt_flags;
        if spell.prevention_type != PreventionType::None {
            cast.prevention = spell.prevention_type;
        }
        self.with_unit(request.caster, |u| u.current_cast = Some(cast));
    }

    // ========================================================================
    // Targets
    // ========================================================================

    /// Groups effect indices by the unit they resolve against, in first-seen
    /// order, and returns destination-only effects separately.
    fn select_targets(
        &self,
        spell: &SpellDefinition,
        request: &CastRequest,
    ) -> (Vec<TargetEffects>, Vec<EffectIndex>) {
        let mut per_target: Vec<TargetEffects> = Vec::new();
        let mut destination_only = Vec::new();
        for index in spell.effect_indices() {
            let selector = spell.effect(index).target;
            if !selector.needs_unit() {
                destination_only.push(index);
                continue;
            }
            for unit in self.targets_for(spell, index, selector, request) {
                match per_target.iter_mut().find(|t| t.unit == unit) {
                    Some(entry) => entry.indices.push(index),
                    None => per_target.push(TargetEffects {
                        unit,
                        indices: vec![index],
                    }),
                }
            }
        }
        (per_target, destination_only)
    }

    fn targets_for(
        &self,
        spell: &SpellDefinition,
        index: EffectIndex,
        selector: ImplicitTarget,
        request: &CastRequest,
    ) -> Vec<UnitId> {
        let Some(caster) = self.world.unit(request.caster) else {
            return Vec::new();
        };
        let radius = self.effect_radius(spell, index, request.caster);
        match selector {
            ImplicitTarget::Target => vec![request.target.unwrap_or(caster.id)],
            ImplicitTarget::Caster => vec![caster.id],
            ImplicitTarget::Pet => caster.pet.into_iter().collect(),
            ImplicitTarget::CurrentEnemy => caster.victim.or(request.target).into_iter().collect(),
            ImplicitTarget::Destination => Vec::new(),
            ImplicitTarget::CasterParty => self.living_units_around(caster.position, radius, |u| {
                caster.is_in_party_with(u) && caster.is_friendly_to(u)
            }),
            ImplicitTarget::AlliesAroundCaster => {
                self.living_units_around(caster.position, radius, |u| caster.is_friendly_to(u))
            }
            ImplicitTarget::EnemiesAroundTarget => {
                let center = request
                    .destination
                    .or_else(|| request.target.and_then(|t| self.world.unit(t)).map(|t| t.position))
                    .unwrap_or(caster.position);
                self.living_units_around(center, radius, |u| caster.is_hostile_to(u))
            }
        }
    }

    fn living_units_around(&self, center: Position, radius: f32, keep: impl Fn(&Unit) -> bool) -> Vec<UnitId> {
        self.world
            .units_within(&center, radius)
            .into_iter()
            .filter(|id| self.world.unit(*id).is_some_and(|u| u.is_alive() && keep(u)))
            .collect()
    }

    /// Radius of effect `index` in yards after the caster's radius modifiers.
    pub(crate) fn effect_radius(&self, spell: &SpellDefinition, index: EffectIndex, caster: UnitId) -> f32 {
        let radius_index = spell.effect(index).radius_index;
        if radius_index == 0 {
            return 0.0;
        }
        let radius = self.spells.radius(radius_index).unwrap_or_else(|| {
            tracing::warn!(spell = %spell.id, radius_index, "unknown radius index");
            0.0
        });
        self.world
            .unit(caster)
            .map_or(radius, |c| c.spell_mods.apply_f32(spell, SpellModOp::Radius, radius))
    }

    // ========================================================================
    // Per-target resolution
    // ========================================================================

    fn resolve_on_target(
        &mut self,
        spell: &Arc<SpellDefinition>,
        request: &CastRequest,
        entry: TargetEffects,
        outcome: &mut CastOutcome,
    ) {
        let caster = request.caster;
        let target = entry.unit;
        let Some(unit) = self.world.unit(target) else {
            return;
        };
        let ignores_immunity = spell.attributes.contains(SpellAttributes::IGNORE_IMMUNITY);
        if !unit.is_alive() && !spell.can_target_dead() && !spell.is_death_persistent() {
            let needs_living = entry
                .indices
                .iter()
                .all(|index| !spell.effect(*index).kind.targets_dead());
            if needs_living {
                tracing::trace!(unit = %target, spell = %spell.id, "dead target skipped");
                return;
            }
        }
        if !ignores_immunity && self.policy.is_immune_to_spell(unit, spell) {
            self.emit(SpellEvent::ImmuneBlocked {
                caster,
                target,
                spell: spell.id,
            });
            outcome.immune.push(target);
            return;
        }
        if caster != target && !self.policy.is_positive_spell(spell) {
            let chance = self.spell_resist_chance(target, spell);
            if chance > 0 && self.roll_chance(target, roll_ctx::SPELL_RESIST, chance.min(100) as u32) {
                tracing::trace!(unit = %target, spell = %spell.id, chance, "spell resisted");
                self.emit(SpellEvent::Resisted {
                    caster,
                    target,
                    spell: spell.id,
                });
                outcome.resisted.push(target);
                return;
            }
        }
        outcome.targets.push(target);

        let mut ctx = EffectCtx::new(caster, Arc::clone(spell), Some(target), request);
        if spell.applies_auras() {
            let mut holder = self.create_holder(Arc::clone(spell), target, caster, request.cast_item);
            holder.triggered = request.triggered;
            ctx.pending = Some(holder);
        }
        for index in entry.indices {
            let immune = !ignores_immunity
                && self
                    .world
                    .unit(target)
                    .is_some_and(|u| self.policy.is_immune_to_effect(u, spell, index));
            if immune {
                tracing::trace!(unit = %target, spell = %spell.id, ?index, "immune to effect");
                continue;
            }
            ctx.index = index;
            ctx.amount = self.calculate_amount(spell, index, caster, request.base_points[index.as_usize()]);
            self.dispatch_effect(&mut ctx);
        }

        let positive = self.policy.is_positive_spell(spell);
        if ctx.damage > 0 {
            self.deal_accumulated_damage(spell, caster, target, ctx.damage);
        } else if !positive && caster != target {
            self.remove_auras_with_interrupt_flags(target, AuraInterruptFlags::HITBYSPELL, Some(spell.id));
        }
        if let Some(holder) = ctx.pending.take()
            && let Some(id) = self.finalize_holder(holder, request)
        {
            outcome.holders.push(id);
        }
        if caster != target {
            let (attacker_flags, victim_flags) = if positive {
                (ProcFlags::SUCCESSFUL_POSITIVE_SPELL, ProcFlags::TAKEN_POSITIVE_SPELL)
            } else {
                (
                    ProcFlags::SUCCESSFUL_SPELL_HIT | ProcFlags::SUCCESSFUL_NEGATIVE_SPELL_HIT,
                    ProcFlags::TAKEN_SPELL_HIT | ProcFlags::TAKEN_NEGATIVE_SPELL_HIT,
                )
            };
            self.proc_damage_and_spell(
                Some(caster),
                target,
                attacker_flags,
                victim_flags,
                ProcExtra::NORMAL_HIT,
                ctx.damage,
                Some(spell.id),
            );
        }
    }

    /// Mitigates and deals the damage every effect of one cast put on a target.
    fn deal_accumulated_damage(&mut self, spell: &SpellDefinition, caster: UnitId, target: UnitId, damage: u32) {
        let school = spell.school_mask;
        let immune = self
            .world
            .unit(target)
            .is_some_and(|u| self.policy.is_immune_to_damage(u, school));
        if immune && !spell.attributes.contains(SpellAttributes::IGNORE_IMMUNITY) {
            self.emit(SpellEvent::ImmuneBlocked {
                caster,
                target,
                spell: spell.id,
            });
            return;
        }
        let mut info = DamageInfo::new(Some(caster), target, school, damage).with_spell(spell.id);
        if school == SchoolMask::NORMAL {
            self.apply_armor(&mut info);
        }
        self.calc_absorb_resist(&mut info, Some(spell));
        self.deal_damage(&info);
    }

    /// Sets duration, diminishing returns and charges, then attaches the holder.
    fn finalize_holder(&mut self, mut holder: SpellAuraHolder, request: &CastRequest) -> Option<HolderId> {
        if holder.is_empty() {
            return None;
        }
        let spell = Arc::clone(&holder.spell);
        let mut duration = self.spell_duration(&spell, self.world.unit(holder.caster));

        let group = self.policy.diminishing_group(&spell, request.triggered);
        if group != DiminishingGroup::None && !holder.positive {
            let now = self.world.clock_ms();
            let reset = self.config.diminishing_reset_ms;
            let level = self.world.unit_mut(holder.target).and_then(|unit| {
                if group.scope() == DiminishingScope::PlayersOnly && !unit.is_player() {
                    return None;
                }
                Some(unit.diminishing.level(group, now, reset))
            });
            if let Some(level) = level {
                if level == DiminishingLevel::Immune {
                    tracing::debug!(unit = %holder.target, spell = %spell.id, %group, "diminished to immunity");
                    self.emit(SpellEvent::ImmuneBlocked {
                        caster: holder.caster,
                        target: holder.target,
                        spell: spell.id,
                    });
                    return None;
                }
                if duration > 0 {
                    duration = (duration as f32 * level.duration_factor()) as i32;
                }
                // Counted by `add_holder` once the holder actually attaches.
                holder.diminishing_group = group;
            }
        }
        holder.set_duration(duration);

        if holder.proc_charges > 0
            && let Some(caster) = self.world.unit(holder.caster)
        {
            let charges = caster
                .spell_mods
                .apply_i32(&spell, SpellModOp::Charges, holder.proc_charges as i32);
            holder.proc_charges = charges.max(0) as u32;
        }
        self.add_holder(holder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aura::AuraType;
    use crate::effect::SpellEffectKind;
    use crate::spell::{DurationEntry, Mechanic, SpellEffectEntry};
    use crate::test_utils::Fixture;
    use crate::unit::ImmunityKind;

    fn bolt(fx: &mut Fixture, damage: i32) -> SpellId {
        fx.spell(
            SpellDefinition::builder(30)
                .school(SchoolMask::FIRE)
                .effect(
                    EffectIndex::Effect0,
                    SpellEffectEntry {
                        base_points: damage,
                        ..SpellEffectEntry::new(SpellEffectKind::SchoolDamage)
                    },
                )
                .build(),
        )
    }

    #[test]
    fn unknown_ids_are_errors() {
        let mut fx = Fixture::new();
        let spell = bolt(&mut fx, 10);
        let caster = fx.player(1, 0);
        assert_eq!(
            fx.engine().cast(CastRequest::new(caster, SpellId(999))),
            Err(EngineError::UnknownSpell(SpellId(999)))
        );
        assert_eq!(
            fx.engine().cast(CastRequest::new(caster, spell).on(UnitId(42))),
            Err(EngineError::UnknownUnit(UnitId(42)))
        );
        assert_eq!(
            fx.engine()
                .cast(CastRequest::new(caster, spell).with_base_points(EffectIndex::Effect2, 5)),
            Err(EngineError::InvalidEffectIndex { spell, index: 2 })
        );
    }

    #[test]
    fn non_canonical_definition_is_rejected() {
        let mut fx = Fixture::new();
        let spell = bolt(&mut fx, 10);
        let caster = fx.player(1, 0);
        let copy = Arc::new(SpellDefinition::builder(spell.0).build());
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            fx.engine().cast_with_definition(&copy, CastRequest::new(caster, spell))
        }));
        // Debug builds assert; release builds report the error.
        if let Ok(result) = result {
            assert_eq!(result, Err(EngineError::NonCanonicalSpell(spell)));
        }
    }

    #[test]
    fn school_damage_hits_the_target() {
        let mut fx = Fixture::new();
        let spell = bolt(&mut fx, 120);
        let caster = fx.player(1, 0);
        let target = fx.creature(2, 10);
        let outcome = fx
            .engine()
            .cast(CastRequest::new(caster, spell).on(target))
            .expect("cast");
        assert_eq!(outcome.targets, vec![target]);
        assert!(outcome.holders.is_empty());
        assert_eq!(fx.unit(target).health(), 880);
        assert!(fx.unit(target).threat.threat(caster) > 0.0);
    }

    #[test]
    fn school_immunity_blocks_harmful_spells() {
        let mut fx = Fixture::new();
        let spell = bolt(&mut fx, 120);
        let caster = fx.player(1, 0);
        let target = fx.creature(2, 10);
        fx.world
            .unit_mut(target)
            .expect("unit")
            .immunities
            .apply(ImmunityKind::School, SchoolMask::FIRE.bits(), SpellId(1), true);
        let outcome = fx
            .engine()
            .cast(CastRequest::new(caster, spell).on(target))
            .expect("cast");
        assert_eq!(outcome.immune, vec![target]);
        assert_eq!(fx.unit(target).health(), 1000);
    }

    #[test]
    fn enemies_around_target_hits_only_hostiles_in_radius() {
        let mut fx = Fixture::new();
        fx.catalog.insert_radius(2, 8.0);
        let nova = fx.spell(
            SpellDefinition::builder(31)
                .school(SchoolMask::FROST)
                .effect(
                    EffectIndex::Effect0,
                    SpellEffectEntry {
                        base_points: 50,
                        radius_index: 2,
                        target: ImplicitTarget::EnemiesAroundTarget,
                        ..SpellEffectEntry::new(SpellEffectKind::SchoolDamage)
                    },
                )
                .build(),
        );
        let caster = fx.player(1, 0);
        let near = fx.creature(2, 5);
        let far = fx.creature(3, 20);
        let friend = fx.player(4, 3);
        let outcome = fx.engine().cast(CastRequest::new(caster, nova)).expect("cast");
        assert_eq!(outcome.targets, vec![near]);
        assert_eq!(fx.unit(near).health(), 950);
        assert_eq!(fx.unit(far).health(), 1000);
        assert_eq!(fx.unit(friend).health(), 1000);
    }

    #[test]
    fn stun_diminishes_on_repeated_casts() {
        let mut fx = Fixture::new();
        fx.catalog.insert_duration(5, DurationEntry::fixed(4000));
        let stun = fx.spell(
            SpellDefinition::builder(32)
                .mechanic(Mechanic::Stun)
                .duration_index(5)
                .aura(EffectIndex::Effect0, AuraType::ModStun, 0, 0)
                .build(),
        );
        let caster = fx.player(1, 0);
        let target = fx.creature(2, 5);

        let mut durations = Vec::new();
        for _ in 0..4 {
            let outcome = fx
                .engine()
                .cast(CastRequest::new(caster, stun).on(target))
                .expect("cast");
            durations.push(
                outcome
                    .holders
                    .first()
                    .and_then(|id| fx.world.holder(*id))
                    .map(|h| h.max_duration),
            );
            fx.engine().remove_auras_by_spell(target, stun, crate::holder::RemovalMode::Default);
        }
        assert_eq!(durations, vec![Some(4000), Some(2000), Some(1000), None]);
    }

    #[test]
    fn rejected_rank_leaves_diminishing_untouched() {
        let mut fx = Fixture::new();
        fx.catalog.insert_duration(5, DurationEntry::fixed(4000));
        let rank = |id: u32, prev: Option<u32>, rank: u32| {
            SpellDefinition::builder(id)
                .mechanic(Mechanic::Stun)
                .duration_index(5)
                .chain(35, prev, rank)
                .aura(EffectIndex::Effect0, AuraType::ModStun, 0, 0)
                .build()
        };
        let low = fx.spell(rank(35, None, 1));
        let high = fx.spell(rank(36, Some(35), 2));
        let caster = fx.player(1, 0);
        let target = fx.creature(2, 5);

        fx.engine().cast(CastRequest::new(caster, high).on(target)).expect("cast");
        let outcome = fx
            .engine()
            .cast(CastRequest::new(caster, low).on(target))
            .expect("cast");
        assert!(outcome.holders.is_empty());
        assert!(!fx.world.has_holder_of_spell(target, low));

        let entry = fx
            .unit(target)
            .diminishing
            .entry(DiminishingGroup::Stun)
            .copied()
            .expect("stun registered");
        assert_eq!(entry.hit_count, 1);
        assert_eq!(entry.stack, 1);
    }

    #[test]
    fn channeled_cast_tracks_the_channel() {
        let mut fx = Fixture::new();
        fx.catalog.insert_duration(3, DurationEntry::fixed(3000));
        let spell = fx.spell(
            SpellDefinition::builder(34)
                .attributes(SpellAttributes::CHANNELED)
                .duration_index(3)
                .aura(EffectIndex::Effect0, AuraType::PeriodicDamage, 10, 1000)
                .build(),
        );
        let caster = fx.player(1, 0);
        let target = fx.creature(2, 5);
        fx.engine().cast(CastRequest::new(caster, spell).on(target)).expect("cast");
        let cast = fx.unit(caster).current_cast.clone().expect("channel running");
        assert!(cast.channeled);
        assert_eq!(cast.remaining_ms, 3000);
        assert_eq!(cast.target, Some(target));
    }

    #[test]
    fn trigger_chain_stops_at_depth_limit() {
        let mut fx = Fixture::new();
        fx.config = fx.config.clone().with_max_trigger_depth(3);
        // Spell 40 triggers itself forever.
        let spell = fx.spell(
            SpellDefinition::builder(40)
                .effect(
                    EffectIndex::Effect0,
                    SpellEffectEntry {
                        trigger_spell: Some(SpellId(40)),
                        target: ImplicitTarget::Caster,
                        ..SpellEffectEntry::new(SpellEffectKind::TriggerSpell)
                    },
                )
                .effect(
                    EffectIndex::Effect1,
                    SpellEffectEntry {
                        misc_value: 7,
                        target: ImplicitTarget::Caster,
                        ..SpellEffectEntry::new(SpellEffectKind::ScriptEffect)
                    },
                )
                .build(),
        );
        let caster = fx.player(1, 0);
        fx.engine().cast(CastRequest::new(caster, spell)).expect("cast");
        let scripts = fx
            .world
            .events()
            .iter()
            .filter(|e| matches!(e, SpellEvent::ScriptEvent { .. }))
            .count();
        // The top-level cast plus three nested ones.
        assert_eq!(scripts, 4);
    }
}
