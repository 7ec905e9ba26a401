//! Proc dispatch: damage shields, trigger-spell and trigger-damage auras,
//! then hooks.

use std::sync::Arc;

use crate::aura::AuraType;
use crate::engine::{DamageInfo, ProcEvent, SpellEngine, roll_ctx};
use crate::event::SpellEvent;
use crate::holder::RemovalMode;
use crate::spell::{ProcExtra, ProcFlags, SchoolMask};
use crate::types::{EffectIndex, HolderId, SpellId, UnitId};

struct ProcCandidate {
    holder: HolderId,
    spell: SpellId,
    chance: u32,
    auras: Vec<(EffectIndex, AuraType, i32, Option<SpellId>)>,
}

impl SpellEngine<'_> {
    /// Fires the proc flags of both parties of an exchange.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn proc_damage_and_spell(
        &mut self,
        attacker: Option<UnitId>,
        victim: UnitId,
        attacker_flags: ProcFlags,
        victim_flags: ProcFlags,
        extra: ProcExtra,
        amount: u32,
        spell: Option<SpellId>,
    ) {
        if let Some(attacker) = attacker
            && !attacker_flags.is_empty()
        {
            self.handle_proc(ProcEvent {
                unit: attacker,
                other: Some(victim),
                flags: attacker_flags,
                extra,
                amount,
                spell,
            });
        }
        if !victim_flags.is_empty() {
            self.handle_proc(ProcEvent {
                unit: victim,
                other: attacker,
                flags: victim_flags,
                extra,
                amount,
                spell,
            });
        }
    }

    fn handle_proc(&mut self, event: ProcEvent) {
        if self.trigger_depth >= self.config.max_trigger_depth {
            tracing::warn!(unit = %event.unit, depth = self.trigger_depth, "proc chain too deep, ignored");
            return;
        }
        if event.flags.contains(ProcFlags::TAKEN_MELEE_HIT) {
            self.damage_shields(&event);
        }
        let candidates: Vec<ProcCandidate> = self
            .world
            .holders_on(event.unit)
            .filter(|h| h.spell.proc_flags.intersects(event.flags) && Some(h.spell.id) != event.spell)
            .filter_map(|h| {
                let auras: Vec<_> = h
                    .iter_auras()
                    .filter(|aura| aura.is_listed())
                    .filter(|aura| {
                        matches!(aura.aura_type, AuraType::ProcTriggerSpell | AuraType::ProcTriggerDamage)
                    })
                    .map(|aura| {
                        let trigger = h.spell.effect(aura.effect_index).trigger_spell;
                        (aura.effect_index, aura.aura_type, aura.amount, trigger)
                    })
                    .collect();
                (!auras.is_empty()).then(|| ProcCandidate {
                    holder: h.id,
                    spell: h.spell.id,
                    chance: h.spell.proc_chance,
                    auras,
                })
            })
            .collect();

        self.trigger_depth += 1;
        for candidate in candidates {
            if !self.world.holder(candidate.holder).is_some_and(|h| h.is_live()) {
                continue;
            }
            if !self.roll_chance(event.unit, roll_ctx::PROC, candidate.chance) {
                continue;
            }
            for (index, aura_type, amount, trigger) in &candidate.auras {
                match aura_type {
                    AuraType::ProcTriggerSpell => {
                        let Some(trigger) = trigger else {
                            tracing::error!(spell = %candidate.spell, ?index, "proc aura without trigger spell");
                            continue;
                        };
                        let target = match self.spells.spell(*trigger) {
                            Some(def) if self.policy.is_positive_spell(&def) => event.unit,
                            _ => event.other.unwrap_or(event.unit),
                        };
                        self.cast_triggered(event.unit, *trigger, target);
                        self.emit(SpellEvent::ProcTriggered {
                            unit: event.unit,
                            spell: candidate.spell,
                            triggered: Some(*trigger),
                        });
                    }
                    AuraType::ProcTriggerDamage => {
                        let Some(other) = event.other else {
                            continue;
                        };
                        let school = self
                            .world
                            .holder(candidate.holder)
                            .map_or_else(Default::default, |h| h.spell.school_mask);
                        let mut info = DamageInfo::new(Some(event.unit), other, school, (*amount).max(0) as u32)
                            .with_spell(candidate.spell);
                        let spell = self.spells.spell(candidate.spell);
                        self.calc_absorb_resist(&mut info, spell.as_deref());
                        self.deal_damage(&info);
                        self.emit(SpellEvent::ProcTriggered {
                            unit: event.unit,
                            spell: candidate.spell,
                            triggered: None,
                        });
                    }
                    _ => {}
                }
            }
            self.consume_proc_charge(candidate.holder);
        }
        self.trigger_depth -= 1;

        let hooks = Arc::clone(&self.hooks);
        for hook in hooks.iter().filter(|h| h.should_trigger(&event)) {
            hook.apply(&mut *self.world, &event);
        }
    }

    /// Every damage shield of a unit struck in melee hits the striker back.
    fn damage_shields(&mut self, event: &ProcEvent) {
        let Some(attacker) = event.other else {
            return;
        };
        if attacker == event.unit {
            return;
        }
        let shields: Vec<(SpellId, SchoolMask, i32)> = self
            .world
            .listed_auras(event.unit)
            .filter(|(_, aura)| aura.aura_type == AuraType::DamageShield && aura.amount > 0)
            .map(|(holder, aura)| (holder.spell.id, holder.spell.school_mask, aura.amount))
            .collect();
        for (spell, school, amount) in shields {
            if !self.is_alive(attacker) {
                break;
            }
            let mut info = DamageInfo::new(Some(event.unit), attacker, school, amount as u32).with_spell(spell);
            let definition = self.spells.spell(spell);
            self.calc_absorb_resist(&mut info, definition.as_deref());
            self.deal_damage(&info);
        }
    }

    /// Spends one charge; the holder goes when the last one is used.
    fn consume_proc_charge(&mut self, id: HolderId) {
        let Some(holder) = self.world.holder_mut(id) else {
            return;
        };
        if holder.proc_charges == 0 || !holder.is_live() {
            return;
        }
        holder.proc_charges -= 1;
        if holder.proc_charges == 0 {
            self.remove_holder(id, RemovalMode::Default);
        } else {
            self.refresh_visible_slot(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::aura::AuraType;
    use crate::effect::SpellEffectKind;
    use crate::engine::CastRequest;
    use crate::spell::{ImplicitTarget, ProcExtra, ProcFlags, SchoolMask, SpellDefinition, SpellEffectEntry};
    use crate::test_utils::Fixture;
    use crate::types::{EffectIndex, SpellId};
    use crate::unit::UnitFlags;

    fn thorns(fx: &mut Fixture, chance: u32, charges: u32) -> SpellId {
        fx.spell(
            SpellDefinition::builder(20)
                .school(SchoolMask::NATURE)
                .proc(ProcFlags::TAKEN_SPELL_HIT, chance, charges)
                .effect(
                    EffectIndex::Effect0,
                    SpellEffectEntry {
                        aura: AuraType::ProcTriggerDamage,
                        base_points: 15,
                        target: ImplicitTarget::Caster,
                        ..SpellEffectEntry::new(SpellEffectKind::ApplyAura)
                    },
                )
                .build(),
        )
    }

    #[test]
    fn trigger_damage_hits_back_and_spends_charges() {
        let mut fx = Fixture::new();
        let spell = thorns(&mut fx, 100, 2);
        let owner = fx.player(1, 0);
        let enemy = fx.creature(2, 5);
        fx.engine().cast(CastRequest::new(owner, spell)).expect("cast");

        for _ in 0..2 {
            fx.engine().proc_damage_and_spell(
                Some(enemy),
                owner,
                ProcFlags::SUCCESSFUL_SPELL_HIT,
                ProcFlags::TAKEN_SPELL_HIT,
                ProcExtra::NORMAL_HIT,
                10,
                None,
            );
        }
        assert_eq!(fx.unit(enemy).health(), 1000 - 30);
        assert!(!fx.world.has_holder_of_spell(owner, spell));
        // Default combat hook ran for both parties.
        assert!(fx.unit(enemy).flags.contains(UnitFlags::IN_COMBAT));
    }

    #[test]
    fn zero_chance_never_procs() {
        let mut fx = Fixture::new();
        let spell = thorns(&mut fx, 0, 0);
        let owner = fx.player(1, 0);
        let enemy = fx.creature(2, 5);
        fx.engine().cast(CastRequest::new(owner, spell)).expect("cast");
        fx.engine().proc_damage_and_spell(
            Some(enemy),
            owner,
            ProcFlags::empty(),
            ProcFlags::TAKEN_SPELL_HIT,
            ProcExtra::NORMAL_HIT,
            10,
            None,
        );
        assert_eq!(fx.unit(enemy).health(), 1000);
        assert!(fx.world.has_holder_of_spell(owner, spell));
    }

    #[test]
    fn damage_shield_answers_melee_hits_only() {
        let mut fx = Fixture::new();
        let shield = fx.spell(
            SpellDefinition::builder(21)
                .school(SchoolMask::NATURE)
                .effect(
                    EffectIndex::Effect0,
                    SpellEffectEntry {
                        aura: AuraType::DamageShield,
                        base_points: 20,
                        target: ImplicitTarget::Caster,
                        ..SpellEffectEntry::new(SpellEffectKind::ApplyAura)
                    },
                )
                .build(),
        );
        let owner = fx.player(1, 0);
        let enemy = fx.creature(2, 5);
        fx.engine().cast(CastRequest::new(owner, shield)).expect("cast");

        fx.engine().proc_damage_and_spell(
            Some(enemy),
            owner,
            ProcFlags::empty(),
            ProcFlags::TAKEN_MELEE_HIT,
            ProcExtra::NORMAL_HIT,
            10,
            None,
        );
        assert_eq!(fx.unit(enemy).health(), 980);

        fx.engine().proc_damage_and_spell(
            Some(enemy),
            owner,
            ProcFlags::empty(),
            ProcFlags::TAKEN_SPELL_HIT,
            ProcExtra::NORMAL_HIT,
            10,
            None,
        );
        assert_eq!(fx.unit(enemy).health(), 980);
        assert!(fx.world.has_holder_of_spell(owner, shield));
    }
}
