//! Unit-level state changes the aura system reacts to: interrupts, form
//! changes, death, movement and despawn.

use crate::event::SpellEvent;
use crate::engine::{EngineError, SpellEngine};
use crate::holder::RemovalMode;
use crate::spell::{AuraInterruptFlags, PreventionType, ProcExtra, ProcFlags};
use crate::types::{HolderId, Position, SpellId, UnitId};
use crate::unit::{DeathState, PlayerFlags, ShapeshiftForm};

impl SpellEngine<'_> {
    /// Stops whatever `unit` is casting and drops the channel auras it feeds.
    pub(crate) fn interrupt_cast(&mut self, unit: UnitId) {
        let Some(cast) = self.with_unit(unit, |u| u.current_cast.take()).flatten() else {
            return;
        };
        tracing::debug!(%unit, spell = %cast.spell, "cast interrupted");
        self.emit(SpellEvent::Interrupted {
            unit,
            spell: cast.spell,
        });
        if cast.channeled {
            self.remove_channel_holders(unit, cast.spell);
        }
    }

    /// Interrupts the current cast only if `prevention` applies to it.
    pub(crate) fn interrupt_cast_prevented_by(&mut self, unit: UnitId, prevention: PreventionType) {
        let prevented = self
            .world
            .unit(unit)
            .and_then(|u| u.current_cast.as_ref())
            .is_some_and(|cast| cast.prevention == prevention);
        if prevented {
            self.interrupt_cast(unit);
        }
    }

    /// Ends `caster`'s channel of `spell`, if it is still running.
    pub(crate) fn interrupt_channel_of(&mut self, caster: UnitId, spell: SpellId) {
        let channeling = self
            .world
            .unit(caster)
            .and_then(|u| u.current_cast.as_ref())
            .is_some_and(|cast| cast.channeled && cast.spell == spell);
        if channeling {
            self.interrupt_cast(caster);
        }
    }

    fn remove_channel_holders(&mut self, caster: UnitId, spell: SpellId) {
        let ids: Vec<HolderId> = self
            .world
            .unit_ids()
            .into_iter()
            .flat_map(|unit| {
                self.world
                    .holders_on(unit)
                    .filter(|h| h.caster == caster && h.spell.id == spell && h.is_channeled())
                    .map(|h| h.id)
                    .collect::<Vec<_>>()
            })
            .collect();
        for id in ids {
            self.remove_holder(id, RemovalMode::Default);
        }
    }

    /// Switches `unit` into `form`.
    ///
    /// Passive stance auras that need another form are dropped, and the
    /// unit's known passive spells for the new form are cast again.
    pub(crate) fn set_form(&mut self, unit: UnitId, form: ShapeshiftForm) {
        let Some(known) = self.with_unit(unit, |u| {
            u.form = form;
            u.power_type = form.power_type().unwrap_or(u.base_power_type);
            u.known_spells.iter().copied().collect::<Vec<_>>()
        }) else {
            return;
        };
        let bit = form.stance_bit();
        let lost: Vec<HolderId> = self
            .world
            .holders_on(unit)
            .filter(|h| h.removed_on_shape_lost && h.spell.stances & bit == 0)
            .map(|h| h.id)
            .collect();
        for id in lost {
            self.remove_holder(id, RemovalMode::Default);
        }
        if bit == 0 {
            return;
        }
        for spell in known {
            let Some(def) = self.spells.spell(spell) else {
                continue;
            };
            if def.is_passive() && def.stances & bit != 0 && !self.world.has_holder_of_spell(unit, spell) {
                self.cast_triggered(unit, spell, unit);
            }
        }
    }

    /// Kills `unit`: procs, aura cleanup, threat reset.
    pub fn kill_unit(&mut self, unit: UnitId, killer: Option<UnitId>) {
        let Some(victim) = self.world.unit_mut(unit) else {
            return;
        };
        if victim.death_state != DeathState::Alive {
            return;
        }
        victim.set_health(0);
        victim.death_state = DeathState::JustDied;
        tracing::debug!(%unit, ?killer, "unit died");

        self.interrupt_cast(unit);
        self.proc_damage_and_spell(
            killer.filter(|k| *k != unit),
            unit,
            ProcFlags::KILL,
            ProcFlags::KILLED,
            ProcExtra::NORMAL_HIT,
            0,
            None,
        );
        let doomed: Vec<HolderId> = self
            .world
            .holders_on(unit)
            .filter(|h| !h.death_persistent)
            .map(|h| h.id)
            .collect();
        for id in doomed {
            self.remove_holder(id, RemovalMode::Death);
        }
        let single_targets = self.world.single_target_holders(unit);
        for id in single_targets {
            self.remove_holder(id, RemovalMode::Default);
        }
        self.with_unit(unit, |u| {
            u.threat.clear();
            u.diminishing.clear();
            u.combo_points = 0;
            u.combo_target = None;
        });
        for other in self.world.unit_ids() {
            self.with_unit(other, |u| u.threat.remove(unit));
        }
        self.emit(SpellEvent::UnitDied { unit, killer });
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Moves a unit, breaking auras that end on movement.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownUnit`] for an unregistered unit.
    pub fn move_unit(&mut self, unit: UnitId, position: Position) -> Result<(), EngineError> {
        let moved = self
            .with_unit(unit, |u| {
                let moved = u.position != position;
                u.position = position;
                moved
            })
            .ok_or(EngineError::UnknownUnit(unit))?;
        if moved {
            self.remove_auras_with_interrupt_flags(unit, AuraInterruptFlags::MOVE, None);
            let channel_breaks = self
                .world
                .unit(unit)
                .and_then(|u| u.current_cast.as_ref())
                .is_some_and(|c| c.interrupt_flags.contains(crate::spell::InterruptFlags::MOVEMENT));
            if channel_breaks {
                self.interrupt_cast(unit);
            }
        }
        self.finish_command();
        Ok(())
    }

    /// Removes a unit from the world with all its holders and ground effects.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownUnit`] for an unregistered unit.
    pub fn despawn_unit(&mut self, unit: UnitId) -> Result<(), EngineError> {
        if self.world.unit(unit).is_none() {
            return Err(EngineError::UnknownUnit(unit));
        }
        self.unsummon(unit);
        self.finish_command();
        Ok(())
    }

    /// Despawn without ending the command; summons and totems go this way.
    pub(crate) fn unsummon(&mut self, unit: UnitId) {
        self.interrupt_cast(unit);
        self.remove_all_auras(unit, RemovalMode::Delete);
        for id in self.world.single_target_holders(unit) {
            self.remove_holder(id, RemovalMode::Delete);
        }
        let objects: Vec<_> = self
            .world
            .dynamic_object_ids()
            .into_iter()
            .filter(|id| self.world.dynamic_object(*id).is_some_and(|o| o.caster == unit))
            .collect();
        for object in objects {
            self.world.remove_dynamic_object(object);
        }
        let owner = self.world.remove_unit(unit).and_then(|u| u.owner);
        if let Some(owner) = owner {
            self.with_unit(owner, |o| {
                if o.pet == Some(unit) {
                    o.pet = None;
                }
                for slot in o.totems.iter_mut().filter(|t| **t == Some(unit)) {
                    *slot = None;
                }
            });
        }
        tracing::debug!(%unit, "unit despawned");
    }

    /// Applies a resurrection request accepted by the player.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownUnit`] for an unregistered unit.
    pub fn accept_resurrect(&mut self, unit: UnitId) -> Result<bool, EngineError> {
        let request = self
            .with_unit(unit, |u| {
                if u.is_alive() {
                    None
                } else {
                    u.resurrect_request.take()
                }
            })
            .ok_or(EngineError::UnknownUnit(unit))?;
        let Some(request) = request else {
            return Ok(false);
        };
        self.revive(unit, request.health, request.mana);
        self.finish_command();
        Ok(true)
    }

    pub(crate) fn revive(&mut self, unit: UnitId, health: u32, mana: u32) {
        self.with_unit(unit, |u| {
            u.death_state = DeathState::Alive;
            u.set_health(health.max(1));
            u.set_power(crate::spell::PowerType::Mana, mana);
            u.resurrect_request = None;
            u.player_flags.remove(PlayerFlags::RESURRECT_PENDING);
        });
        let health = self.world.unit(unit).map_or(0, |u| u.health());
        self.emit(SpellEvent::Resurrected { unit, health });
    }
}

#[cfg(test)]
mod tests {
    use crate::aura::AuraType;
    use crate::engine::CastRequest;
    use crate::spell::{AuraInterruptFlags, SpellAttributes, SpellDefinition};
    use crate::test_utils::Fixture;
    use crate::types::{EffectIndex, Position};
    use crate::unit::{CurrentCast, DeathState, ShapeshiftForm};
    use crate::spell::{PowerType, SchoolMask};
    use crate::types::SpellId;

    #[test]
    fn death_keeps_only_death_persistent_holders() {
        let mut fx = Fixture::new();
        let buff = fx.spell(SpellDefinition::builder(1).aura(EffectIndex::Effect0, AuraType::ModResistance, 5, 0).build());
        let soul = fx.spell(
            SpellDefinition::builder(2)
                .attributes(SpellAttributes::DEATH_PERSISTENT)
                .aura(EffectIndex::Effect0, AuraType::Dummy, 0, 0)
                .build(),
        );
        let unit = fx.player(1, 0);
        for spell in [buff, soul] {
            fx.engine().cast(CastRequest::new(unit, spell).on(unit)).expect("cast");
        }
        fx.engine().kill_unit(unit, None);
        assert_eq!(fx.unit(unit).death_state, DeathState::JustDied);
        assert!(!fx.world.has_holder_of_spell(unit, buff));
        assert!(fx.world.has_holder_of_spell(unit, soul));
    }

    #[test]
    fn moving_breaks_move_interruptible_auras() {
        let mut fx = Fixture::new();
        let food = fx.spell(
            SpellDefinition::builder(3)
                .aura_interrupt_flags(AuraInterruptFlags::MOVE)
                .aura(EffectIndex::Effect0, AuraType::ModRegen, 10, 1000)
                .build(),
        );
        let unit = fx.player(1, 0);
        fx.engine().cast(CastRequest::new(unit, food).on(unit)).expect("cast");
        fx.engine().move_unit(unit, Position::new(0, 0)).expect("known unit");
        assert!(fx.world.has_holder_of_spell(unit, food));
        fx.engine().move_unit(unit, Position::new(3, 0)).expect("known unit");
        assert!(!fx.world.has_holder_of_spell(unit, food));
    }

    #[test]
    fn form_change_swaps_power_and_drops_stance_passives() {
        let mut fx = Fixture::new();
        let bear_passive = fx.spell(
            SpellDefinition::builder(4)
                .attributes(SpellAttributes::PASSIVE)
                .stances(ShapeshiftForm::Bear.stance_bit())
                .aura(EffectIndex::Effect0, AuraType::ModResistance, 100, 0)
                .build(),
        );
        let unit = fx.player(1, 0);
        fx.world.unit_mut(unit).expect("unit").known_spells.insert(bear_passive);

        fx.engine().set_form(unit, ShapeshiftForm::Bear);
        assert_eq!(fx.unit(unit).power_type, PowerType::Rage);
        assert!(fx.world.has_holder_of_spell(unit, bear_passive));

        fx.engine().set_form(unit, ShapeshiftForm::None);
        assert_eq!(fx.unit(unit).power_type, PowerType::Mana);
        assert!(!fx.world.has_holder_of_spell(unit, bear_passive));
    }

    #[test]
    fn interrupt_clears_channel_holders() {
        let mut fx = Fixture::new();
        let drain = fx.spell(
            SpellDefinition::builder(5)
                .attributes(SpellAttributes::CHANNELED)
                .aura(EffectIndex::Effect0, AuraType::PeriodicDamage, 10, 1000)
                .build(),
        );
        let caster = fx.player(1, 0);
        let target = fx.creature(2, 5);
        fx.engine().cast(CastRequest::new(caster, drain).on(target)).expect("cast");
        assert!(fx.unit(caster).current_cast.is_some());
        assert!(fx.world.has_holder_of_spell(target, drain));

        fx.engine().interrupt_cast(caster);
        assert!(fx.unit(caster).current_cast.is_none());
        assert!(!fx.world.has_holder_of_spell(target, drain));

        // A cast of another spell is left alone.
        fx.world.unit_mut(caster).expect("unit").current_cast =
            Some(CurrentCast::channel(SpellId(99), None, 1000, SchoolMask::FIRE));
        fx.engine().interrupt_channel_of(caster, drain);
        assert!(fx.unit(caster).current_cast.is_some());
    }
}
