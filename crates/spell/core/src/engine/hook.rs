//! Reactions registered on proc events.
//!
//! Built-in proc handling (trigger-spell and trigger-damage auras) runs
//! first; afterwards every [`ProcHook`] whose `should_trigger` accepts the
//! event gets to mutate the world directly.

use std::sync::Arc;

use crate::spell::{ProcExtra, ProcFlags};
use crate::types::{SpellId, UnitId};
use crate::unit::UnitFlags;
use crate::world::World;

/// One side of a damage, heal or periodic exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProcEvent {
    /// Unit whose proc flags fired.
    pub unit: UnitId,
    /// Other party of the exchange, if any.
    pub other: Option<UnitId>,
    pub flags: ProcFlags,
    pub extra: ProcExtra,
    pub amount: u32,
    pub spell: Option<SpellId>,
}

/// A hook applied after the built-in proc handling of an event.
///
/// Hooks are executed in priority order (lower priority values execute first).
pub trait ProcHook: Send + Sync {
    /// Returns the priority of this hook. Lower values execute first.
    /// Default priority is 0.
    fn priority(&self) -> i32 {
        0
    }

    fn should_trigger(&self, event: &ProcEvent) -> bool;

    fn apply(&self, world: &mut World, event: &ProcEvent);
}

/// Puts both parties of a harmful exchange into combat.
#[derive(Debug)]
pub struct CombatFlagHook;

impl CombatFlagHook {
    const HARMFUL: ProcFlags = ProcFlags::TAKEN_MELEE_HIT
        .union(ProcFlags::TAKEN_SPELL_HIT)
        .union(ProcFlags::TAKEN_NEGATIVE_SPELL_HIT)
        .union(ProcFlags::ON_TAKE_PERIODIC);
}

impl ProcHook for CombatFlagHook {
    fn priority(&self) -> i32 {
        // Other hooks may check the combat flag.
        -10
    }

    fn should_trigger(&self, event: &ProcEvent) -> bool {
        event.other.is_some() && event.flags.intersects(Self::HARMFUL)
    }

    fn apply(&self, world: &mut World, event: &ProcEvent) {
        let Some(other) = event.other else {
            return;
        };
        for id in [event.unit, other] {
            if let Some(unit) = world.unit_mut(id)
                && unit.is_alive()
            {
                unit.flags.insert(UnitFlags::IN_COMBAT);
            }
        }
    }
}

/// Returns the default set of proc hooks, sorted by priority.
pub fn default_hooks() -> Arc<[Arc<dyn ProcHook>]> {
    let mut hooks: Vec<Arc<dyn ProcHook>> = vec![Arc::new(CombatFlagHook)];

    hooks.sort_by_key(|h| h.priority());

    hooks.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::{Faction, Unit, UnitKind};

    #[test]
    fn combat_hook_flags_both_parties() {
        let mut world = World::new(0);
        world.add_unit(Unit::new(UnitId(1), UnitKind::Player, 1, Faction::Alliance).with_health(10));
        world.add_unit(Unit::new(UnitId(2), UnitKind::Creature, 1, Faction::Hostile).with_health(10));
        let event = ProcEvent {
            unit: UnitId(2),
            other: Some(UnitId(1)),
            flags: ProcFlags::TAKEN_SPELL_HIT,
            extra: ProcExtra::NORMAL_HIT,
            amount: 5,
            spell: None,
        };
        let hooks = default_hooks();
        for hook in hooks.iter().filter(|h| h.should_trigger(&event)) {
            hook.apply(&mut world, &event);
        }
        assert!(world.unit(UnitId(1)).is_some_and(Unit::is_in_combat));
        assert!(world.unit(UnitId(2)).is_some_and(Unit::is_in_combat));
    }
}
