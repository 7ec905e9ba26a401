//! Observable outcomes of engine operations.
//!
//! The engine never talks to observers directly. Every notification is
//! buffered on the [`crate::World`] as a [`SpellEvent`]; the caller drains the
//! buffer after each command or tick and forwards it to a
//! [`NotificationSink`].

use crate::holder::RemovalMode;
use crate::effect::SpellEffectKind;
use crate::spell::SchoolMask;
use crate::types::{DynObjectId, HolderId, ItemId, Position, SpellId, UnitId};
use crate::unit::InventoryResult;

/// Something observers may want to know about.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpellEvent {
    HolderApplied {
        unit: UnitId,
        holder: HolderId,
        spell: SpellId,
        caster: UnitId,
    },
    HolderRemoved {
        unit: UnitId,
        holder: HolderId,
        spell: SpellId,
        mode: RemovalMode,
    },
    /// Visible slot content changed. `spell == None` clears the slot.
    AuraSlotUpdate {
        unit: UnitId,
        slot: u8,
        spell: Option<SpellId>,
        duration: i32,
        stack_count: u32,
    },
    PeriodicTick {
        target: UnitId,
        caster: UnitId,
        spell: SpellId,
        amount: i32,
        absorbed: u32,
        resisted: u32,
    },
    SpellDamage {
        caster: Option<UnitId>,
        target: UnitId,
        spell: Option<SpellId>,
        school: SchoolMask,
        amount: u32,
        absorbed: u32,
        resisted: u32,
    },
    Heal {
        caster: Option<UnitId>,
        target: UnitId,
        spell: SpellId,
        amount: u32,
    },
    PowerChange {
        unit: UnitId,
        spell: SpellId,
        power: crate::spell::PowerType,
        delta: i32,
    },
    DispelResult {
        caster: UnitId,
        target: UnitId,
        removed: Vec<SpellId>,
        failed: Vec<SpellId>,
    },
    UnitDied {
        unit: UnitId,
        killer: Option<UnitId>,
    },
    InventoryFailure {
        unit: UnitId,
        item: ItemId,
        result: InventoryResult,
    },
    ItemCreated {
        unit: UnitId,
        item: ItemId,
        count: u32,
    },
    Interrupted {
        unit: UnitId,
        spell: SpellId,
    },
    Summoned {
        summoner: UnitId,
        unit: UnitId,
        spell: SpellId,
    },
    DynamicObjectSpawned {
        object: DynObjectId,
        caster: UnitId,
        spell: SpellId,
        position: Position,
    },
    Teleported {
        unit: UnitId,
        position: Position,
    },
    ProcTriggered {
        unit: UnitId,
        spell: SpellId,
        triggered: Option<SpellId>,
    },
    ImmuneBlocked {
        caster: UnitId,
        target: UnitId,
        spell: SpellId,
    },
    /// A harmful spell was shrugged off by mechanic or debuff resistance.
    Resisted {
        caster: UnitId,
        target: UnitId,
        spell: SpellId,
    },
    Resurrected {
        unit: UnitId,
        health: u32,
    },
    /// Script hook point: dummy effects and dummy auras.
    Dummy {
        caster: UnitId,
        target: Option<UnitId>,
        spell: SpellId,
        apply: bool,
    },
    ScriptEvent {
        caster: UnitId,
        event_id: i32,
    },
    SpellLearned {
        unit: UnitId,
        spell: SpellId,
    },
    /// An effect whose only observable outcome is that it happened.
    EffectRecorded {
        caster: UnitId,
        target: Option<UnitId>,
        spell: SpellId,
        effect: SpellEffectKind,
    },
}

/// Receiver of drained events.
pub trait NotificationSink {
    fn notify(&mut self, event: &SpellEvent);
}

/// Sink that keeps every event; used by tests and replays.
#[derive(Clone, Debug, Default)]
pub struct VecSink {
    pub events: Vec<SpellEvent>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot updates for `unit`, in arrival order.
    pub fn slot_updates(&self, unit: UnitId) -> impl Iterator<Item = &SpellEvent> + '_ {
        self.events.iter().filter(move |e| {
            matches!(e, SpellEvent::AuraSlotUpdate { unit: u, .. } if *u == unit)
        })
    }

    pub fn periodic_ticks(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, SpellEvent::PeriodicTick { .. }))
            .count()
    }
}

impl NotificationSink for VecSink {
    fn notify(&mut self, event: &SpellEvent) {
        self.events.push(event.clone());
    }
}
