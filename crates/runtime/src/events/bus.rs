//! Topic-based event bus implementation.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use spell_core::SpellEvent;

use super::types::TickEvent;

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Holder lifecycle, visible slots, dispels and procs
    Aura,
    /// Damage, healing, power, deaths and interrupts
    Combat,
    /// Everything else the engine reports (summons, items, movement, scripts)
    World,
    /// Clock advances
    Tick,
}

impl Topic {
    pub const ALL: [Topic; 4] = [Topic::Aura, Topic::Combat, Topic::World, Topic::Tick];
}

/// Event wrapper that carries the typed payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Spell(SpellEvent),
    Tick(TickEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Spell(event) => match event {
                SpellEvent::HolderApplied { .. }
                | SpellEvent::HolderRemoved { .. }
                | SpellEvent::AuraSlotUpdate { .. }
                | SpellEvent::DispelResult { .. }
                | SpellEvent::ProcTriggered { .. }
                | SpellEvent::ImmuneBlocked { .. }
                | SpellEvent::Resisted { .. } => Topic::Aura,
                SpellEvent::PeriodicTick { .. }
                | SpellEvent::SpellDamage { .. }
                | SpellEvent::Heal { .. }
                | SpellEvent::PowerChange { .. }
                | SpellEvent::UnitDied { .. }
                | SpellEvent::Interrupted { .. }
                | SpellEvent::Resurrected { .. } => Topic::Combat,
                _ => Topic::World,
            },
            Event::Tick(_) => Topic::Tick,
        }
    }
}

struct Channels {
    aura: broadcast::Sender<Event>,
    combat: broadcast::Sender<Event>,
    world: broadcast::Sender<Event>,
    tick: broadcast::Sender<Event>,
}

impl Channels {
    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Aura => &self.aura,
            Topic::Combat => &self.combat,
            Topic::World => &self.world,
            Topic::Tick => &self.tick,
        }
    }
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about. Every topic channel exists from construction on,
/// so subscribing never fails.
#[derive(Clone)]
pub struct EventBus {
    channels: Arc<Channels>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            channels: Arc::new(Channels {
                aura: broadcast::channel(capacity).0,
                combat: broadcast::channel(capacity).0,
                world: broadcast::channel(capacity).0,
                tick: broadcast::channel(capacity).0,
            }),
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.channels.sender(topic).send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.channels.sender(topic).subscribe()
    }

    /// Subscribe to multiple topics
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> std::collections::HashMap<Topic, broadcast::Receiver<Event>> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spell_core::{HolderId, SpellId, UnitId};

    #[test]
    fn holder_events_route_to_the_aura_topic() {
        let bus = EventBus::new();
        let mut aura = bus.subscribe(Topic::Aura);
        let mut combat = bus.subscribe(Topic::Combat);

        bus.publish(Event::Spell(SpellEvent::HolderApplied {
            unit: UnitId(2),
            holder: HolderId(1),
            spell: SpellId(589),
            caster: UnitId(1),
        }));

        assert!(matches!(
            aura.try_recv(),
            Ok(Event::Spell(SpellEvent::HolderApplied { .. }))
        ));
        assert!(combat.try_recv().is_err());
    }

    #[test]
    fn publishing_without_subscribers_is_silent() {
        let bus = EventBus::with_capacity(0);
        bus.publish(Event::Tick(TickEvent {
            clock_ms: 100,
            elapsed_ms: 100,
        }));
    }
}
