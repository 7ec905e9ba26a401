//! Cloneable façade for issuing commands to the runtime.
//!
//! [`RuntimeHandle`] hides channel plumbing and offers async helpers for
//! casting, advancing the clock, querying state, and streaming events from
//! specific topics.
use tokio::sync::{broadcast, mpsc, oneshot};

use spell_core::{
    CastOutcome, CastRequest, HolderId, Position, RemovalMode, SpellId, Unit, UnitId,
};

use super::errors::{Result, RuntimeError};
use super::views::HolderView;
use crate::events::{Event, EventBus, Topic};
use crate::workers::Command;

/// Client-facing handle to interact with the runtime
#[derive(Clone)]
pub struct RuntimeHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl RuntimeHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            command_tx,
            event_bus,
        }
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(build(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Resolve a cast against the live world.
    pub async fn cast(&self, request: CastRequest) -> Result<CastOutcome> {
        self.request(|reply| Command::Cast { request, reply }).await?
    }

    /// Advance the world clock by `diff_ms` and return the new clock.
    ///
    /// Works alongside the scheduled ticker; runtimes built with a zero tick
    /// interval only move forward through this call.
    pub async fn advance(&self, diff_ms: u32) -> Result<u64> {
        self.request(|reply| Command::Advance { diff_ms, reply })
            .await
    }

    /// Remove one holder. Returns `false` when it was already gone.
    pub async fn remove_holder(&self, holder: HolderId, mode: RemovalMode) -> Result<bool> {
        self.request(|reply| Command::RemoveHolder {
            holder,
            mode,
            reply,
        })
        .await
    }

    /// Remove every holder of `spell` on `unit`; returns how many went.
    pub async fn remove_auras_by_spell(
        &self,
        unit: UnitId,
        spell: SpellId,
        mode: RemovalMode,
    ) -> Result<usize> {
        self.request(|reply| Command::RemoveAurasBySpell {
            unit,
            spell,
            mode,
            reply,
        })
        .await
    }

    pub async fn spawn_unit(&self, unit: Unit) -> Result<UnitId> {
        self.request(|reply| Command::SpawnUnit {
            unit: Box::new(unit),
            reply,
        })
        .await
    }

    pub async fn move_unit(&self, unit: UnitId, position: Position) -> Result<()> {
        self.request(|reply| Command::MoveUnit {
            unit,
            position,
            reply,
        })
        .await?
    }

    pub async fn kill_unit(&self, unit: UnitId, killer: Option<UnitId>) -> Result<()> {
        self.request(|reply| Command::KillUnit {
            unit,
            killer,
            reply,
        })
        .await?
    }

    /// Remove a unit from the world along with every holder it carries or casts.
    pub async fn despawn_unit(&self, unit: UnitId) -> Result<()> {
        self.request(|reply| Command::DespawnUnit { unit, reply })
            .await?
    }

    /// Query one unit (read-only copy)
    pub async fn query_unit(&self, unit: UnitId) -> Result<Option<Unit>> {
        self.request(|reply| Command::QueryUnit { unit, reply })
            .await
    }

    /// Live holders on `unit`, in application order
    pub async fn query_holders(&self, unit: UnitId) -> Result<Vec<HolderView>> {
        self.request(|reply| Command::QueryHolders { unit, reply })
            .await
    }

    /// Bincode snapshot of the whole world; restore with `World::from_bytes`.
    pub async fn snapshot(&self) -> Result<Vec<u8>> {
        self.request(|reply| Command::Snapshot { reply }).await?
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Aura` - Holder lifecycle, slot updates, dispels and procs
    /// - `Topic::Combat` - Damage, healing, power changes and deaths
    /// - `Topic::World` - Summons, items, movement and script hooks
    /// - `Topic::Tick` - Clock advances
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> std::collections::HashMap<Topic, broadcast::Receiver<Event>> {
        self.event_bus.subscribe_multiple(topics)
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}
