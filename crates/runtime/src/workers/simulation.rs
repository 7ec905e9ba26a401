//! Simulation worker that owns the authoritative [`spell_core::World`].
//!
//! Receives commands from [`crate::RuntimeHandle`], runs them through a
//! [`SpellEngine`], advances the clock on a fixed interval and publishes the
//! drained engine events to the EventBus.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use spell_core::{
    AuraConfig, CastOutcome, CastRequest, DefaultPolicy, HolderId, PcgRng, Position, RemovalMode,
    SpellCatalog, SpellEngine, SpellEnv, SpellId, Unit, UnitId, World,
};

use crate::api::{HolderView, Result, RuntimeError};
use crate::events::{Event, EventBus, TickEvent};
use crate::repository::JsonEventLog;

/// Commands that can be sent to the simulation worker
pub enum Command {
    Cast {
        request: CastRequest,
        reply: oneshot::Sender<Result<CastOutcome>>,
    },
    /// Advance the world clock by `diff_ms`; replies with the new clock.
    Advance {
        diff_ms: u32,
        reply: oneshot::Sender<u64>,
    },
    RemoveHolder {
        holder: HolderId,
        mode: RemovalMode,
        reply: oneshot::Sender<bool>,
    },
    RemoveAurasBySpell {
        unit: UnitId,
        spell: SpellId,
        mode: RemovalMode,
        reply: oneshot::Sender<usize>,
    },
    SpawnUnit {
        unit: Box<Unit>,
        reply: oneshot::Sender<UnitId>,
    },
    MoveUnit {
        unit: UnitId,
        position: Position,
        reply: oneshot::Sender<Result<()>>,
    },
    KillUnit {
        unit: UnitId,
        killer: Option<UnitId>,
        reply: oneshot::Sender<Result<()>>,
    },
    DespawnUnit {
        unit: UnitId,
        reply: oneshot::Sender<Result<()>>,
    },
    QueryUnit {
        unit: UnitId,
        reply: oneshot::Sender<Option<Unit>>,
    },
    QueryHolders {
        unit: UnitId,
        reply: oneshot::Sender<Vec<HolderView>>,
    },
    Snapshot {
        reply: oneshot::Sender<Result<Vec<u8>>>,
    },
}

/// Static data and rule tables the engine reads on every command.
pub struct Oracles {
    pub catalog: Arc<SpellCatalog>,
    pub config: AuraConfig,
    pub policy: DefaultPolicy,
    pub rng: PcgRng,
}

impl Oracles {
    pub fn new(catalog: Arc<SpellCatalog>, config: AuraConfig) -> Self {
        Self {
            catalog,
            config,
            policy: DefaultPolicy,
            rng: PcgRng,
        }
    }

    fn engine<'a>(&'a self, world: &'a mut World) -> Result<SpellEngine<'a>> {
        let catalog = self.catalog.as_ref();
        let env = SpellEnv::with_all(catalog, catalog, &self.policy, &self.config, &self.rng);
        Ok(SpellEngine::new(world, env)?)
    }
}

/// Background task that processes spell commands.
pub struct SimulationWorker {
    world: World,
    oracles: Oracles,
    command_rx: mpsc::Receiver<Command>,
    event_bus: EventBus,
    event_log: Option<JsonEventLog>,
    /// Scheduled advance period; 0 leaves the clock to `Command::Advance`.
    tick_interval_ms: u32,
}

impl SimulationWorker {
    pub fn new(
        world: World,
        oracles: Oracles,
        command_rx: mpsc::Receiver<Command>,
        event_bus: EventBus,
        event_log: Option<JsonEventLog>,
        tick_interval_ms: u32,
    ) -> Self {
        info!(
            "SimulationWorker initialized with {} units, {} spells, tick interval {} ms",
            world.unit_count(),
            oracles.catalog.spell_count(),
            tick_interval_ms
        );

        Self {
            world,
            oracles,
            command_rx,
            event_bus,
            event_log,
            tick_interval_ms,
        }
    }

    /// Main worker loop. Ends when every command sender is dropped.
    pub async fn run(mut self) {
        let scheduled = self.tick_interval_ms > 0;
        let mut ticker =
            tokio::time::interval(Duration::from_millis(u64::from(self.tick_interval_ms.max(1))));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        if scheduled {
            // The first tick completes immediately.
            ticker.tick().await;
        }

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },
                _ = ticker.tick(), if scheduled => {
                    self.advance(self.tick_interval_ms);
                }
            }
        }

        if let Some(log) = self.event_log.as_mut()
            && let Err(e) = log.flush()
        {
            warn!("Failed to flush event log on shutdown: {}", e);
        }
        info!("SimulationWorker stopped at clock {} ms", self.world.clock_ms());
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Cast { request, reply } => {
                let result = self.cast(request);
                if reply.send(result).is_err() {
                    debug!("Cast reply channel closed (caller dropped)");
                }
            }
            Command::Advance { diff_ms, reply } => {
                let clock = self.advance(diff_ms);
                if reply.send(clock).is_err() {
                    debug!("Advance reply channel closed (caller dropped)");
                }
            }
            Command::RemoveHolder {
                holder,
                mode,
                reply,
            } => {
                let removed = match self.oracles.engine(&mut self.world) {
                    Ok(mut engine) => engine.remove_holder(holder, mode),
                    Err(e) => {
                        warn!("RemoveHolder skipped: {}", e);
                        false
                    }
                };
                self.flush_events();
                if reply.send(removed).is_err() {
                    debug!("RemoveHolder reply channel closed (caller dropped)");
                }
            }
            Command::RemoveAurasBySpell {
                unit,
                spell,
                mode,
                reply,
            } => {
                let removed = match self.oracles.engine(&mut self.world) {
                    Ok(mut engine) => engine.remove_auras_by_spell(unit, spell, mode),
                    Err(e) => {
                        warn!("RemoveAurasBySpell skipped: {}", e);
                        0
                    }
                };
                self.flush_events();
                if reply.send(removed).is_err() {
                    debug!("RemoveAurasBySpell reply channel closed (caller dropped)");
                }
            }
            Command::SpawnUnit { unit, reply } => {
                let id = self.world.add_unit(*unit);
                debug!(%id, "unit spawned");
                if reply.send(id).is_err() {
                    debug!("SpawnUnit reply channel closed (caller dropped)");
                }
            }
            Command::MoveUnit {
                unit,
                position,
                reply,
            } => {
                let result = self
                    .oracles
                    .engine(&mut self.world)
                    .and_then(|mut engine| engine.move_unit(unit, position).map_err(RuntimeError::from));
                self.flush_events();
                if reply.send(result).is_err() {
                    debug!("MoveUnit reply channel closed (caller dropped)");
                }
            }
            Command::KillUnit {
                unit,
                killer,
                reply,
            } => {
                let result = self.kill(unit, killer);
                if reply.send(result).is_err() {
                    debug!("KillUnit reply channel closed (caller dropped)");
                }
            }
            Command::DespawnUnit { unit, reply } => {
                let result = self
                    .oracles
                    .engine(&mut self.world)
                    .and_then(|mut engine| engine.despawn_unit(unit).map_err(RuntimeError::from));
                self.flush_events();
                if reply.send(result).is_err() {
                    debug!("DespawnUnit reply channel closed (caller dropped)");
                }
            }
            Command::QueryUnit { unit, reply } => {
                if reply.send(self.world.unit(unit).cloned()).is_err() {
                    debug!("QueryUnit reply channel closed (caller dropped)");
                }
            }
            Command::QueryHolders { unit, reply } => {
                let holders = self
                    .world
                    .holders_on(unit)
                    .filter(|h| h.is_live())
                    .map(HolderView::from)
                    .collect();
                if reply.send(holders).is_err() {
                    debug!("QueryHolders reply channel closed (caller dropped)");
                }
            }
            Command::Snapshot { reply } => {
                let result = self.world.to_bytes().map_err(RuntimeError::from);
                if reply.send(result).is_err() {
                    debug!("Snapshot reply channel closed (caller dropped)");
                }
            }
        }
    }

    fn cast(&mut self, request: CastRequest) -> Result<CastOutcome> {
        let outcome = self
            .oracles
            .engine(&mut self.world)
            .and_then(|mut engine| engine.cast(request).map_err(RuntimeError::from));
        self.flush_events();
        outcome
    }

    fn kill(&mut self, unit: UnitId, killer: Option<UnitId>) -> Result<()> {
        if self.world.unit(unit).is_none() {
            return Err(RuntimeError::UnknownUnit(unit));
        }
        self.oracles.engine(&mut self.world)?.kill_unit(unit, killer);
        self.flush_events();
        Ok(())
    }

    fn advance(&mut self, diff_ms: u32) -> u64 {
        match self.oracles.engine(&mut self.world) {
            Ok(mut engine) => engine.update(diff_ms),
            Err(e) => warn!("Advance skipped: {}", e),
        }
        self.flush_events();

        let clock_ms = self.world.clock_ms();
        self.event_bus.publish(Event::Tick(TickEvent {
            clock_ms,
            elapsed_ms: diff_ms,
        }));
        clock_ms
    }

    /// Drains the world's event buffer into the log and the bus.
    fn flush_events(&mut self) {
        let events = self.world.drain_events();
        if events.is_empty() {
            return;
        }
        let clock_ms = self.world.clock_ms();

        let failure = self.event_log.as_mut().and_then(|log| {
            events
                .iter()
                .try_for_each(|event| log.append(clock_ms, event).map(|_| ()))
                .err()
        });
        if let Some(e) = failure {
            warn!("Event log disabled after write failure: {}", e);
            self.event_log = None;
        }

        for event in events {
            self.event_bus.publish(Event::Spell(event));
        }
    }
}
