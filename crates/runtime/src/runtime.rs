//! High-level runtime orchestrator.
//!
//! The runtime owns the simulation worker, wires up command/event channels,
//! and exposes a builder-based API for clients to drive the engine.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use spell_content::ContentFactory;
use spell_core::{AuraConfig, SpellCatalog, World};

use crate::api::{Result, RuntimeError, RuntimeHandle};
use crate::events::EventBus;
use crate::repository::JsonEventLog;
use crate::workers::{Command, Oracles, SimulationWorker};

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Scheduled advance period in ms; 0 disables the ticker.
    pub tick_interval_ms: u32,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
    /// Seed of a freshly created world.
    pub seed: u64,
    /// Directory for `events.jsonl`; no event log when unset.
    pub event_log_dir: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            event_buffer_size: 100,
            command_buffer_size: 32,
            seed: 0,
            event_log_dir: None,
        }
    }
}

impl RuntimeConfig {
    pub const EVENT_LOG_FILE: &'static str = "events.jsonl";

    /// Defaults overridden by `SPELL_TICK_MS`, `SPELL_SEED` and
    /// `SPELL_EVENT_LOG_DIR`, after loading a `.env` file if one exists.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut config = Self::default();
        if let Some(ms) = env_parse("SPELL_TICK_MS")? {
            config.tick_interval_ms = ms;
        }
        if let Some(seed) = env_parse("SPELL_SEED")? {
            config.seed = seed;
        }
        if let Ok(dir) = std::env::var("SPELL_EVENT_LOG_DIR")
            && !dir.is_empty()
        {
            config.event_log_dir = Some(PathBuf::from(dir));
        }
        Ok(config)
    }
}

fn env_parse<T: FromStr>(key: &'static str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| RuntimeError::InvalidEnv { key, value }),
        Err(_) => Ok(None),
    }
}

/// Main runtime that owns the simulation worker
///
/// [`RuntimeHandle`] provides a cloneable façade for clients.
pub struct Runtime {
    handle: RuntimeHandle,
    sim_worker_handle: JoinHandle<()>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    /// Shutdown the runtime gracefully
    ///
    /// The worker stops once every handle clone is dropped; outstanding
    /// clients keep it alive.
    pub async fn shutdown(self) -> Result<()> {
        drop(self.handle);

        self.sim_worker_handle
            .await
            .map_err(RuntimeError::WorkerJoin)
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    catalog: Option<Arc<SpellCatalog>>,
    aura_config: AuraConfig,
    world: Option<World>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            catalog: None,
            aura_config: AuraConfig::default(),
            world: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the required spell catalog
    pub fn catalog(mut self, catalog: impl Into<Arc<SpellCatalog>>) -> Self {
        self.catalog = Some(catalog.into());
        self
    }

    /// Override engine tunables
    pub fn aura_config(mut self, config: AuraConfig) -> Self {
        self.aura_config = config;
        self
    }

    /// Provide an initial world (e.g. restored from a snapshot)
    pub fn world(mut self, world: World) -> Self {
        self.world = Some(world);
        self
    }

    /// Load catalog and engine configuration from a content directory
    pub fn content(self, factory: &ContentFactory) -> Result<Self> {
        let catalog = factory.load_catalog().map_err(RuntimeError::Content)?;
        let aura_config = factory.load_config().map_err(RuntimeError::Content)?;
        Ok(self.catalog(catalog).aura_config(aura_config))
    }

    /// Build the runtime and spawn its worker
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> Result<Runtime> {
        let catalog = self.catalog.ok_or(RuntimeError::MissingCatalog)?;
        let world = self.world.unwrap_or_else(|| World::new(self.config.seed));

        let event_log = match &self.config.event_log_dir {
            Some(dir) => Some(JsonEventLog::create(dir, RuntimeConfig::EVENT_LOG_FILE)?),
            None => None,
        };

        let (command_tx, command_rx) = mpsc::channel::<Command>(self.config.command_buffer_size.max(1));
        let event_bus = EventBus::with_capacity(self.config.event_buffer_size);

        let handle = RuntimeHandle::new(command_tx, event_bus.clone());

        let sim_worker = SimulationWorker::new(
            world,
            Oracles::new(catalog, self.aura_config),
            command_rx,
            event_bus,
            event_log,
            self.config.tick_interval_ms,
        );

        let sim_worker_handle = tokio::spawn(async move {
            sim_worker.run().await;
        });

        Ok(Runtime {
            handle,
            sim_worker_handle,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn build_requires_a_catalog() {
        assert!(matches!(
            Runtime::builder().build(),
            Err(RuntimeError::MissingCatalog)
        ));
    }

    #[test]
    fn default_config_ticks_every_hundred_ms() {
        let config = RuntimeConfig::default();
        assert_eq!(config.tick_interval_ms, 100);
        assert!(config.event_log_dir.is_none());
    }
}
