//! Runtime orchestration for the spell and aura engine.
//!
//! This crate wraps a [`spell_core::World`] in a single tokio task that owns
//! it, advances it on a fixed interval and serializes every mutation sent
//! through [`RuntimeHandle`]. Engine events fan out over a topic-based
//! [`EventBus`] and can be mirrored to a JSON-lines log.
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator, builder and configuration
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides the topic-based event bus
//! - [`repository`] persists event logs
//! - [`logging`] installs the tracing subscriber
pub mod api;
pub mod events;
pub mod logging;
pub mod repository;
pub mod runtime;

mod workers;

pub use api::{HolderView, Result, RuntimeError, RuntimeHandle};
pub use events::{Event, EventBus, TickEvent, Topic};
pub use logging::{LoggingConfig, init_logging};
pub use repository::{EventLogEntry, JsonEventLog, RepositoryError};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
