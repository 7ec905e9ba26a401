//! Persistence for runtime output.
//!
//! The only repository today is the JSON-lines event log, which mirrors every
//! engine event the simulation worker publishes.

mod error;
mod event_log;

pub use error::{RepositoryError, Result};
pub use event_log::{EventLogEntry, JsonEventLog};
