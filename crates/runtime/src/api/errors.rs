//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination, the engine, content loading and
//! repositories so clients can bubble them up with consistent context.
use thiserror::Error;
use tokio::sync::oneshot;

use spell_core::{EngineError, SnapshotError, UnitId};

pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("simulation worker command channel closed")]
    CommandChannelClosed,

    #[error("simulation worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("simulation worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("runtime requires a spell catalog to be configured before building")]
    MissingCatalog,

    #[error("unit {0} is not registered")]
    UnknownUnit(UnitId),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("failed to load spell content: {0:#}")]
    Content(anyhow::Error),

    #[error("environment variable {key} has invalid value {value:?}")]
    InvalidEnv { key: &'static str, value: String },

    #[error("invalid log filter")]
    LogFilter(#[source] tracing_subscriber::filter::ParseError),

    #[error("global tracing subscriber already installed")]
    LoggingInit(#[source] tracing_subscriber::util::TryInitError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
