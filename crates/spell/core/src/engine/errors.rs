//! Error types for engine commands.

use crate::env::OracleError;
use crate::error::{ErrorSeverity, GameError};
use crate::types::{HolderId, SpellId, UnitId};

/// Errors surfaced by [`super::SpellEngine`] commands.
///
/// Rule outcomes (resists, immunity, dead targets, full inventories) are not
/// errors; they show up as events or as a quiet no-op.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EngineError {
    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error("unit {0} is not registered")]
    UnknownUnit(UnitId),

    #[error("spell {0} is not in the spell store")]
    UnknownSpell(SpellId),

    #[error("{0} is not in the holder arena")]
    UnknownHolder(HolderId),

    #[error("{0} is not the store's canonical definition")]
    NonCanonicalSpell(SpellId),

    #[error("triggered cast of {spell} exceeds nesting depth {depth}")]
    TriggerDepthExceeded { spell: SpellId, depth: u32 },

    #[error("{spell} has no effect at index {index}")]
    InvalidEffectIndex { spell: SpellId, index: usize },
}

impl GameError for EngineError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Oracle(err) => err.severity(),
            Self::UnknownUnit(_) => ErrorSeverity::Recoverable,
            Self::UnknownSpell(_) | Self::InvalidEffectIndex { .. } => ErrorSeverity::Validation,
            Self::UnknownHolder(_) | Self::NonCanonicalSpell(_) => ErrorSeverity::Internal,
            Self::TriggerDepthExceeded { .. } => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Oracle(err) => err.error_code(),
            Self::UnknownUnit(_) => "ENGINE_UNKNOWN_UNIT",
            Self::UnknownSpell(_) => "ENGINE_UNKNOWN_SPELL",
            Self::UnknownHolder(_) => "ENGINE_UNKNOWN_HOLDER",
            Self::NonCanonicalSpell(_) => "ENGINE_NON_CANONICAL_SPELL",
            Self::TriggerDepthExceeded { .. } => "ENGINE_TRIGGER_DEPTH_EXCEEDED",
            Self::InvalidEffectIndex { .. } => "ENGINE_INVALID_EFFECT_INDEX",
        }
    }
}
