//! Oracle access errors.

use crate::error::{ErrorSeverity, GameError};
use crate::types::{ItemId, SpellId};

/// Errors that occur when accessing oracle data.
///
/// A missing oracle is fatal: the engine cannot resolve spells or roll
/// without one. Unknown ids are validation errors on the caller's input.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OracleError {
    #[error("SpellOracle not available")]
    SpellsNotAvailable,

    #[error("ItemOracle not available")]
    ItemsNotAvailable,

    #[error("PolicyOracle not available")]
    PolicyNotAvailable,

    #[error("ConfigOracle not available")]
    ConfigNotAvailable,

    #[error("RngOracle not available")]
    RngNotAvailable,

    #[error("spell definition {0} not found")]
    SpellNotFound(SpellId),

    #[error("item template {0:?} not found")]
    ItemNotFound(ItemId),
}

impl GameError for OracleError {
    fn severity(&self) -> ErrorSeverity {
        use OracleError::*;
        match self {
            SpellsNotAvailable | ItemsNotAvailable | PolicyNotAvailable | ConfigNotAvailable
            | RngNotAvailable => ErrorSeverity::Fatal,
            SpellNotFound(_) | ItemNotFound(_) => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        use OracleError::*;
        match self {
            SpellsNotAvailable => "ORACLE_SPELLS_NOT_AVAILABLE",
            ItemsNotAvailable => "ORACLE_ITEMS_NOT_AVAILABLE",
            PolicyNotAvailable => "ORACLE_POLICY_NOT_AVAILABLE",
            ConfigNotAvailable => "ORACLE_CONFIG_NOT_AVAILABLE",
            RngNotAvailable => "ORACLE_RNG_NOT_AVAILABLE",
            SpellNotFound(_) => "ORACLE_SPELL_NOT_FOUND",
            ItemNotFound(_) => "ORACLE_ITEM_NOT_FOUND",
        }
    }
}
