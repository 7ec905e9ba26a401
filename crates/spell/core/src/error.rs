//! Common error infrastructure for spell-core.
//!
//! Engine operations only fail on programmer errors or unusable input
//! (unknown ids, missing oracles). Game-rule outcomes such as resists, immune
//! targets or missing preconditions are modeled as ordinary branches and never
//! surface here.
//!
//! # Design Principles
//!
//! - **Type Safety**: each layer owns its error enum
//! - **Plain Data**: variants carry the ids involved and compare by value
//! - **Severity Classification**: callers pick a recovery strategy by severity

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: the request may succeed later (unit not spawned yet)
/// - **Validation**: invalid input that should be rejected without retry
/// - **Internal**: unexpected state inconsistency that requires investigation
/// - **Fatal**: the engine cannot continue (missing oracle)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    Recoverable,
    Validation,
    Internal,
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all spell-core errors.
///
/// - All error enums implement this trait
/// - `#[derive(thiserror::Error)]` provides Display/Error
/// - Severity is classified by recoverability, not impact
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_classification() {
        assert!(ErrorSeverity::Recoverable.is_recoverable());
        assert!(!ErrorSeverity::Validation.is_internal());
        assert!(ErrorSeverity::Fatal.is_internal());
        assert_eq!(ErrorSeverity::Internal.as_str(), "internal");
    }
}
