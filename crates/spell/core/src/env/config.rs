//! Configuration oracle for exposing engine tunables.

use crate::config::AuraConfig;

/// Provides access to runtime configuration values.
pub trait ConfigOracle: Send + Sync {
    fn aura_config(&self) -> &AuraConfig;
}

impl ConfigOracle for AuraConfig {
    fn aura_config(&self) -> &AuraConfig {
        self
    }
}
