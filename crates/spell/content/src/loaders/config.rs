//! Engine configuration loader.

use std::path::Path;

use spell_core::AuraConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for [`AuraConfig`] from TOML files.
///
/// Keys left out of the file keep their `AuraConfig::new()` defaults.
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load(path: &Path) -> LoadResult<AuraConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML at {}: {}", path.display(), e))
    }

    pub fn parse(content: &str) -> LoadResult<AuraConfig> {
        let config: AuraConfig = toml::from_str(content)?;
        if config.max_trigger_depth == 0 {
            anyhow::bail!("max_trigger_depth must be at least 1");
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_keep_defaults() {
        let config = ConfigLoader::parse("heartbeat_resist = false\nmax_trigger_depth = 4\n")
            .expect("valid config");
        assert!(!config.heartbeat_resist);
        assert_eq!(config.max_trigger_depth, 4);
        assert_eq!(
            config.mana_drain_interval_ms,
            AuraConfig::DEFAULT_MANA_DRAIN_INTERVAL_MS
        );
    }

    #[test]
    fn zero_trigger_depth_is_rejected() {
        assert!(ConfigLoader::parse("max_trigger_depth = 0").is_err());
    }
}
