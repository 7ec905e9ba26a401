//! Duration and radius table loader.

use std::path::Path;

use serde::{Deserialize, Serialize};
use spell_core::DurationEntry;

use crate::loaders::{LoadResult, read_file};

/// Shared lookup tables referenced by index from spell definitions.
///
/// Index 0 is reserved: a spell with duration index 0 lasts forever and an
/// effect with radius index 0 has no area.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpellTables {
    pub durations: Vec<(u32, DurationEntry)>,
    /// Radius rows in yards.
    pub radii: Vec<(u32, f32)>,
}

/// Loader for duration/radius tables from RON files.
pub struct TablesLoader;

impl TablesLoader {
    pub fn load(path: &Path) -> LoadResult<SpellTables> {
        let content = read_file(path)?;
        let tables: SpellTables = ron::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse tables RON: {}", e))?;

        if tables.durations.iter().any(|(index, _)| *index == 0) {
            anyhow::bail!("duration index 0 is reserved for infinite spells");
        }
        if let Some((index, yards)) = tables.radii.iter().find(|(_, yards)| *yards < 0.0) {
            anyhow::bail!("radius {} is negative ({})", index, yards);
        }
        Ok(tables)
    }
}
