//! Item template loader.

use std::path::Path;

use serde::{Deserialize, Serialize};
use spell_core::ItemTemplate;

use crate::loaders::{LoadResult, read_file};

/// Item catalog structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemCatalog {
    pub items: Vec<ItemTemplate>,
}

/// Loader for item templates from RON files.
pub struct ItemLoader;

impl ItemLoader {
    pub fn load(path: &Path) -> LoadResult<Vec<ItemTemplate>> {
        let content = read_file(path)?;
        let catalog: ItemCatalog = ron::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse item catalog RON: {}", e))?;

        for item in &catalog.items {
            if item.max_stack == 0 {
                anyhow::bail!("item {} ({}) has max_stack 0", item.id.0, item.name);
            }
        }
        Ok(catalog.items)
    }
}
