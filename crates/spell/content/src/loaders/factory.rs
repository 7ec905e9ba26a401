//! Content factory for building a spell catalog from data files.

use std::path::{Path, PathBuf};

use spell_core::{AuraConfig, ItemTemplate, SpellCatalog};

use crate::loaders::{
    ConfigLoader, ItemLoader, LoadResult, SpellBook, SpellLoader, SpellTables, TablesLoader,
};

/// Content factory that loads all spell content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml
/// ├── spells.ron
/// ├── tables.ron
/// └── items.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load engine configuration from `config.toml`.
    pub fn load_config(&self) -> LoadResult<AuraConfig> {
        ConfigLoader::load(&self.data_dir.join("config.toml"))
    }

    /// Load spell definitions and links from `spells.ron`.
    pub fn load_spells(&self) -> LoadResult<SpellBook> {
        SpellLoader::load(&self.data_dir.join("spells.ron"))
    }

    /// Load duration and radius rows from `tables.ron`.
    pub fn load_tables(&self) -> LoadResult<SpellTables> {
        TablesLoader::load(&self.data_dir.join("tables.ron"))
    }

    /// Load item templates from `items.ron`.
    pub fn load_items(&self) -> LoadResult<Vec<ItemTemplate>> {
        ItemLoader::load(&self.data_dir.join("items.ron"))
    }

    /// Builds a validated catalog from every data file.
    ///
    /// Fails with one line per broken reference when a spell names a missing
    /// trigger spell, chain link, duration or radius.
    pub fn load_catalog(&self) -> LoadResult<SpellCatalog> {
        let book = self.load_spells()?;
        let tables = self.load_tables()?;
        let items = self.load_items()?;

        let mut catalog = SpellCatalog::new();
        for (index, entry) in tables.durations {
            catalog.insert_duration(index, entry);
        }
        for (index, yards) in tables.radii {
            catalog.insert_radius(index, yards);
        }
        for spell in book.spells {
            catalog.insert_spell(spell);
        }
        for link in book.linked {
            catalog.insert_linked(link);
        }
        for item in items {
            catalog.insert_item(item);
        }

        let problems = catalog.validate();
        if !problems.is_empty() {
            anyhow::bail!(
                "spell content in {} is inconsistent:\n{}",
                self.data_dir.display(),
                problems.join("\n")
            );
        }
        Ok(catalog)
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
