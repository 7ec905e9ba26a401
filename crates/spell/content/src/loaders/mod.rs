//! Content loaders for reading spell data from files.

pub mod config;
pub mod factory;
pub mod item;
pub mod spells;
pub mod tables;

pub use config::ConfigLoader;
pub use factory::ContentFactory;
pub use item::ItemLoader;
pub use spells::{SpellBook, SpellLoader};
pub use tables::{SpellTables, TablesLoader};

use std::path::Path;

use anyhow::Context;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file {}", path.display()))
}
