//! Data-driven spell content and loaders.
//!
//! This crate reads static spell data from RON/TOML files:
//! - Spell definitions and linked spells (RON)
//! - Duration and radius tables (RON)
//! - Item templates (RON)
//! - Engine configuration (TOML)
//!
//! Everything lands in a [`spell_core::SpellCatalog`], which the engine
//! consumes through its spell and item oracles. Content never appears in
//! world state.

pub mod loaders;

pub use loaders::{
    ConfigLoader, ContentFactory, ItemLoader, LoadResult, SpellBook, SpellLoader, SpellTables,
    TablesLoader,
};
