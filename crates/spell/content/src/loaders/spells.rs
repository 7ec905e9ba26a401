//! Spell definition loader.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use spell_core::spell::LinkedSpell;
use spell_core::SpellDefinition;

use crate::loaders::{LoadResult, read_file};

/// Spell file structure for RON files.
///
/// ```ron
/// (
///     spells: [
///         (id: SpellId(589), name: "Shadow Word: Pain", duration_index: 1, ...),
///     ],
///     linked: [
///         (spell: SpellId(1), linked: SpellId(2), kind: Boost),
///     ],
/// )
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpellBook {
    pub spells: Vec<SpellDefinition>,
    pub linked: Vec<LinkedSpell>,
}

/// Loader for spell definitions from RON files.
pub struct SpellLoader;

impl SpellLoader {
    pub fn load(path: &Path) -> LoadResult<SpellBook> {
        let content = read_file(path)?;
        let book: SpellBook = ron::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse spells RON at {}: {}", path.display(), e))?;

        let mut seen = BTreeSet::new();
        for spell in &book.spells {
            if !seen.insert(spell.id) {
                anyhow::bail!("duplicate spell id {} in {}", spell.id.0, path.display());
            }
        }
        Ok(book)
    }
}
