//! In-memory spell and item store.
//!
//! [`SpellCatalog`] owns every static table the engine reads: spell
//! definitions (handed out as shared `Arc`s), duration and radius rows,
//! linked spells and item templates. Content loaders fill one at startup;
//! tests build one in code.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::items::{ItemOracle, ItemTemplate};
use super::spells::SpellOracle;
use crate::spell::{DurationEntry, LinkedSpell, SpellDefinition};
use crate::types::{ItemId, SpellId};

#[derive(Clone, Debug, Default)]
pub struct SpellCatalog {
    spells: BTreeMap<SpellId, Arc<SpellDefinition>>,
    durations: BTreeMap<u32, DurationEntry>,
    radii: BTreeMap<u32, f32>,
    linked: Vec<LinkedSpell>,
    items: BTreeMap<ItemId, ItemTemplate>,
}

impl SpellCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a definition, replacing any previous one with the same id.
    ///
    /// Replacing hands out a new `Arc`; holders created from the old one keep
    /// working but no longer compare canonical.
    pub fn insert_spell(&mut self, spell: SpellDefinition) -> Arc<SpellDefinition> {
        let spell = Arc::new(spell);
        self.spells.insert(spell.id, Arc::clone(&spell));
        spell
    }

    pub fn insert_duration(&mut self, index: u32, entry: DurationEntry) {
        self.durations.insert(index, entry);
    }

    pub fn insert_radius(&mut self, index: u32, yards: f32) {
        self.radii.insert(index, yards);
    }

    pub fn insert_linked(&mut self, link: LinkedSpell) {
        if !self.linked.contains(&link) {
            self.linked.push(link);
        }
    }

    pub fn insert_item(&mut self, item: ItemTemplate) {
        self.items.insert(item.id, item);
    }

    pub fn with_spell(mut self, spell: SpellDefinition) -> Self {
        self.insert_spell(spell);
        self
    }

    pub fn with_duration(mut self, index: u32, entry: DurationEntry) -> Self {
        self.insert_duration(index, entry);
        self
    }

    pub fn with_radius(mut self, index: u32, yards: f32) -> Self {
        self.insert_radius(index, yards);
        self
    }

    pub fn with_linked(mut self, link: LinkedSpell) -> Self {
        self.insert_linked(link);
        self
    }

    pub fn with_item(mut self, item: ItemTemplate) -> Self {
        self.insert_item(item);
        self
    }

    pub fn spell_count(&self) -> usize {
        self.spells.len()
    }

    pub fn spell_ids(&self) -> impl Iterator<Item = SpellId> + '_ {
        self.spells.keys().copied()
    }

    /// Checks cross references: trigger spells, chain links and linked spells
    /// must name spells in the catalog, and duration/radius indices must exist.
    ///
    /// Returns one message per broken reference.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for spell in self.spells.values() {
            if spell.duration_index != 0 && !self.durations.contains_key(&spell.duration_index) {
                problems.push(format!(
                    "{} references missing duration {}",
                    spell.id, spell.duration_index
                ));
            }
            for (slot, effect) in spell.effects.iter().enumerate() {
                if let Some(trigger) = effect.trigger_spell
                    && !self.spells.contains_key(&trigger)
                {
                    problems.push(format!(
                        "{} effect {} triggers missing {}",
                        spell.id, slot, trigger
                    ));
                }
                if effect.radius_index != 0 && !self.radii.contains_key(&effect.radius_index) {
                    problems.push(format!(
                        "{} effect {} references missing radius {}",
                        spell.id, slot, effect.radius_index
                    ));
                }
            }
            if let Some(prev) = spell.chain.and_then(|chain| chain.prev)
                && !self.spells.contains_key(&prev)
            {
                problems.push(format!("{} chain points to missing {}", spell.id, prev));
            }
        }
        for link in &self.linked {
            if !self.spells.contains_key(&link.spell) || !self.spells.contains_key(&link.linked) {
                problems.push(format!(
                    "link {} -> {} names a missing spell",
                    link.spell, link.linked
                ));
            }
        }
        problems
    }
}

impl SpellOracle for SpellCatalog {
    fn spell(&self, id: SpellId) -> Option<Arc<SpellDefinition>> {
        self.spells.get(&id).cloned()
    }

    fn duration(&self, index: u32) -> Option<DurationEntry> {
        self.durations.get(&index).copied()
    }

    fn radius(&self, index: u32) -> Option<f32> {
        self.radii.get(&index).copied()
    }

    fn linked_spells(&self, id: SpellId) -> Vec<LinkedSpell> {
        self.linked
            .iter()
            .filter(|link| link.spell == id)
            .copied()
            .collect()
    }
}

impl ItemOracle for SpellCatalog {
    fn item(&self, id: ItemId) -> Option<ItemTemplate> {
        self.items.get(&id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aura::AuraType;
    use crate::spell::LinkedSpellKind;
    use crate::types::EffectIndex;

    #[test]
    fn hands_out_the_same_arc() {
        let catalog = SpellCatalog::new().with_spell(SpellDefinition::builder(7).build());
        let a = catalog.spell(SpellId(7)).expect("spell present");
        let b = catalog.spell(SpellId(7)).expect("spell present");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(catalog.spell(SpellId(8)).is_none());
    }

    #[test]
    fn rank_for_level_walks_the_chain_down() {
        let catalog = SpellCatalog::new()
            .with_spell(
                SpellDefinition::builder(1)
                    .levels(1, 1, 10)
                    .chain(1, None, 1)
                    .build(),
            )
            .with_spell(
                SpellDefinition::builder(2)
                    .levels(20, 20, 30)
                    .chain(1, Some(1), 2)
                    .build(),
            );
        let top = catalog.spell(SpellId(2)).expect("rank 2");
        let low = catalog.rank_for_level(&top, 5).expect("rank 1 fits");
        assert_eq!(low.id, SpellId(1));
        let same = catalog.rank_for_level(&top, 15).expect("rank 2 fits");
        assert_eq!(same.id, SpellId(2));
    }

    #[test]
    fn validate_reports_dangling_references() {
        let mut spell = SpellDefinition::builder(1)
            .duration_index(9)
            .aura(EffectIndex::Effect0, AuraType::PeriodicTriggerSpell, 0, 1000)
            .build();
        spell.effects[0].trigger_spell = Some(SpellId(99));
        let catalog = SpellCatalog::new().with_spell(spell).with_linked(LinkedSpell {
            spell: SpellId(1),
            linked: SpellId(50),
            kind: LinkedSpellKind::Boost,
        });
        let problems = catalog.validate();
        assert_eq!(problems.len(), 3, "{problems:?}");
    }

    #[test]
    fn linked_spells_filter_by_source() {
        let link = LinkedSpell {
            spell: SpellId(1),
            linked: SpellId(2),
            kind: LinkedSpellKind::CastOnRemove,
        };
        let catalog = SpellCatalog::new().with_linked(link).with_linked(link);
        assert_eq!(catalog.linked_spells(SpellId(1)), vec![link]);
        assert!(catalog.linked_spells(SpellId(2)).is_empty());
    }
}
