//! Static spell store interface.

use std::sync::Arc;

use crate::spell::{DurationEntry, LinkedSpell, SpellDefinition};
use crate::types::SpellId;

/// Canonical, read-only spell store.
///
/// `spell` must hand out the same `Arc` for the same id for the lifetime of
/// the store; the engine relies on pointer identity to verify it still holds
/// the canonical definition.
pub trait SpellOracle: Send + Sync {
    fn spell(&self, id: SpellId) -> Option<Arc<SpellDefinition>>;

    /// Duration table lookup. Index 0 means "no duration entry".
    fn duration(&self, index: u32) -> Option<DurationEntry>;

    /// Radius table lookup in yards.
    fn radius(&self, index: u32) -> Option<f32>;

    /// Spells linked to `id` (boosts, cast-on-remove, remove-on-remove).
    fn linked_spells(&self, _id: SpellId) -> Vec<LinkedSpell> {
        Vec::new()
    }

    /// Highest rank of `spell`'s chain usable by a unit of `level`.
    ///
    /// Returns `None` when even the lowest rank is too high. Passive spells
    /// and spells outside a chain are returned unchanged.
    fn rank_for_level(
        &self,
        spell: &Arc<SpellDefinition>,
        level: u32,
    ) -> Option<Arc<SpellDefinition>> {
        if level + 10 >= spell.spell_level || spell.is_passive() || spell.chain.is_none() {
            return Some(Arc::clone(spell));
        }

        let mut current = Some(Arc::clone(spell));
        while let Some(rank) = current {
            if level + 10 >= rank.spell_level {
                return Some(rank);
            }
            current = rank
                .chain
                .and_then(|chain| chain.prev)
                .and_then(|prev| self.spell(prev));
        }
        None
    }
}
