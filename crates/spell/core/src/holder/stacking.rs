//! Stack counts and rank/seal replacement between holders.

use crate::engine::SpellEngine;
use crate::holder::{RemovalMode, SpellAuraHolder};
use crate::types::{EffectIndex, HolderId};

impl SpellEngine<'_> {
    /// Changes the stack count of a holder by `delta`.
    ///
    /// The count is clamped to `0..=max(stack_amount, 1)`. Reaching zero
    /// removes the holder. A positive delta refreshes duration and charges
    /// even when the count is already at the cap. When the count changes,
    /// every aura is re-applied with `per-stack base × count`.
    ///
    /// Returns `false` when the holder is gone afterwards.
    pub fn mod_stack_amount(&mut self, id: HolderId, delta: i32) -> bool {
        let Some(holder) = self.world.holder_mut(id) else {
            return false;
        };
        if !holder.is_live() {
            return false;
        }
        let max = holder.spell.stack_amount.max(1) as i32;
        let current = holder.stack_amount as i32;
        let new = current.saturating_add(delta).clamp(0, max);
        if new == 0 {
            self.remove_holder(id, RemovalMode::Default);
            return false;
        }
        if delta > 0 {
            holder.refresh_duration();
            holder.proc_charges = holder.spell.proc_charges;
        }
        holder.stack_amount = new as u32;
        tracing::trace!(%id, from = current, to = new, "stack amount changed");

        if new != current {
            let amounts: Vec<(EffectIndex, i32)> = holder
                .iter_auras()
                .map(|aura| (aura.effect_index, aura.stack_scaled_base.saturating_mul(new)))
                .collect();
            for (index, amount) in amounts {
                if !self.world.holder(id).is_some_and(SpellAuraHolder::is_live) {
                    return false;
                }
                self.reapply_aura_amount(id, index, amount);
            }
        }
        self.refresh_visible_slot(id);
        self.world.holder(id).is_some_and(SpellAuraHolder::is_live)
    }

    /// Clears holders that cannot coexist with `holder` on its target.
    ///
    /// Lower or equal ranks of the same chain are replaced; a higher rank
    /// already present rejects `holder` (returns `false`). A caster keeps at
    /// most one seal on a target. Passive holders never displace active ones.
    pub(crate) fn remove_no_stack_holders(&mut self, holder: &SpellAuraHolder) -> bool {
        let spell = &holder.spell;
        let stacks_across = holder
            .iter_auras()
            .all(|aura| aura.aura_type.stacks_across_casters());
        let mut displaced = Vec::new();
        for other in self.world.holders_on(holder.target) {
            if other.id == holder.id || other.spell.id == spell.id {
                continue;
            }
            if other.passive != holder.passive {
                continue;
            }
            let same_caster = other.caster == holder.caster;
            if let (Some(chain), Some(other_chain)) = (spell.chain, other.spell.chain)
                && chain.first == other_chain.first
                && (same_caster || !stacks_across)
            {
                if other_chain.rank > chain.rank {
                    return false;
                }
                displaced.push(other.id);
                continue;
            }
            if spell.is_seal() && other.spell.is_seal() && same_caster {
                displaced.push(other.id);
            }
        }
        for id in displaced {
            self.remove_holder(id, RemovalMode::Stack);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::aura::AuraType;
    use crate::engine::CastRequest;
    use crate::spell::SpellDefinition;
    use crate::test_utils::Fixture;
    use crate::types::EffectIndex;

    #[test]
    fn stack_count_caps_and_scales_the_amount() {
        let mut fx = Fixture::new();
        let spell = fx.spell(
            SpellDefinition::builder(130)
                .stack_amount(3)
                .aura(EffectIndex::Effect0, AuraType::ModStat, 5, 0)
                .build(),
        );
        let unit = fx.creature(1, 0);
        for _ in 0..4 {
            fx.engine().cast(CastRequest::new(unit, spell)).expect("cast");
        }
        let id = fx.world.find_holder(unit, spell, unit).expect("holder");
        assert_eq!(fx.world.holder(id).map(|h| h.stack_amount), Some(3));
        assert_eq!(fx.world.aura(id, EffectIndex::Effect0).map(|a| a.amount), Some(15));

        assert!(fx.engine().mod_stack_amount(id, -1));
        assert_eq!(fx.world.aura(id, EffectIndex::Effect0).map(|a| a.amount), Some(10));
        assert!(!fx.engine().mod_stack_amount(id, -5));
        assert!(!fx.world.has_holder_of_spell(unit, spell));
    }

    #[test]
    fn higher_rank_replaces_lower_rank() {
        let mut fx = Fixture::new();
        let rank = |id: u32, prev: Option<u32>, rank: u32, amount: i32| {
            SpellDefinition::builder(id)
                .chain(131, prev, rank)
                .aura(EffectIndex::Effect0, AuraType::ModStat, amount, 0)
                .build()
        };
        let low = fx.spell(rank(131, None, 1, 5));
        let high = fx.spell(rank(132, Some(131), 2, 10));
        let caster = fx.player(1, 0);
        let target = fx.player(2, 5);

        fx.engine().cast(CastRequest::new(caster, low).on(target)).expect("cast");
        fx.engine().cast(CastRequest::new(caster, high).on(target)).expect("cast");
        assert!(!fx.world.has_holder_of_spell(target, low));
        assert!(fx.world.has_holder_of_spell(target, high));
    }
}
