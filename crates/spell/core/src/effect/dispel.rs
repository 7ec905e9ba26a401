//! Dispel by category and by mechanic.

use crate::effect::EffectCtx;
use crate::engine::SpellEngine;
use crate::engine::roll_ctx::{DISPEL_PICK, DISPEL_RESIST};
use crate::event::SpellEvent;
use crate::holder::RemovalMode;
use crate::spell::{DispelType, Mechanic, SpellAttributes};
use crate::types::{HolderId, SpellId, UnitId};

/// A dispellable holder and the attempts still left against it.
struct Candidate {
    holder: HolderId,
    spell: SpellId,
    charges: u32,
}

impl SpellEngine<'_> {
    /// Holders on `target` that a dispel of `mask` may remove. Magic on a
    /// friendly target is only cleansed when harmful, on anyone else only
    /// when helpful.
    fn dispel_candidates(&self, caster: UnitId, target: UnitId, mask: u32) -> Vec<Candidate> {
        let Some(unit) = self.world.unit(target) else {
            return Vec::new();
        };
        let friendly = self.world.unit(caster).is_some_and(|c| unit.is_friendly_to(c));
        self.world
            .holders_on(target)
            .filter(|h| h.is_live() && !h.passive)
            .filter(|h| !h.spell.attributes.contains(SpellAttributes::CANT_BE_DISPELLED))
            .filter(|h| h.spell.dispel.mask() & mask != 0)
            .filter(|h| h.spell.dispel != DispelType::Magic || h.positive != friendly)
            .map(|h| Candidate {
                holder: h.id,
                spell: h.spell_id(),
                charges: h.stack_amount.max(1),
            })
            .collect()
    }

    /// Removes up to `amount` stacks of matching auras, picked at random
    /// with each stack weighted equally. Every pick may be resisted.
    pub(super) fn effect_dispel(&mut self, ctx: &mut EffectCtx) {
        let Some(target) = self.living_target(ctx) else {
            return;
        };
        let mask = self.policy.dispel_mask(DispelType::from_misc(ctx.effect().misc_value));
        let mut candidates = self.dispel_candidates(ctx.caster, target, mask);
        if candidates.is_empty() {
            return;
        }

        let mut removed = Vec::new();
        let mut failed = Vec::new();
        for _ in 0..ctx.amount.max(1) {
            let total: u32 = candidates.iter().map(|c| c.charges).sum();
            if total == 0 {
                break;
            }
            let mut pick = self.roll_range(ctx.caster, DISPEL_PICK, 0, total - 1);
            let Some(index) = candidates.iter().position(|c| {
                if pick < c.charges {
                    return true;
                }
                pick -= c.charges;
                false
            }) else {
                break;
            };
            candidates[index].charges -= 1;
            let (holder, spell) = (candidates[index].holder, candidates[index].spell);

            let resist_chance = match (self.world.unit(target), self.world.holder(holder)) {
                (Some(unit), Some(h)) => {
                    self.policy
                        .dispel_resist_chance(self.world.unit(ctx.caster), unit, &h.spell)
                }
                _ => continue,
            };
            if self.roll_chance(target, DISPEL_RESIST, resist_chance) {
                failed.push(spell);
                continue;
            }
            let stacked = self.world.holder(holder).is_some_and(|h| h.stack_amount > 1);
            if stacked {
                self.mod_stack_amount(holder, -1);
            } else {
                self.remove_holder(holder, RemovalMode::Dispel);
            }
            removed.push(spell);
        }

        tracing::debug!(
            caster = %ctx.caster,
            %target,
            removed = removed.len(),
            failed = failed.len(),
            "dispel"
        );
        self.emit(SpellEvent::DispelResult {
            caster: ctx.caster,
            target,
            removed,
            failed,
        });
    }

    pub(super) fn effect_dispel_mechanic(&mut self, ctx: &mut EffectCtx) {
        let Some(target) = self.living_target(ctx) else {
            return;
        };
        let mask = Mechanic::from_misc(ctx.effect().misc_value).mask_bit();
        if mask == 0 {
            return;
        }
        self.remove_auras_by_mechanic(target, mask, RemovalMode::Dispel);
    }
}

#[cfg(test)]
mod tests {
    use crate::aura::AuraType;
    use crate::effect::SpellEffectKind;
    use crate::engine::CastRequest;
    use crate::event::SpellEvent;
    use crate::spell::{
        DispelType, ImplicitTarget, Mechanic, SpellAttributes, SpellDefinition, SpellEffectEntry,
    };
    use crate::test_utils::Fixture;
    use crate::types::{EffectIndex, SpellId};

    fn dispel_spell(fx: &mut Fixture, id: u32, kind: SpellEffectKind, base: i32, misc: i32) -> SpellId {
        fx.spell(
            SpellDefinition::builder(id)
                .effect(
                    EffectIndex::Effect0,
                    SpellEffectEntry {
                        base_points: base,
                        misc_value: misc,
                        ..SpellEffectEntry::new(kind)
                    },
                )
                .build(),
        )
    }

    fn magic_dot(fx: &mut Fixture, id: u32) -> SpellId {
        fx.spell(
            SpellDefinition::builder(id)
                .dispel(DispelType::Magic)
                .aura(EffectIndex::Effect0, AuraType::PeriodicDamage, 5, 3000)
                .build(),
        )
    }

    #[test]
    fn magic_dispel_on_an_ally_only_takes_harmful_auras() {
        let mut fx = Fixture::new();
        let dot = magic_dot(&mut fx, 160);
        let buff = fx.spell(
            SpellDefinition::builder(161)
                .dispel(DispelType::Magic)
                .effect(
                    EffectIndex::Effect0,
                    SpellEffectEntry {
                        aura: AuraType::ModRegen,
                        base_points: 5,
                        target: ImplicitTarget::Caster,
                        ..SpellEffectEntry::new(SpellEffectKind::ApplyAura)
                    },
                )
                .build(),
        );
        let cleanse = dispel_spell(&mut fx, 162, SpellEffectKind::Dispel, 2, DispelType::Magic as i32);
        let warlock = fx.creature(1, 0);
        let player = fx.player(2, 3);
        let priest = fx.player(3, 4);
        fx.engine().cast(CastRequest::new(player, buff)).expect("cast");
        fx.engine().cast(CastRequest::new(warlock, dot).on(player)).expect("cast");

        fx.engine().cast(CastRequest::new(priest, cleanse).on(player)).expect("cast");
        assert!(!fx.world.has_holder_of_spell(player, dot));
        assert!(fx.world.has_holder_of_spell(player, buff));
        assert!(fx.world.events().contains(&SpellEvent::DispelResult {
            caster: priest,
            target: player,
            removed: vec![dot],
            failed: vec![],
        }));
    }

    #[test]
    fn dispel_takes_one_stack_at_a_time() {
        let mut fx = Fixture::new();
        let sunder = fx.spell(
            SpellDefinition::builder(163)
                .dispel(DispelType::Magic)
                .stack_amount(3)
                .aura(EffectIndex::Effect0, AuraType::PeriodicDamage, 5, 3000)
                .build(),
        );
        let cleanse = dispel_spell(&mut fx, 164, SpellEffectKind::Dispel, 1, DispelType::Magic as i32);
        let boss = fx.creature(1, 0);
        let player = fx.player(2, 3);
        let priest = fx.player(3, 4);
        for _ in 0..3 {
            fx.engine().cast(CastRequest::new(boss, sunder).on(player)).expect("cast");
        }
        let holder = fx.world.find_holder(player, sunder, boss).expect("holder");
        assert_eq!(fx.world.holder(holder).map(|h| h.stack_amount), Some(3));

        fx.engine().cast(CastRequest::new(priest, cleanse).on(player)).expect("cast");
        assert_eq!(fx.world.holder(holder).map(|h| h.stack_amount), Some(2));
    }

    #[test]
    fn undispellable_auras_stay() {
        let mut fx = Fixture::new();
        let curse = fx.spell(
            SpellDefinition::builder(165)
                .dispel(DispelType::Curse)
                .attributes(SpellAttributes::CANT_BE_DISPELLED)
                .aura(EffectIndex::Effect0, AuraType::PeriodicDamage, 5, 3000)
                .build(),
        );
        let decurse = dispel_spell(&mut fx, 166, SpellEffectKind::Dispel, 1, DispelType::Curse as i32);
        let boss = fx.creature(1, 0);
        let player = fx.player(2, 3);
        fx.engine().cast(CastRequest::new(boss, curse).on(player)).expect("cast");
        fx.engine().cast(CastRequest::new(player, decurse).on(player)).expect("cast");
        assert!(fx.world.has_holder_of_spell(player, curse));
    }

    #[test]
    fn mechanic_dispel_breaks_roots() {
        let mut fx = Fixture::new();
        let roots = fx.spell(
            SpellDefinition::builder(167)
                .mechanic(Mechanic::Root)
                .aura(EffectIndex::Effect0, AuraType::ModRoot, 0, 0)
                .build(),
        );
        let escape = fx.spell(
            SpellDefinition::builder(168)
                .effect(
                    EffectIndex::Effect0,
                    SpellEffectEntry {
                        misc_value: Mechanic::Root as i32,
                        target: ImplicitTarget::Caster,
                        ..SpellEffectEntry::new(SpellEffectKind::DispelMechanic)
                    },
                )
                .build(),
        );
        let druid = fx.creature(1, 0);
        let gnome = fx.player(2, 3);
        fx.engine().cast(CastRequest::new(druid, roots).on(gnome)).expect("cast");
        assert!(fx.world.has_holder_of_spell(gnome, roots));
        fx.engine().cast(CastRequest::new(gnome, escape)).expect("cast");
        assert!(!fx.world.has_holder_of_spell(gnome, roots));
    }
}
