//! Cast resolution, aura lifecycle and the periodic tick.
//!
//! The [`SpellEngine`] is the authoritative reducer for a [`World`]. It
//! borrows the world mutably for the duration of one command (a cast, a
//! removal or an `update(diff)`) together with the read-only oracles of a
//! [`SpellEnv`], and runs that command to completion. Nested effects
//! (triggered casts, procs, deaths) run synchronously inside the same
//! command.

mod actor;
mod cast;
mod combat;
mod errors;
mod hook;
mod proc;
mod tick;

pub use cast::{CastOutcome, CastRequest};
pub use combat::{DamageInfo, armor_reduction};
pub use errors::EngineError;
pub use hook::{CombatFlagHook, ProcEvent, ProcHook, default_hooks};

use std::sync::Arc;

use crate::aura::AuraCtx;
use crate::config::AuraConfig;
use crate::env::{ItemOracle, PolicyOracle, RngOracle, SpellEnv, SpellOracle};
use crate::event::SpellEvent;
use crate::spell::SpellDefinition;
use crate::types::{EffectIndex, HolderId, SpellId, UnitId};
use crate::unit::{SpellModOp, Unit};
use crate::world::World;

/// Context tags separating independent rolls made for one actor.
pub(crate) mod roll_ctx {
    pub const DICE: u32 = 1;
    pub const DISPEL_PICK: u32 = 2;
    pub const DISPEL_RESIST: u32 = 3;
    pub const PROC: u32 = 4;
    pub const RESIST: u32 = 5;
    pub const HEARTBEAT: u32 = 6;
    pub const HEARTBEAT_GATE: u32 = 7;
    pub const SPELL_RESIST: u32 = 8;
}

pub struct SpellEngine<'a> {
    pub(crate) world: &'a mut World,
    pub(crate) spells: &'a dyn SpellOracle,
    pub(crate) items: Option<&'a dyn ItemOracle>,
    pub(crate) policy: &'a dyn PolicyOracle,
    pub(crate) config: &'a AuraConfig,
    pub(crate) rng: &'a dyn RngOracle,
    pub(crate) hooks: Arc<[Arc<dyn ProcHook>]>,
    pub(crate) trigger_depth: u32,
}

impl<'a> SpellEngine<'a> {
    /// Binds the engine to `world` and resolves the oracles it needs.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Oracle`] when the spell, policy, config or rng
    /// oracle is missing. The item oracle is optional; item effects without
    /// it report `ItemNotFound`.
    pub fn new(world: &'a mut World, env: SpellEnv<'a>) -> Result<Self, EngineError> {
        Ok(Self {
            world,
            spells: env.spells()?,
            items: env.items().ok(),
            policy: env.policy()?,
            config: env.config()?.aura_config(),
            rng: env.rng()?,
            hooks: default_hooks(),
            trigger_depth: 0,
        })
    }

    /// Replaces the proc hooks; they run in priority order.
    pub fn with_hooks(mut self, mut hooks: Vec<Arc<dyn ProcHook>>) -> Self {
        hooks.sort_by_key(|h| h.priority());
        self.hooks = hooks.into();
        self
    }

    pub fn world(&self) -> &World {
        self.world
    }

    pub fn config(&self) -> &AuraConfig {
        self.config
    }

    // ========================================================================
    // Shared helpers
    // ========================================================================

    pub(crate) fn emit(&mut self, event: SpellEvent) {
        self.world.push_event(event);
    }

    pub(crate) fn roll_chance(&mut self, actor: UnitId, context: u32, chance_pct: u32) -> bool {
        let seed = self.world.next_roll_seed(actor, context);
        self.rng.roll_chance(seed, chance_pct.min(100))
    }

    pub(crate) fn roll_range(&mut self, actor: UnitId, context: u32, min: u32, max: u32) -> u32 {
        let seed = self.world.next_roll_seed(actor, context);
        self.rng.range(seed, min, max)
    }

    /// Store lookup that logs unknown ids instead of failing.
    pub(crate) fn lookup_spell(&self, id: SpellId) -> Option<Arc<SpellDefinition>> {
        let spell = self.spells.spell(id);
        if spell.is_none() {
            tracing::error!(spell = %id, "spell definition missing from store");
        }
        spell
    }

    /// Verifies `spell` is the instance the store hands out for its id.
    pub(crate) fn check_canonical(&self, spell: &Arc<SpellDefinition>) -> Result<(), EngineError> {
        let canonical = self
            .spells
            .spell(spell.id)
            .is_some_and(|stored| Arc::ptr_eq(&stored, spell));
        debug_assert!(canonical, "non-canonical definition for {}", spell.id);
        if canonical {
            Ok(())
        } else {
            Err(EngineError::NonCanonicalSpell(spell.id))
        }
    }

    /// Aura duration of `spell` cast by `caster`: duration row scaled by
    /// caster level, then duration spell modifiers. Index 0 means infinite.
    pub fn spell_duration(&self, spell: &SpellDefinition, caster: Option<&Unit>) -> i32 {
        if spell.duration_index == 0 {
            return -1;
        }
        let Some(entry) = self.spells.duration(spell.duration_index) else {
            tracing::warn!(spell = %spell.id, index = spell.duration_index, "unknown duration index");
            return -1;
        };
        let level = caster.map_or(spell.spell_level, |c| c.level);
        let duration = entry.for_level(level, spell.spell_level);
        match caster {
            Some(caster) if duration > 0 => caster
                .spell_mods
                .apply_i32(spell, SpellModOp::Duration, duration)
                .max(0),
            _ => duration,
        }
    }

    /// Per-stack amount of effect `index`: base points, level scaling, dice
    /// and effect spell modifiers of the caster.
    pub(crate) fn calculate_amount(
        &mut self,
        spell: &SpellDefinition,
        index: EffectIndex,
        caster: UnitId,
        base_override: Option<i32>,
    ) -> i32 {
        let effect = spell.effect(index);
        let mut value = base_override.unwrap_or(effect.base_points);
        let level = self.world.unit(caster).map_or(spell.base_level, |c| c.level);
        if effect.points_per_level != 0 {
            let capped = if spell.max_level > 0 {
                level.min(spell.max_level)
            } else {
                level
            };
            let levels = capped.saturating_sub(spell.base_level) as i32;
            value += effect.points_per_level * levels;
        }
        if base_override.is_none() && effect.die_sides > 0 {
            value += self.roll_range(caster, roll_ctx::DICE, 0, (effect.die_sides - 1) as u32) as i32;
        }
        let op = match index {
            EffectIndex::Effect0 => SpellModOp::Effect1,
            EffectIndex::Effect1 => SpellModOp::Effect2,
            EffectIndex::Effect2 => SpellModOp::Effect3,
        };
        if let Some(unit) = self.world.unit(caster) {
            value = unit.spell_mods.apply_i32(spell, SpellModOp::AllEffects, value);
            value = unit.spell_mods.apply_i32(spell, op, value);
        }
        value
    }

    /// Snapshot of aura `index` of `holder` for a handler call.
    pub(crate) fn aura_ctx(&self, holder: HolderId, index: EffectIndex) -> Option<AuraCtx> {
        let h = self.world.holder(holder)?;
        let aura = h.aura(index)?;
        Some(AuraCtx {
            holder,
            index,
            spell: Arc::clone(&h.spell),
            aura_type: aura.aura_type,
            amount: aura.amount,
            misc_value: aura.misc_value,
            misc_value_b: aura.misc_value_b,
            target: h.target,
            caster: h.caster,
            positive: aura.is_positive,
            stack: h.stack_amount,
            period: aura.period,
            base_amount: aura.stack_scaled_base,
        })
    }

    /// Whether the unit exists and is alive.
    pub(crate) fn is_alive(&self, unit: UnitId) -> bool {
        self.world.unit(unit).is_some_and(Unit::is_alive)
    }

    /// Runs `f` on a unit if it is still registered.
    pub(crate) fn with_unit<R>(&mut self, unit: UnitId, f: impl FnOnce(&mut Unit) -> R) -> Option<R> {
        self.world.unit_mut(unit).map(f)
    }

    /// Ends the current command: bumps the world nonce.
    pub(crate) fn finish_command(&mut self) {
        self.world.bump_nonce();
    }
}
