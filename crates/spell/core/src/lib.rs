//! Deterministic spell and aura rules shared by the runtime and offline tools.
//!
//! `spell-core` resolves casts into one-shot effects and long-lived auras,
//! keeps every unit's holders, stacks, immunities and derived stats in step,
//! and advances periodic auras on `update(diff)`. All state mutation flows
//! through [`engine::SpellEngine`] over a [`world::World`]; static data and
//! rule tables arrive through the oracles in [`env`].
pub mod aura;
pub mod config;
pub mod effect;
pub mod engine;
pub mod env;
pub mod error;
pub mod event;
pub mod holder;
pub mod spell;
pub mod types;
pub mod unit;
pub mod world;

#[cfg(test)]
pub(crate) mod test_utils;

pub use aura::{AreaAuraKind, Aura, AuraState, AuraType, AuraVariant};
pub use config::AuraConfig;
pub use effect::SpellEffectKind;
pub use engine::{
    CastOutcome, CastRequest, CombatFlagHook, DamageInfo, EngineError, ProcEvent, ProcHook,
    SpellEngine, default_hooks,
};
pub use env::{
    ConfigOracle, DefaultPolicy, Env, FixedRng, ItemOracle, ItemTemplate, OracleError, PcgRng,
    PolicyOracle, RngOracle, SpellCatalog, SpellEnv, SpellOracle,
};
pub use error::{ErrorSeverity, GameError};
pub use event::{NotificationSink, SpellEvent, VecSink};
pub use holder::{RemovalMode, SpellAuraHolder};
pub use spell::{
    AuraInterruptFlags, DispelType, DurationEntry, ImplicitTarget, Mechanic, PowerType,
    SchoolMask, SpellAttributes, SpellDefinition, SpellEffectEntry, SpellSchool,
};
pub use types::{DynObjectId, EffectIndex, GroupId, HolderId, ItemId, Position, SpellId, UnitId};
pub use unit::{Faction, Unit, UnitKind};
pub use world::{DynamicObject, SnapshotError, World};
