//! Static spell data consumed by the engine.
mod definition;
mod enums;

pub use definition::{
    DurationEntry, LinkedSpell, SpellBuilder, SpellChain, SpellDefinition, SpellEffectEntry,
};
pub use enums::{
    AuraInterruptFlags, DispelType, ImplicitTarget, InterruptFlags, LinkedSpellKind, Mechanic,
    PowerType, PreventionType, ProcExtra, ProcFlags, SchoolMask, SpellAttributes, SpellFamily,
    SpellSchool, Stat,
};
