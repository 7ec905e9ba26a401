//! Owned read models handed out of the simulation worker.

use serde::{Deserialize, Serialize};

use spell_core::{HolderId, SpellAuraHolder, SpellId, UnitId};

/// Snapshot of one aura holder as observers see it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderView {
    pub id: HolderId,
    pub spell: SpellId,
    pub caster: UnitId,
    pub target: UnitId,
    pub stack_amount: u32,
    pub proc_charges: u32,
    /// Remaining ms; `-1` for infinite.
    pub duration: i32,
    pub max_duration: i32,
    pub visible_slot: Option<u8>,
    pub positive: bool,
}

impl From<&SpellAuraHolder> for HolderView {
    fn from(holder: &SpellAuraHolder) -> Self {
        Self {
            id: holder.id,
            spell: holder.spell_id(),
            caster: holder.caster,
            target: holder.target,
            stack_amount: holder.stack_amount,
            proc_charges: holder.proc_charges,
            duration: holder.duration,
            max_duration: holder.max_duration,
            visible_slot: holder.visible_slot,
            positive: holder.positive,
        }
    }
}
