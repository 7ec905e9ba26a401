//! Registry of everything the engine mutates.
//!
//! [`World`] owns units, the holder arena, ground effects and the event
//! buffer. It is plain data plus read-only queries; every mutation that must
//! keep aura state consistent goes through [`crate::engine::SpellEngine`].

use std::collections::{BTreeMap, BTreeSet};

use crate::aura::{Aura, AuraType};
use crate::env::compute_seed;
use crate::error::{ErrorSeverity, GameError};
use crate::event::{NotificationSink, SpellEvent};
use crate::holder::SpellAuraHolder;
use crate::types::{DynObjectId, EffectIndex, HolderId, Position, SpellId, UnitId};
use crate::unit::Unit;

/// Ground effect spawned by a persistent area aura effect.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DynamicObject {
    pub id: DynObjectId,
    pub caster: UnitId,
    pub spell: SpellId,
    pub effect_index: EffectIndex,
    pub position: Position,
    pub radius: f32,
    /// Remaining ms; the object despawns at zero.
    pub duration_ms: i32,
    /// Units currently holding this object's aura.
    pub affected: BTreeSet<UnitId>,
}

impl DynamicObject {
    pub fn covers(&self, position: &Position) -> bool {
        self.position.within(position, self.radius)
    }
}

#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct World {
    seed: u64,
    clock_ms: u64,
    nonce: u64,
    roll_counter: u64,
    units: BTreeMap<UnitId, Unit>,
    holders: BTreeMap<HolderId, SpellAuraHolder>,
    dyn_objects: BTreeMap<DynObjectId, DynamicObject>,
    /// Single-target holders keyed by caster.
    single_targets: Vec<(UnitId, HolderId)>,
    /// Next ids to hand out. Ids are never reused.
    next_unit_id: u32,
    next_holder_id: u64,
    next_dyn_object_id: u32,
    #[cfg_attr(feature = "serde", serde(skip))]
    events: Vec<SpellEvent>,
}

impl World {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            clock_ms: 0,
            nonce: 0,
            roll_counter: 0,
            units: BTreeMap::new(),
            holders: BTreeMap::new(),
            dyn_objects: BTreeMap::new(),
            single_targets: Vec::new(),
            next_unit_id: 1,
            next_holder_id: 1,
            next_dyn_object_id: 1,
            events: Vec::new(),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Simulation time in ms.
    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    pub(crate) fn advance_clock(&mut self, diff: u32) {
        self.clock_ms += u64::from(diff);
    }

    /// Count of commands and ticks executed so far.
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub(crate) fn bump_nonce(&mut self) {
        self.nonce += 1;
    }

    /// Seed for the next roll made on behalf of `actor`.
    pub fn next_roll_seed(&mut self, actor: UnitId, context: u32) -> u64 {
        self.roll_counter += 1;
        compute_seed(self.seed, self.roll_counter, actor.0, context)
    }

    // ========================================================================
    // Units
    // ========================================================================

    /// Registers a unit under its own id. An existing unit with the same id is replaced.
    pub fn add_unit(&mut self, unit: Unit) -> UnitId {
        let id = unit.id;
        self.next_unit_id = self.next_unit_id.max(id.0.saturating_add(1));
        self.units.insert(id, unit);
        id
    }

    /// Allocates a fresh id and registers the unit `build` produces for it.
    pub fn spawn_unit(&mut self, build: impl FnOnce(UnitId) -> Unit) -> UnitId {
        let id = UnitId(self.next_unit_id);
        self.next_unit_id += 1;
        self.units.insert(id, build(id));
        id
    }

    /// Drops a unit from the registry. Holders it cast stay on their targets
    /// and resolve the caster to nothing from now on.
    pub(crate) fn remove_unit(&mut self, id: UnitId) -> Option<Unit> {
        self.units.remove(&id)
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    pub fn unit_ids(&self) -> Vec<UnitId> {
        self.units.keys().copied().collect()
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Units within `radius` of `center`, in id order.
    pub fn units_within(&self, center: &Position, radius: f32) -> Vec<UnitId> {
        self.units
            .values()
            .filter(|u| u.position.within(center, radius))
            .map(|u| u.id)
            .collect()
    }

    // ========================================================================
    // Holder arena
    // ========================================================================

    pub(crate) fn alloc_holder_id(&mut self) -> HolderId {
        let id = HolderId(self.next_holder_id);
        self.next_holder_id += 1;
        id
    }

    pub(crate) fn insert_holder(&mut self, holder: SpellAuraHolder) {
        self.holders.insert(holder.id, holder);
    }

    pub(crate) fn free_holder(&mut self, id: HolderId) -> Option<SpellAuraHolder> {
        self.holders.remove(&id)
    }

    pub fn holder(&self, id: HolderId) -> Option<&SpellAuraHolder> {
        self.holders.get(&id)
    }

    pub(crate) fn holder_mut(&mut self, id: HolderId) -> Option<&mut SpellAuraHolder> {
        self.holders.get_mut(&id)
    }

    pub(crate) fn aura_mut(&mut self, id: HolderId, index: EffectIndex) -> Option<&mut Aura> {
        self.holders.get_mut(&id).and_then(|h| h.aura_mut(index))
    }

    pub fn aura(&self, id: HolderId, index: EffectIndex) -> Option<&Aura> {
        self.holders.get(&id).and_then(|h| h.aura(index))
    }

    /// Arena size, including deleted holders still pinned by an update pass.
    pub fn holder_count(&self) -> usize {
        self.holders.len()
    }

    /// Snapshot of the holder ids attached to `unit`, in application order.
    pub fn holder_ids(&self, unit: UnitId) -> Vec<HolderId> {
        self.units
            .get(&unit)
            .map(|u| u.holders.clone())
            .unwrap_or_default()
    }

    /// Live holders attached to `unit`.
    pub fn holders_on(&self, unit: UnitId) -> impl Iterator<Item = &SpellAuraHolder> {
        self.units
            .get(&unit)
            .into_iter()
            .flat_map(|u| u.holders.iter())
            .filter_map(|id| self.holders.get(id))
            .filter(|h| h.is_live())
    }

    pub fn find_holder(&self, unit: UnitId, spell: SpellId, caster: UnitId) -> Option<HolderId> {
        self.holders_on(unit)
            .find(|h| h.spell.id == spell && h.caster == caster)
            .map(|h| h.id)
    }

    pub fn has_holder_of_spell(&self, unit: UnitId, spell: SpellId) -> bool {
        self.holders_on(unit).any(|h| h.spell.id == spell)
    }

    // ========================================================================
    // Aura scans
    // ========================================================================

    /// Listed auras of `unit`: applying or active auras of live holders.
    pub fn listed_auras(&self, unit: UnitId) -> impl Iterator<Item = (&SpellAuraHolder, &Aura)> {
        self.holders_on(unit).flat_map(|holder| {
            holder
                .iter_auras()
                .filter(|aura| aura.is_listed())
                .map(move |aura| (holder, aura))
        })
    }

    pub fn auras_of_type(&self, unit: UnitId, ty: AuraType) -> impl Iterator<Item = &Aura> {
        self.listed_auras(unit)
            .map(|(_, aura)| aura)
            .filter(move |aura| aura.aura_type == ty)
    }

    pub fn has_aura_type(&self, unit: UnitId, ty: AuraType) -> bool {
        self.auras_of_type(unit, ty).next().is_some()
    }

    /// Any listed aura of `ty` outside holder `except`.
    pub fn has_aura_type_except(&self, unit: UnitId, ty: AuraType, except: HolderId) -> bool {
        self.auras_of_type(unit, ty).any(|aura| aura.holder != except)
    }

    pub fn total_aura_modifier(&self, unit: UnitId, ty: AuraType) -> i32 {
        self.auras_of_type(unit, ty).map(|aura| aura.amount).sum()
    }

    /// Sum over auras whose misc value intersects `mask`.
    pub fn total_aura_modifier_by_misc_mask(&self, unit: UnitId, ty: AuraType, mask: u32) -> i32 {
        self.auras_of_type(unit, ty)
            .filter(|aura| aura.misc_value as u32 & mask != 0)
            .map(|aura| aura.amount)
            .sum()
    }

    /// Product of `(100 + amount) / 100` over auras whose misc value intersects `mask`.
    pub fn total_aura_multiplier_by_misc_mask(&self, unit: UnitId, ty: AuraType, mask: u32) -> f32 {
        self.auras_of_type(unit, ty)
            .filter(|aura| aura.misc_value as u32 & mask != 0)
            .fold(1.0, |acc, aura| acc * (100.0 + aura.amount as f32) / 100.0)
    }

    pub fn max_positive_aura_modifier(&self, unit: UnitId, ty: AuraType) -> i32 {
        self.auras_of_type(unit, ty)
            .map(|aura| aura.amount)
            .filter(|amount| *amount > 0)
            .max()
            .unwrap_or(0)
    }

    pub fn max_negative_aura_modifier(&self, unit: UnitId, ty: AuraType) -> i32 {
        self.auras_of_type(unit, ty)
            .map(|aura| aura.amount)
            .filter(|amount| *amount < 0)
            .min()
            .unwrap_or(0)
    }

    // ========================================================================
    // Single-target tracking
    // ========================================================================

    pub(crate) fn track_single_target(&mut self, caster: UnitId, holder: HolderId) {
        self.single_targets.push((caster, holder));
    }

    pub(crate) fn untrack_single_target(&mut self, holder: HolderId) {
        self.single_targets.retain(|(_, h)| *h != holder);
    }

    /// Single-target holders `caster` currently maintains.
    pub fn single_target_holders(&self, caster: UnitId) -> Vec<HolderId> {
        self.single_targets
            .iter()
            .filter(|(c, _)| *c == caster)
            .map(|(_, h)| *h)
            .collect()
    }

    // ========================================================================
    // Dynamic objects
    // ========================================================================

    pub(crate) fn insert_dynamic_object(&mut self, mut object: DynamicObject) -> DynObjectId {
        let id = DynObjectId(self.next_dyn_object_id);
        self.next_dyn_object_id += 1;
        object.id = id;
        self.dyn_objects.insert(id, object);
        id
    }

    pub fn dynamic_object(&self, id: DynObjectId) -> Option<&DynamicObject> {
        self.dyn_objects.get(&id)
    }

    pub(crate) fn dynamic_object_mut(&mut self, id: DynObjectId) -> Option<&mut DynamicObject> {
        self.dyn_objects.get_mut(&id)
    }

    pub(crate) fn remove_dynamic_object(&mut self, id: DynObjectId) -> Option<DynamicObject> {
        self.dyn_objects.remove(&id)
    }

    pub fn dynamic_object_ids(&self) -> Vec<DynObjectId> {
        self.dyn_objects.keys().copied().collect()
    }

    /// Object `caster` spawned for `(spell, index)`, if it still exists.
    pub fn find_dynamic_object(&self, caster: UnitId, spell: SpellId, index: EffectIndex) -> Option<DynObjectId> {
        self.dyn_objects
            .values()
            .find(|o| o.caster == caster && o.spell == spell && o.effect_index == index)
            .map(|o| o.id)
    }

    // ========================================================================
    // Events
    // ========================================================================

    pub(crate) fn push_event(&mut self, event: SpellEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[SpellEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<SpellEvent> {
        std::mem::take(&mut self.events)
    }

    /// Forwards buffered events to `sink` in order and clears the buffer.
    pub fn flush_events(&mut self, sink: &mut dyn NotificationSink) {
        for event in self.events.drain(..) {
            sink.notify(&event);
        }
    }
}

/// Errors raised while saving or restoring a world snapshot.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to encode world snapshot: {0}")]
    Encode(String),

    #[error("failed to decode world snapshot: {0}")]
    Decode(String),

    #[error("snapshot references unknown spell {0}")]
    UnknownSpell(SpellId),
}

impl GameError for SnapshotError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Encode(_) => ErrorSeverity::Internal,
            Self::Decode(_) | Self::UnknownSpell(_) => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Encode(_) => "SNAPSHOT_ENCODE",
            Self::Decode(_) => "SNAPSHOT_DECODE",
            Self::UnknownSpell(_) => "SNAPSHOT_UNKNOWN_SPELL",
        }
    }
}

#[cfg(feature = "serde")]
impl World {
    /// Encodes the world (without buffered events) with bincode.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Encode`] if bincode rejects the data.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        bincode::serialize(self).map_err(|e| SnapshotError::Encode(e.to_string()))
    }

    /// Decodes a snapshot and rebinds every holder to the store's canonical
    /// spell definition.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Decode`] for malformed bytes and
    /// [`SnapshotError::UnknownSpell`] when a holder names a spell the store lacks.
    pub fn from_bytes(
        bytes: &[u8],
        spells: &dyn crate::env::SpellOracle,
    ) -> Result<Self, SnapshotError> {
        let mut world: World =
            bincode::deserialize(bytes).map_err(|e| SnapshotError::Decode(e.to_string()))?;
        for holder in world.holders.values_mut() {
            let id = holder.spell.id;
            holder.spell = spells.spell(id).ok_or(SnapshotError::UnknownSpell(id))?;
        }
        Ok(world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::{Faction, UnitKind};

    #[test]
    fn spawned_ids_skip_registered_ones() {
        let mut world = World::new(7);
        world.add_unit(Unit::new(UnitId(5), UnitKind::Player, 1, Faction::Alliance));
        let id = world.spawn_unit(|id| Unit::new(id, UnitKind::Creature, 1, Faction::Hostile));
        assert_eq!(id, UnitId(6));
        assert_eq!(world.unit_count(), 2);
    }

    #[test]
    fn roll_seeds_never_repeat() {
        let mut world = World::new(7);
        let a = world.next_roll_seed(UnitId(1), 0);
        let b = world.next_roll_seed(UnitId(1), 0);
        assert_ne!(a, b);
    }

    #[test]
    fn units_within_radius() {
        let mut world = World::new(0);
        world.add_unit(Unit::new(UnitId(1), UnitKind::Player, 1, Faction::Alliance));
        world.add_unit(
            Unit::new(UnitId(2), UnitKind::Player, 1, Faction::Alliance).at(Position::new(30, 0)),
        );
        assert_eq!(world.units_within(&Position::ORIGIN, 20.0), vec![UnitId(1)]);
    }

    #[test]
    fn flush_drains_in_order() {
        let mut world = World::new(0);
        world.push_event(SpellEvent::Interrupted {
            unit: UnitId(1),
            spell: SpellId(2),
        });
        world.push_event(SpellEvent::UnitDied {
            unit: UnitId(1),
            killer: None,
        });
        let mut sink = crate::event::VecSink::new();
        world.flush_events(&mut sink);
        assert_eq!(sink.events.len(), 2);
        assert!(world.events().is_empty());
    }
}
