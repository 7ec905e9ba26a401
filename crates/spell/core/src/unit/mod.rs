//! Units (players, creatures, pets, totems) and the state auras act on.
//!
//! A [`Unit`] is plain data. Every mutation that has to stay consistent with
//! aura state (flag re-scans, stat recompute, slot bookkeeping) goes through
//! [`crate::engine::SpellEngine`]; the helpers here only keep the unit's own
//! derived values (max health, max power) in step with its stat table.

pub mod cast;
pub mod diminishing;
pub mod flags;
pub mod immunity;
pub mod inventory;
pub mod spell_mod;
pub mod stats;
pub mod threat;

use std::collections::{BTreeMap, BTreeSet};

use arrayvec::ArrayVec;

pub use cast::CurrentCast;
pub use diminishing::{
    DiminishingEntry, DiminishingGroup, DiminishingLevel, DiminishingReturns, DiminishingScope,
};
pub use flags::{
    AuraStateFlags, DynamicFlags, MovementFlags, PlayerFlags, UnitFlags, UnitState, Visibility,
};
pub use immunity::{ImmunityEntry, ImmunityKind, SpellImmunities};
pub use inventory::{EquipSlot, EquippedItem, Inventory, InventoryResult, ItemStack};
pub use spell_mod::{SpellModKind, SpellModOp, SpellModifier, SpellModifiers};
pub use stats::{CombatRatings, ModifierType, UnitMod, UnitStats, apply_percent_mod};
pub use threat::{ThreatEntry, ThreatManager};

use crate::config::AuraConfig;
use crate::spell::{PowerType, SpellSchool, Stat};
use crate::types::{GroupId, HolderId, Position, SpellId, UnitId};

/// Broad classification of a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum UnitKind {
    Player,
    Creature,
    Pet,
    Totem,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeathState {
    #[default]
    Alive,
    JustDied,
    Corpse,
}

/// Creature family, used by creature-type filtered effects.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString,
    strum::FromRepr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[repr(u8)]
pub enum CreatureType {
    Beast = 1,
    Dragonkin = 2,
    Demon = 3,
    Elemental = 4,
    Giant = 5,
    Undead = 6,
    #[default]
    Humanoid = 7,
    Critter = 8,
    Mechanical = 9,
}

impl CreatureType {
    /// Bit inside a creature-type mask (misc value of creature-filtered auras).
    pub const fn mask_bit(self) -> u32 {
        1 << (self as u32 - 1)
    }
}

/// Allegiance deciding hostility between units.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Faction {
    Alliance,
    Horde,
    /// Attacks every player faction.
    Hostile,
    #[default]
    Neutral,
    /// Friendly to every player faction.
    Friendly,
}

impl Faction {
    pub fn is_hostile_to(&self, other: &Faction) -> bool {
        use Faction::*;
        matches!(
            (self, other),
            (Alliance, Horde)
                | (Horde, Alliance)
                | (Hostile, Alliance)
                | (Hostile, Horde)
                | (Hostile, Friendly)
                | (Alliance, Hostile)
                | (Horde, Hostile)
                | (Friendly, Hostile)
        )
    }

    pub fn is_friendly_to(&self, other: &Faction) -> bool {
        use Faction::*;
        self == other
            || matches!(
                (self, other),
                (Friendly, Alliance) | (Friendly, Horde) | (Alliance, Friendly) | (Horde, Friendly)
            )
    }
}

/// Shapeshift forms. Values match the misc value of shapeshift auras.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::FromRepr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ShapeshiftForm {
    #[default]
    None = 0,
    Cat = 1,
    Tree = 2,
    Travel = 3,
    Aqua = 4,
    Bear = 5,
    Ambient = 6,
    Ghoul = 7,
    DireBear = 8,
    CreatureBear = 14,
    CreatureCat = 15,
    GhostWolf = 16,
    BattleStance = 17,
    DefensiveStance = 18,
    BerserkerStance = 19,
    Shadow = 28,
    Stealth = 30,
    Moonkin = 31,
    SpiritOfRedemption = 32,
}

impl ShapeshiftForm {
    pub fn from_misc(misc: i32) -> Self {
        u8::try_from(misc)
            .ok()
            .and_then(Self::from_repr)
            .unwrap_or_default()
    }

    /// Bit in a spell's stance mask.
    pub const fn stance_bit(self) -> u32 {
        match self {
            Self::None => 0,
            other => 1 << (other as u32 - 1),
        }
    }

    /// Power type a form switches to, if any.
    pub const fn power_type(self) -> Option<PowerType> {
        match self {
            Self::Cat | Self::CreatureCat | Self::Stealth => Some(PowerType::Energy),
            Self::Bear | Self::DireBear | Self::CreatureBear => Some(PowerType::Rage),
            Self::BattleStance | Self::DefensiveStance | Self::BerserkerStance => {
                Some(PowerType::Rage)
            }
            _ => None,
        }
    }
}

/// Movement speed channels scaled by speed auras.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MoveType {
    Walk,
    Run,
    RunBack,
    Swim,
    SwimBack,
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpeedRates {
    pub walk: f32,
    pub run: f32,
    pub run_back: f32,
    pub swim: f32,
    pub swim_back: f32,
}

impl Default for SpeedRates {
    fn default() -> Self {
        Self {
            walk: 1.0,
            run: 1.0,
            run_back: 1.0,
            swim: 1.0,
            swim_back: 1.0,
        }
    }
}

impl SpeedRates {
    pub fn get(&self, mt: MoveType) -> f32 {
        match mt {
            MoveType::Walk => self.walk,
            MoveType::Run => self.run,
            MoveType::RunBack => self.run_back,
            MoveType::Swim => self.swim,
            MoveType::SwimBack => self.swim_back,
        }
    }

    pub fn set(&mut self, mt: MoveType, rate: f32) {
        let slot = match mt {
            MoveType::Walk => &mut self.walk,
            MoveType::Run => &mut self.run,
            MoveType::RunBack => &mut self.run_back,
            MoveType::Swim => &mut self.swim,
            MoveType::SwimBack => &mut self.swim_back,
        };
        *slot = rate;
    }
}

/// Min/max damage of a weapon slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WeaponRange {
    pub min: u32,
    pub max: u32,
}

/// Which weapon an attack uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WeaponAttack {
    Base,
    OffHand,
    Ranged,
}

impl WeaponAttack {
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Data visible to observers for one occupied aura slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AuraSlot {
    pub spell: SpellId,
    pub holder: HolderId,
    /// Bit per effect index holding an aura, plus the positive bit.
    pub flags: u8,
    pub level: u8,
    /// Application count minus one, capped at 254.
    pub applications: u8,
}

impl AuraSlot {
    pub const FLAG_POSITIVE: u8 = 0x08;
}

/// Pending resurrection offer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResurrectRequest {
    pub caster: UnitId,
    pub health: u32,
    pub mana: u32,
}

/// One simulated unit.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
    pub kind: UnitKind,
    pub creature_type: CreatureType,
    pub level: u32,
    pub faction: Faction,
    /// Faction before charm or forced reactions changed it.
    pub native_faction: Faction,
    pub position: Position,
    pub death_state: DeathState,
    /// Removed from area searches (taxi, cinematic, phased out).
    pub isolated: bool,

    // === Resources ===
    health: u32,
    max_health: u32,
    powers: [u32; AuraConfig::MAX_POWERS],
    max_powers: [u32; AuraConfig::MAX_POWERS],
    pub power_type: PowerType,
    pub base_power_type: PowerType,
    pub stats: UnitStats,

    // === Flags ===
    pub flags: UnitFlags,
    pub state: UnitState,
    pub aura_state: AuraStateFlags,
    pub movement: MovementFlags,
    pub player_flags: PlayerFlags,
    pub dynamic_flags: DynamicFlags,
    pub visibility: Visibility,
    pub stealth_level: i32,
    pub stealth_detect: i32,
    pub invisibility_mask: u32,
    pub invisibility_detect_mask: u32,
    pub speed: SpeedRates,

    // === Auras ===
    /// Attached holders in insertion order.
    pub holders: Vec<HolderId>,
    pub visible_slots: ArrayVec<Option<AuraSlot>, { AuraConfig::MAX_VISIBLE_SLOTS }>,
    pub immunities: SpellImmunities,
    pub diminishing: DiminishingReturns,
    pub spell_mods: SpellModifiers,
    pub threat: ThreatManager,
    pub current_cast: Option<CurrentCast>,

    // === Shape ===
    pub form: ShapeshiftForm,
    pub display_id: u32,
    pub native_display_id: u32,
    pub transform_spell: Option<SpellId>,
    pub mount_display: Option<u32>,

    // === Combat ===
    pub weapons: [WeaponRange; 3],
    pub combo_points: u8,
    pub combo_target: Option<UnitId>,
    pub extra_attacks: u32,
    pub victim: Option<UnitId>,
    pub selection: Option<UnitId>,
    /// Remaining lockout in ms per spell school.
    pub school_lockout_ms: [u32; AuraConfig::MAX_SCHOOLS],
    pub drunk: u8,

    // === Relations ===
    pub group: Option<GroupId>,
    pub owner: Option<UnitId>,
    pub pet: Option<UnitId>,
    pub totems: [Option<UnitId>; 4],
    pub charmer: Option<UnitId>,
    pub charm: Option<UnitId>,
    pub farsight: Option<UnitId>,
    pub forced_reactions: BTreeMap<u32, u32>,

    // === Progression ===
    pub home: Option<Position>,
    pub resurrect_request: Option<ResurrectRequest>,
    pub known_spells: BTreeSet<SpellId>,
    /// Skill id to (value, max).
    pub skills: BTreeMap<u32, (u32, u32)>,
    pub honor: u32,
    pub reputation: BTreeMap<u32, i32>,
    pub completed_quests: BTreeSet<u32>,
    pub inventory: Inventory,
    pub skinnable: bool,
    pub pickpocketed: bool,
}

impl Unit {
    pub fn new(id: UnitId, kind: UnitKind, level: u32, faction: Faction) -> Self {
        let mut unit = Self {
            id,
            name: format!("unit {}", id.0),
            kind,
            creature_type: CreatureType::default(),
            level: level.max(1),
            faction,
            native_faction: faction,
            position: Position::ORIGIN,
            death_state: DeathState::Alive,
            isolated: false,
            health: 0,
            max_health: 0,
            powers: [0; AuraConfig::MAX_POWERS],
            max_powers: [0; AuraConfig::MAX_POWERS],
            power_type: PowerType::Mana,
            base_power_type: PowerType::Mana,
            stats: UnitStats::new(),
            flags: UnitFlags::empty(),
            state: UnitState::empty(),
            aura_state: AuraStateFlags::empty(),
            movement: MovementFlags::empty(),
            player_flags: PlayerFlags::empty(),
            dynamic_flags: DynamicFlags::empty(),
            visibility: Visibility::Visible,
            stealth_level: 0,
            stealth_detect: 0,
            invisibility_mask: 0,
            invisibility_detect_mask: 0,
            speed: SpeedRates::default(),
            holders: Vec::new(),
            visible_slots: std::iter::repeat_n(None, AuraConfig::MAX_VISIBLE_SLOTS).collect(),
            immunities: SpellImmunities::default(),
            diminishing: DiminishingReturns::default(),
            spell_mods: SpellModifiers::default(),
            threat: ThreatManager::default(),
            current_cast: None,
            form: ShapeshiftForm::None,
            display_id: 0,
            native_display_id: 0,
            transform_spell: None,
            mount_display: None,
            weapons: [WeaponRange::default(); 3],
            combo_points: 0,
            combo_target: None,
            extra_attacks: 0,
            victim: None,
            selection: None,
            school_lockout_ms: [0; AuraConfig::MAX_SCHOOLS],
            drunk: 0,
            group: None,
            owner: None,
            pet: None,
            totems: [None; 4],
            charmer: None,
            charm: None,
            farsight: None,
            forced_reactions: BTreeMap::new(),
            home: None,
            resurrect_request: None,
            known_spells: BTreeSet::new(),
            skills: BTreeMap::new(),
            honor: 0,
            reputation: BTreeMap::new(),
            completed_quests: BTreeSet::new(),
            inventory: Inventory::default(),
            skinnable: false,
            pickpocketed: false,
        };
        if kind == UnitKind::Player {
            unit.player_flags |= PlayerFlags::CAN_PARRY | PlayerFlags::CAN_BLOCK;
        }
        unit
    }

    // ========================================================================
    // Builder helpers
    // ========================================================================

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets base health and fills the unit to full.
    pub fn with_health(mut self, base: u32) -> Self {
        self.stats.set_base(UnitMod::Health, base as f32);
        self.update_max_health();
        self.health = self.max_health;
        self
    }

    /// Sets the unit's primary power and its base maximum, filled to full.
    pub fn with_power(mut self, power: PowerType, base_max: u32) -> Self {
        self.power_type = power;
        self.base_power_type = power;
        self.stats.set_base(UnitMod::power(power), base_max as f32);
        self.update_max_power(power);
        if let Some(i) = power.index() {
            self.powers[i] = self.max_powers[i];
        }
        self
    }

    pub fn with_stat(mut self, stat: Stat, value: u32) -> Self {
        self.stats.set_base(UnitMod::stat(stat), value as f32);
        self.update_stat_dependents(stat);
        self
    }

    pub fn with_resistance(mut self, school: SpellSchool, value: u32) -> Self {
        self.stats.set_base(UnitMod::resistance(school), value as f32);
        self
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn in_group(mut self, group: GroupId) -> Self {
        self.group = Some(group);
        self
    }

    pub fn with_creature_type(mut self, creature_type: CreatureType) -> Self {
        self.creature_type = creature_type;
        self
    }

    pub fn with_weapon(mut self, attack: WeaponAttack, min: u32, max: u32) -> Self {
        self.weapons[attack.index()] = WeaponRange { min, max };
        self
    }

    pub fn with_display(mut self, display_id: u32) -> Self {
        self.display_id = display_id;
        self.native_display_id = display_id;
        self
    }

    // ========================================================================
    // Classification
    // ========================================================================

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.death_state == DeathState::Alive
    }

    #[inline]
    pub fn is_player(&self) -> bool {
        self.kind == UnitKind::Player
    }

    #[inline]
    pub fn is_totem(&self) -> bool {
        self.kind == UnitKind::Totem
    }

    /// Only non-player units keep a threat list.
    pub fn can_have_threat_list(&self) -> bool {
        matches!(self.kind, UnitKind::Creature | UnitKind::Pet) && self.charmer.is_none()
    }

    pub fn is_in_combat(&self) -> bool {
        self.flags.contains(UnitFlags::IN_COMBAT)
    }

    pub fn is_hostile_to(&self, other: &Unit) -> bool {
        self.faction.is_hostile_to(&other.faction)
    }

    pub fn is_friendly_to(&self, other: &Unit) -> bool {
        self.id == other.id || self.faction.is_friendly_to(&other.faction)
    }

    pub fn is_in_party_with(&self, other: &Unit) -> bool {
        self.id == other.id || (self.group.is_some() && self.group == other.group)
    }

    pub fn distance_to(&self, other: &Unit) -> f32 {
        self.position.distance(&other.position)
    }

    /// Owner for players and totems, charmer for charmed units, else the unit itself.
    pub fn charmer_or_owner(&self) -> Option<UnitId> {
        self.charmer.or(self.owner)
    }

    pub fn has_state(&self, state: UnitState) -> bool {
        self.state.intersects(state)
    }

    // ========================================================================
    // Health
    // ========================================================================

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn max_health(&self) -> u32 {
        self.max_health
    }

    pub fn health_pct(&self) -> f32 {
        if self.max_health == 0 {
            return 0.0;
        }
        self.health as f32 * 100.0 / self.max_health as f32
    }

    pub fn set_health(&mut self, value: u32) {
        self.health = value.min(self.max_health);
    }

    /// Adds `delta` to health, clamped to `[0, max]`. Returns the applied change.
    pub fn modify_health(&mut self, delta: i32) -> i32 {
        let before = self.health as i64;
        let after = (before + delta as i64).clamp(0, self.max_health as i64);
        self.health = after as u32;
        (after - before) as i32
    }

    /// Recomputes max health from the stat table and clamps current health.
    ///
    /// Players gain one health for each of the first 20 stamina and ten for
    /// every point above.
    pub fn update_max_health(&mut self) {
        let stamina_bonus = if self.is_player() {
            let sta = self.stats.stat(Stat::Stamina).max(0.0);
            let base = sta.min(20.0);
            base + (sta - base) * 10.0
        } else {
            0.0
        };
        let m = UnitMod::Health;
        let value = ((self.stats.base(m) + self.stats.modifier(m, ModifierType::BaseValue))
            * self.stats.modifier(m, ModifierType::BasePct)
            + self.stats.modifier(m, ModifierType::TotalValue)
            + stamina_bonus)
            * self.stats.modifier(m, ModifierType::TotalPct);
        self.max_health = value.max(1.0) as u32;
        if self.health > self.max_health {
            self.health = self.max_health;
        }
    }

    // ========================================================================
    // Power
    // ========================================================================

    pub fn power(&self, power: PowerType) -> u32 {
        match power.index() {
            Some(i) => self.powers[i],
            None => self.health,
        }
    }

    pub fn max_power(&self, power: PowerType) -> u32 {
        match power.index() {
            Some(i) => self.max_powers[i],
            None => self.max_health,
        }
    }

    pub fn set_power(&mut self, power: PowerType, value: u32) {
        match power.index() {
            Some(i) => self.powers[i] = value.min(self.max_powers[i]),
            None => self.set_health(value),
        }
    }

    /// Adds `delta` to a power, clamped to `[0, max]`. Returns the applied change.
    pub fn modify_power(&mut self, power: PowerType, delta: i32) -> i32 {
        let Some(i) = power.index() else {
            return self.modify_health(delta);
        };
        let before = self.powers[i] as i64;
        let after = (before + delta as i64).clamp(0, self.max_powers[i] as i64);
        self.powers[i] = after as u32;
        (after - before) as i32
    }

    /// Recomputes one max power; players gain fifteen mana per intellect above twenty.
    pub fn update_max_power(&mut self, power: PowerType) {
        let Some(i) = power.index() else {
            self.update_max_health();
            return;
        };
        let int_bonus = if self.is_player() && power == PowerType::Mana {
            let int = self.stats.stat(Stat::Intellect).max(0.0);
            let base = int.min(20.0);
            base + (int - base) * 15.0
        } else {
            0.0
        };
        let m = UnitMod::power(power);
        if self.stats.base(m) <= 0.0 && int_bonus <= 0.0 {
            self.max_powers[i] = 0;
            self.powers[i] = 0;
            return;
        }
        let value = ((self.stats.base(m) + self.stats.modifier(m, ModifierType::BaseValue))
            * self.stats.modifier(m, ModifierType::BasePct)
            + self.stats.modifier(m, ModifierType::TotalValue)
            + int_bonus)
            * self.stats.modifier(m, ModifierType::TotalPct);
        self.max_powers[i] = value.max(0.0) as u32;
        if self.powers[i] > self.max_powers[i] {
            self.powers[i] = self.max_powers[i];
        }
    }

    /// Refreshes values derived from a primary stat.
    pub fn update_stat_dependents(&mut self, stat: Stat) {
        match stat {
            Stat::Stamina => self.update_max_health(),
            Stat::Intellect => self.update_max_power(PowerType::Mana),
            Stat::Strength | Stat::Agility | Stat::Spirit => {}
        }
    }

    pub fn update_all_stats(&mut self) {
        self.update_max_health();
        for power in [
            PowerType::Mana,
            PowerType::Rage,
            PowerType::Focus,
            PowerType::Energy,
            PowerType::Happiness,
        ] {
            self.update_max_power(power);
        }
    }

    // ========================================================================
    // Slots
    // ========================================================================

    pub fn visible_slot(&self, slot: u8) -> Option<&AuraSlot> {
        self.visible_slots.get(slot as usize).and_then(Option::as_ref)
    }

    /// First free slot in `range`.
    pub fn free_slot(&self, range: std::ops::Range<usize>) -> Option<u8> {
        range
            .into_iter()
            .find(|&i| self.visible_slots.get(i).is_some_and(Option::is_none))
            .map(|i| i as u8)
    }

    pub fn is_school_locked(&self, school: SpellSchool) -> bool {
        self.school_lockout_ms[school.index()] > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_health_includes_stamina_bonus() {
        let unit = Unit::new(UnitId(1), UnitKind::Player, 10, Faction::Alliance)
            .with_stat(Stat::Stamina, 30)
            .with_health(100);
        // 20 + 10 × 10 = 120 on top of the base
        assert_eq!(unit.max_health(), 220);
        assert_eq!(unit.health(), 220);
    }

    #[test]
    fn creature_has_no_stamina_bonus() {
        let unit = Unit::new(UnitId(2), UnitKind::Creature, 10, Faction::Hostile)
            .with_stat(Stat::Stamina, 30)
            .with_health(100);
        assert_eq!(unit.max_health(), 100);
    }

    #[test]
    fn health_modification_clamps() {
        let mut unit = Unit::new(UnitId(1), UnitKind::Creature, 1, Faction::Hostile).with_health(50);
        assert_eq!(unit.modify_health(-80), -50);
        assert_eq!(unit.health(), 0);
        assert_eq!(unit.modify_health(500), 50);
    }

    #[test]
    fn lowering_max_power_clamps_current() {
        let mut unit = Unit::new(UnitId(1), UnitKind::Creature, 1, Faction::Hostile)
            .with_power(PowerType::Mana, 100);
        unit.stats
            .handle_modifier(UnitMod::Mana, ModifierType::TotalValue, -40.0, true);
        unit.update_max_power(PowerType::Mana);
        assert_eq!(unit.max_power(PowerType::Mana), 60);
        assert_eq!(unit.power(PowerType::Mana), 60);
    }

    #[test]
    fn faction_relations() {
        assert!(Faction::Alliance.is_hostile_to(&Faction::Horde));
        assert!(Faction::Hostile.is_hostile_to(&Faction::Alliance));
        assert!(!Faction::Neutral.is_hostile_to(&Faction::Alliance));
        assert!(Faction::Friendly.is_friendly_to(&Faction::Horde));
    }

    #[test]
    fn visible_slots_start_empty() {
        let unit = Unit::new(UnitId(1), UnitKind::Player, 1, Faction::Alliance);
        assert_eq!(unit.visible_slots.len(), AuraConfig::MAX_VISIBLE_SLOTS);
        assert_eq!(unit.free_slot(0..32), Some(0));
        assert_eq!(unit.free_slot(32..48), Some(32));
    }
}
