//! Enumerations and flag sets carried by static spell definitions.
use bitflags::bitflags;

/// Spell school of a single damage component.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::FromRepr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[repr(u8)]
pub enum SpellSchool {
    #[default]
    Normal = 0,
    Holy = 1,
    Fire = 2,
    Nature = 3,
    Frost = 4,
    Shadow = 5,
    Arcane = 6,
}

impl SpellSchool {
    pub const fn mask(self) -> SchoolMask {
        SchoolMask::from_bits_truncate(1 << (self as u8))
    }

    pub const fn index(self) -> usize {
        self as usize
    }
}

bitflags! {
    /// Set of spell schools. Misc values of school-filtered auras use the same layout.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct SchoolMask: u32 {
        const NORMAL = 1 << 0;
        const HOLY   = 1 << 1;
        const FIRE   = 1 << 2;
        const NATURE = 1 << 3;
        const FROST  = 1 << 4;
        const SHADOW = 1 << 5;
        const ARCANE = 1 << 6;

        const SPELL = Self::HOLY.bits() | Self::FIRE.bits() | Self::NATURE.bits()
            | Self::FROST.bits() | Self::SHADOW.bits() | Self::ARCANE.bits();
        const MAGIC = Self::SPELL.bits();
        const ALL = Self::NORMAL.bits() | Self::SPELL.bits();
    }
}

impl SchoolMask {
    /// Builds a mask from an aura misc value, ignoring unknown bits.
    pub const fn from_misc(misc: i32) -> Self {
        Self::from_bits_truncate(misc as u32)
    }

    /// Lowest school present in the mask; used when one school must be picked.
    pub fn first_school(self) -> SpellSchool {
        (0..7u8)
            .find(|bit| self.bits() & (1 << bit) != 0)
            .and_then(SpellSchool::from_repr)
            .unwrap_or_default()
    }

    pub fn schools(self) -> impl Iterator<Item = SpellSchool> {
        (0..7u8)
            .filter(move |bit| self.bits() & (1 << bit) != 0)
            .filter_map(SpellSchool::from_repr)
    }
}

/// Crowd-control and damage mechanic classification.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::FromRepr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Mechanic {
    #[default]
    None = 0,
    Charm = 1,
    Disoriented = 2,
    Disarm = 3,
    Distract = 4,
    Fear = 5,
    Fumble = 6,
    Root = 7,
    Pacify = 8,
    Silence = 9,
    Sleep = 10,
    Snare = 11,
    Stun = 12,
    Freeze = 13,
    Knockout = 14,
    Bleed = 15,
    Bandage = 16,
    Polymorph = 17,
    Banish = 18,
    Shield = 19,
    Shackle = 20,
    Mount = 21,
    Persuade = 22,
    Turn = 23,
    Horror = 24,
    Invulnerability = 25,
    Interrupt = 26,
    Daze = 27,
    Discovery = 28,
    ImmuneShield = 29,
    Sapped = 30,
}

impl Mechanic {
    /// Bit of this mechanic inside a mechanic mask; `None` has no bit.
    pub const fn mask_bit(self) -> u32 {
        match self {
            Self::None => 0,
            other => 1 << (other as u32 - 1),
        }
    }

    pub fn from_misc(misc: i32) -> Self {
        u8::try_from(misc)
            .ok()
            .and_then(Self::from_repr)
            .unwrap_or_default()
    }
}

/// Dispel category of a spell.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::FromRepr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum DispelType {
    #[default]
    None = 0,
    Magic = 1,
    Curse = 2,
    Disease = 3,
    Poison = 4,
    Stealth = 5,
    Invisibility = 6,
    All = 7,
    SpeNpcOnly = 8,
    Enrage = 9,
}

impl DispelType {
    /// Dispel categories covered by this one; `All` expands to every real category.
    pub const fn mask(self) -> u32 {
        match self {
            Self::All => (1 << 1) | (1 << 2) | (1 << 3) | (1 << 4),
            other => 1 << (other as u32),
        }
    }

    pub fn from_misc(misc: i32) -> Self {
        u8::try_from(misc)
            .ok()
            .and_then(Self::from_repr)
            .unwrap_or_default()
    }
}

/// Power kinds. `Health` is only used by spells that consume health.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::FromRepr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[repr(i8)]
pub enum PowerType {
    Health = -2,
    #[default]
    Mana = 0,
    Rage = 1,
    Focus = 2,
    Energy = 3,
    Happiness = 4,
}

impl PowerType {
    /// Index into a unit's power arrays; `None` for health.
    pub const fn index(self) -> Option<usize> {
        match self {
            Self::Health => None,
            other => Some(other as i8 as usize),
        }
    }

    /// Interprets an effect misc value as a power kind.
    pub fn from_misc(misc: i32) -> Option<Self> {
        i8::try_from(misc).ok().and_then(Self::from_repr)
    }
}

/// Primary stat selector used by stat auras (`-1` in misc selects all).
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::FromRepr, strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Stat {
    Strength = 0,
    Agility = 1,
    Stamina = 2,
    Intellect = 3,
    Spirit = 4,
}

bitflags! {
    /// Cast-level attribute flags of a spell.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct SpellAttributes: u32 {
        const PASSIVE            = 1 << 0;
        const CHANNELED          = 1 << 1;
        const DEATH_PERSISTENT   = 1 << 2;
        const CAN_TARGET_DEAD    = 1 << 3;
        const HEARTBEAT_RESIST   = 1 << 4;
        const NEGATIVE           = 1 << 5;
        const NOT_SHAPESHIFT     = 1 << 6;
        const CASTABLE_WHILE_SHAPESHIFTED = 1 << 7;
        const SINGLE_TARGET      = 1 << 8;
        const IGNORE_IMMUNITY    = 1 << 9;
        const CANT_BE_DISPELLED  = 1 << 10;
        const UNAFFECTED_BY_INVULNERABILITY = 1 << 11;
        const HIDDEN_CLIENTSIDE  = 1 << 12;
        const NO_THREAT          = 1 << 13;
        const SEAL               = 1 << 14;
        const TOTEM              = 1 << 15;
    }
}

bitflags! {
    /// Conditions that remove an aura holder (movement, damage, entering combat...).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct AuraInterruptFlags: u32 {
        const HITBYSPELL  = 1 << 0;
        const DAMAGE      = 1 << 1;
        const CAST        = 1 << 2;
        const MOVE        = 1 << 3;
        const TURNING     = 1 << 4;
        const ENTER_COMBAT = 1 << 5;
        const NOT_MOUNTED = 1 << 6;
        const NOT_ABOVEWATER = 1 << 7;
        const NOT_UNDERWATER = 1 << 8;
        const NOT_SHEATHED = 1 << 9;
        const TALK        = 1 << 10;
        const USE         = 1 << 11;
        const MELEE_ATTACK = 1 << 12;
        const SPELL_ATTACK = 1 << 13;
        const UNK14       = 1 << 14;
        const TRANSFORM   = 1 << 15;
        const UNK16       = 1 << 16;
        const MOUNTING    = 1 << 17;
        const NOT_SEATED  = 1 << 18;
        const CHANGE_MAP  = 1 << 19;
        const IMMUNE_OR_LOST_SELECTION = 1 << 20;
    }
}

bitflags! {
    /// Conditions that interrupt a spell while it is being cast.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct InterruptFlags: u32 {
        const MOVEMENT  = 1 << 0;
        const DAMAGE    = 1 << 1;
        const INTERRUPT = 1 << 3;
        const AUTOATTACK = 1 << 4;
    }
}

bitflags! {
    /// Event classes that may trigger reactive (proc) auras.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct ProcFlags: u32 {
        const KILLED                 = 1 << 0;
        const KILL                   = 1 << 1;
        const SUCCESSFUL_MELEE_HIT   = 1 << 2;
        const TAKEN_MELEE_HIT        = 1 << 3;
        const SUCCESSFUL_SPELL_HIT   = 1 << 4;
        const TAKEN_SPELL_HIT        = 1 << 5;
        const SUCCESSFUL_POSITIVE_SPELL = 1 << 6;
        const TAKEN_POSITIVE_SPELL   = 1 << 7;
        const SUCCESSFUL_NEGATIVE_SPELL_HIT = 1 << 8;
        const TAKEN_NEGATIVE_SPELL_HIT = 1 << 9;
        const ON_DO_PERIODIC         = 1 << 10;
        const ON_TAKE_PERIODIC       = 1 << 11;
        const TAKEN_ANY_DAMAGE       = 1 << 12;
        const ON_TRAP_ACTIVATION     = 1 << 13;
    }
}

bitflags! {
    /// Extra qualifiers reported alongside a proc event.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct ProcExtra: u32 {
        const NORMAL_HIT   = 1 << 0;
        const CRITICAL_HIT = 1 << 1;
        const MISS         = 1 << 2;
        const RESIST       = 1 << 3;
        const IMMUNE       = 1 << 4;
        const ABSORB       = 1 << 5;
        const INTERNAL_HOT = 1 << 6;
        const INTERNAL_DOT = 1 << 7;
    }
}

/// What a spell is prevented by while the caster is under control effects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PreventionType {
    #[default]
    None,
    Silence,
    Pacify,
}

/// Class family used by family-scoped behaviour (spell modifiers, seals).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpellFamily {
    #[default]
    Generic,
    Mage,
    Warrior,
    Warlock,
    Priest,
    Druid,
    Rogue,
    Hunter,
    Paladin,
    Shaman,
    Potion,
}

/// Implicit target selector of one effect slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ImplicitTarget {
    /// The explicit unit target of the cast.
    #[default]
    Target,
    /// The caster itself.
    Caster,
    /// The caster's current pet.
    Pet,
    /// The caster's current combat target (chain damage).
    CurrentEnemy,
    /// The cast destination; no unit target.
    Destination,
    /// Party members (including the caster) around the caster.
    CasterParty,
    /// Hostile units around the destination (or explicit target).
    EnemiesAroundTarget,
    /// Friendly units around the caster.
    AlliesAroundCaster,
}

impl ImplicitTarget {
    pub const fn needs_unit(self) -> bool {
        !matches!(self, Self::Destination)
    }

    pub const fn is_area(self) -> bool {
        matches!(
            self,
            Self::CasterParty | Self::EnemiesAroundTarget | Self::AlliesAroundCaster
        )
    }
}

/// Relationship between a spell and a linked spell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LinkedSpellKind {
    /// Cast when the aura applies, removed when it goes.
    Boost,
    /// Cast when the aura is removed.
    CastOnRemove,
    /// Removed from the target when the aura is removed.
    RemoveOnRemove,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn school_mask_helpers() {
        let mask = SchoolMask::FROST | SchoolMask::FIRE;
        assert_eq!(mask.first_school(), SpellSchool::Fire);
        let schools: Vec<_> = mask.schools().collect();
        assert_eq!(schools, vec![SpellSchool::Fire, SpellSchool::Frost]);
        assert_eq!(SpellSchool::Frost.mask(), SchoolMask::FROST);
        assert!(SchoolMask::MAGIC.contains(SchoolMask::ARCANE));
        assert!(!SchoolMask::MAGIC.contains(SchoolMask::NORMAL));
    }

    #[test]
    fn power_type_from_misc() {
        assert_eq!(PowerType::from_misc(0), Some(PowerType::Mana));
        assert_eq!(PowerType::from_misc(3), Some(PowerType::Energy));
        assert_eq!(PowerType::from_misc(-2), Some(PowerType::Health));
        assert_eq!(PowerType::from_misc(9), None);
        assert_eq!(PowerType::Health.index(), None);
        assert_eq!(PowerType::Rage.index(), Some(1));
    }

    #[test]
    fn mechanic_and_dispel_masks() {
        assert_eq!(Mechanic::None.mask_bit(), 0);
        assert_eq!(Mechanic::Charm.mask_bit(), 1);
        assert_eq!(Mechanic::Stun.mask_bit(), 1 << 11);
        assert_eq!(Mechanic::from_misc(12), Mechanic::Stun);
        assert_eq!(DispelType::Magic.mask(), 2);
        assert_eq!(DispelType::All.mask() & DispelType::Poison.mask(), 16);
    }
}
