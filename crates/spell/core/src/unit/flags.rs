//! Unit-wide flag sets toggled by aura handlers.
use bitflags::bitflags;

bitflags! {
    /// Flags observers see on a unit.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct UnitFlags: u32 {
        const NON_ATTACKABLE  = 1 << 1;
        const DISABLE_MOVE    = 1 << 2;
        const PLAYER_CONTROLLED = 1 << 3;
        const PACIFIED        = 1 << 17;
        const STUNNED         = 1 << 18;
        const IN_COMBAT       = 1 << 19;
        const DISARMED        = 1 << 21;
        const CONFUSED        = 1 << 22;
        const FLEEING         = 1 << 23;
        const POSSESSED       = 1 << 24;
        const NOT_SELECTABLE  = 1 << 25;
        const SKINNABLE       = 1 << 26;
        const MOUNTED         = 1 << 27;
        const SILENCED        = 1 << 13;
        const FEIGN_DEATH     = 1 << 29;
    }
}

bitflags! {
    /// Server-side control state.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct UnitState: u32 {
        const STUNNED    = 1 << 0;
        const ROOT       = 1 << 1;
        const CONFUSED   = 1 << 2;
        const FLEEING    = 1 << 3;
        const ISOLATED   = 1 << 4;
        const DISTRACTED = 1 << 5;
        const CHARMED    = 1 << 6;
        const TAUNTED    = 1 << 7;
        const FEIGN_DEATH = 1 << 8;
        const CONTROLLED = Self::STUNNED.bits() | Self::ROOT.bits()
            | Self::CONFUSED.bits() | Self::FLEEING.bits();
    }
}

bitflags! {
    /// Aura-state bits other spells can require (frozen, judgement...).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct AuraStateFlags: u32 {
        const DEFENSE      = 1 << 0;
        const HEALTHLESS_20 = 1 << 1;
        const BERSERKING   = 1 << 2;
        const FROZEN       = 1 << 3;
        const JUDGEMENT    = 1 << 4;
        const HUNTER_PARRY = 1 << 6;
        const HEALTHLESS_35 = 1 << 12;
    }
}

bitflags! {
    /// Movement modifiers.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct MovementFlags: u32 {
        const ROOT        = 1 << 0;
        const WATER_WALK  = 1 << 1;
        const SAFE_FALL   = 1 << 2;
        const HOVER       = 1 << 3;
    }
}

bitflags! {
    /// Player-only state bits.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct PlayerFlags: u32 {
        const GHOST           = 1 << 0;
        const CAN_PARRY       = 1 << 1;
        const CAN_BLOCK       = 1 << 2;
        const CAN_DUAL_WIELD  = 1 << 3;
        const WATER_BREATHING = 1 << 4;
        const TRACK_STEALTHED = 1 << 5;
        const DETECT_AMORE    = 1 << 6;
        const AURAS_VISIBLE   = 1 << 7;
        const RETAIN_COMBO_POINTS = 1 << 8;
        const RESURRECT_PENDING = 1 << 9;
        const SANCTUARY       = 1 << 10;
        const INSIGNIA_REMOVED = 1 << 11;
    }
}

bitflags! {
    /// Per-observer dynamic flags.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct DynamicFlags: u32 {
        const TRACK_UNIT   = 1 << 1;
        const SPECIAL_INFO = 1 << 4;
        const UNTRACKABLE  = 1 << 5;
    }
}

/// How other units perceive this one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Visibility {
    #[default]
    Visible,
    Stealthed,
    Invisible,
    GroupOnly,
}
