//! Identifiers and small value types shared by every module.
use std::fmt;

/// Unique identifier for any unit registered in the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitId(pub u32);

impl UnitId {
    /// Reserved identifier for effects without an acting unit (environment, scripts).
    pub const SYSTEM: Self = Self(u32::MAX);

    /// Returns true if this id represents the system actor.
    #[inline]
    pub const fn is_system(self) -> bool {
        self.0 == Self::SYSTEM.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of a static spell definition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpellId(pub u32);

impl fmt::Display for SpellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "spell:{}", self.0)
    }
}

/// Arena key of a [`crate::holder::SpellAuraHolder`]. Ids are never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HolderId(pub u64);

impl fmt::Display for HolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "holder:{}", self.0)
    }
}

/// Identifier of a ground effect (dynamic object) spawned by a persistent area aura.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DynObjectId(pub u32);

/// Item template identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemId(pub u32);

/// Party identifier. Units sharing a group id are party members.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupId(pub u32);

/// Effect slot index inside a spell (and aura slot inside a holder).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectIndex {
    Effect0 = 0,
    Effect1 = 1,
    Effect2 = 2,
}

impl EffectIndex {
    pub const ALL: [EffectIndex; 3] = [Self::Effect0, Self::Effect1, Self::Effect2];

    #[inline]
    pub const fn as_usize(self) -> usize {
        self as usize
    }

    pub const fn from_usize(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Effect0),
            1 => Some(Self::Effect1),
            2 => Some(Self::Effect2),
            _ => None,
        }
    }

    /// Bit of this index inside an effect mask.
    #[inline]
    pub const fn mask_bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for EffectIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

/// World position in yards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance in yards.
    pub fn distance(&self, other: &Position) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dy = (self.y - other.y) as f32;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn within(&self, other: &Position, radius: f32) -> bool {
        self.distance(other) <= radius
    }

    /// Position `distance` yards from `self` along the direction to `towards`.
    pub fn step_towards(&self, towards: &Position, distance: i32) -> Position {
        let total = self.distance(towards);
        if total <= f32::EPSILON {
            return *self;
        }
        let ratio = distance as f32 / total;
        Position {
            x: self.x + ((towards.x - self.x) as f32 * ratio).round() as i32,
            y: self.y + ((towards.y - self.y) as f32 * ratio).round() as i32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_euclidean() {
        let a = Position::new(0, 0);
        let b = Position::new(3, 4);
        assert_eq!(a.distance(&b), 5.0);
        assert!(a.within(&b, 5.0));
        assert!(!a.within(&b, 4.9));
    }

    #[test]
    fn step_towards_moves_along_line() {
        let a = Position::new(0, 0);
        let b = Position::new(10, 0);
        assert_eq!(a.step_towards(&b, 4), Position::new(4, 0));
        assert_eq!(a.step_towards(&b, -5), Position::new(-5, 0));
        assert_eq!(a.step_towards(&a, 3), a);
    }

    #[test]
    fn effect_index_mask_bits() {
        assert_eq!(EffectIndex::Effect0.mask_bit(), 1);
        assert_eq!(EffectIndex::Effect2.mask_bit(), 4);
        assert_eq!(EffectIndex::from_usize(3), None);
    }
}
