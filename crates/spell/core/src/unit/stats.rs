//! Layered stat modifiers.
//!
//! Every modifiable quantity (primary stats, health, powers, armor,
//! resistances, attack power) keeps four modifier layers next to its base
//! value, and the total is always recomputed from them:
//!
//! ```text
//! total = ((base + BaseValue) × BasePct + TotalValue) × TotalPct
//! ```
//!
//! Percent layers are products of `(100 + pct) / 100` factors so an aura can
//! undo exactly the factor it applied.

use crate::spell::{PowerType, SpellSchool, Stat};

/// Quantities tracked by [`UnitStats`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::EnumCount, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum UnitMod {
    StatStrength,
    StatAgility,
    StatStamina,
    StatIntellect,
    StatSpirit,
    Health,
    Mana,
    Rage,
    Focus,
    Energy,
    Happiness,
    Armor,
    ResistHoly,
    ResistFire,
    ResistNature,
    ResistFrost,
    ResistShadow,
    ResistArcane,
    AttackPower,
    AttackPowerRanged,
    DamageMainHand,
    DamageOffHand,
    DamageRanged,
}

impl UnitMod {
    pub const COUNT: usize = <Self as strum::EnumCount>::COUNT;

    pub const fn stat(stat: Stat) -> Self {
        match stat {
            Stat::Strength => Self::StatStrength,
            Stat::Agility => Self::StatAgility,
            Stat::Stamina => Self::StatStamina,
            Stat::Intellect => Self::StatIntellect,
            Stat::Spirit => Self::StatSpirit,
        }
    }

    /// Resistance slot for a school; physical maps to armor.
    pub const fn resistance(school: SpellSchool) -> Self {
        match school {
            SpellSchool::Normal => Self::Armor,
            SpellSchool::Holy => Self::ResistHoly,
            SpellSchool::Fire => Self::ResistFire,
            SpellSchool::Nature => Self::ResistNature,
            SpellSchool::Frost => Self::ResistFrost,
            SpellSchool::Shadow => Self::ResistShadow,
            SpellSchool::Arcane => Self::ResistArcane,
        }
    }

    pub const fn power(power: PowerType) -> Self {
        match power {
            PowerType::Health => Self::Health,
            PowerType::Mana => Self::Mana,
            PowerType::Rage => Self::Rage,
            PowerType::Focus => Self::Focus,
            PowerType::Energy => Self::Energy,
            PowerType::Happiness => Self::Happiness,
        }
    }

    #[inline]
    const fn index(self) -> usize {
        self as usize
    }
}

/// Modifier layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModifierType {
    BaseValue = 0,
    BasePct = 1,
    TotalValue = 2,
    TotalPct = 3,
}

/// Multiplies or divides `value` by `(100 + pct) / 100`.
///
/// `-100` would make the factor zero and lose the value; it is nudged to
/// `-99.99` so unapply can restore it.
pub fn apply_percent_mod(value: &mut f32, pct: f32, apply: bool) {
    let pct = if pct <= -100.0 { -99.99 } else { pct };
    if apply {
        *value *= (100.0 + pct) / 100.0;
    } else {
        *value *= 100.0 / (100.0 + pct);
    }
}

/// Base values plus the four modifier layers for every [`UnitMod`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitStats {
    base: [f32; UnitMod::COUNT],
    layers: [[f32; 4]; UnitMod::COUNT],
    /// Flat chance modifiers (percent points) kept outside the layered table.
    pub ratings: CombatRatings,
}

/// Percentage-point modifiers that have no base value.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatRatings {
    pub parry_pct: f32,
    pub dodge_pct: f32,
    pub block_pct: f32,
    pub crit_pct: f32,
    pub hit_pct: f32,
    pub spell_hit_pct: f32,
    pub spell_crit_pct: [f32; 7],
    pub casting_speed_pct: f32,
    pub melee_haste_pct: f32,
    pub ranged_haste_pct: f32,
    pub ammo_haste_pct: f32,
    pub power_cost_flat: [i32; 7],
    pub power_cost_pct: [f32; 7],
    pub damage_done_pct: [f32; 7],
    pub healing_done: i32,
    pub offhand_damage_pct: f32,
    pub shield_block_value: f32,
    pub shield_block_value_pct: f32,
    pub detect_range: i32,
    pub scale_pct: f32,
    pub spell_damage_of_stat_pct: [f32; 7],
    pub spell_healing_of_stat_pct: f32,
    pub resistance_exclusive: [i32; 7],
    pub skill_bonus: Vec<(u32, i32)>,
}

impl Default for UnitStats {
    fn default() -> Self {
        Self {
            base: [0.0; UnitMod::COUNT],
            layers: [[0.0, 1.0, 0.0, 1.0]; UnitMod::COUNT],
            ratings: CombatRatings::default(),
        }
    }
}

impl UnitStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base(&self, m: UnitMod) -> f32 {
        self.base[m.index()]
    }

    pub fn set_base(&mut self, m: UnitMod, value: f32) {
        self.base[m.index()] = value;
    }

    pub fn modifier(&self, m: UnitMod, ty: ModifierType) -> f32 {
        self.layers[m.index()][ty as usize]
    }

    /// Adds (`apply`) or removes an amount on one layer.
    ///
    /// Returns `false` for non-finite amounts, leaving the table untouched.
    pub fn handle_modifier(&mut self, m: UnitMod, ty: ModifierType, amount: f32, apply: bool) -> bool {
        if !amount.is_finite() {
            return false;
        }
        let slot = &mut self.layers[m.index()][ty as usize];
        match ty {
            ModifierType::BaseValue | ModifierType::TotalValue => {
                if apply {
                    *slot += amount;
                } else {
                    *slot -= amount;
                }
            }
            ModifierType::BasePct | ModifierType::TotalPct => apply_percent_mod(slot, amount, apply),
        }
        true
    }

    /// Layered total of one quantity.
    pub fn total(&self, m: UnitMod) -> f32 {
        let [base_value, base_pct, total_value, total_pct] = self.layers[m.index()];
        ((self.base[m.index()] + base_value) * base_pct + total_value) * total_pct
    }

    /// Total rounded toward zero, clamped at zero.
    pub fn total_u32(&self, m: UnitMod) -> u32 {
        self.total(m).max(0.0) as u32
    }

    pub fn stat(&self, stat: Stat) -> f32 {
        self.total(UnitMod::stat(stat))
    }

    pub fn resistance(&self, school: SpellSchool) -> i32 {
        let exclusive = self.ratings.resistance_exclusive[school.index()];
        self.total(UnitMod::resistance(school)) as i32 + exclusive
    }

    /// True when every layer of `m` is back to neutral.
    pub fn is_neutral(&self, m: UnitMod) -> bool {
        let [base_value, base_pct, total_value, total_pct] = self.layers[m.index()];
        base_value.abs() < 1e-3
            && (base_pct - 1.0).abs() < 1e-4
            && total_value.abs() < 1e-3
            && (total_pct - 1.0).abs() < 1e-4
    }
}
