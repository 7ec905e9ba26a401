/// Aura engine configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AuraConfig {
    /// Interval between mana-per-second drains of a holder's caster.
    pub mana_drain_interval_ms: i32,
    /// Share of periodic heals/energizes converted into assist threat, in percent.
    pub periodic_threat_pct: u32,
    /// Time after the last diminished aura expires before the level resets.
    pub diminishing_reset_ms: i32,
    /// Maximum nesting of triggered casts inside one top-level cast or tick.
    pub max_trigger_depth: u32,
    /// Enables the heartbeat resist roll on player-vs-player control auras.
    pub heartbeat_resist: bool,
    /// Tick period for `OBS_MOD_MANA` auras that carry no amplitude.
    pub obs_mana_period_ms: i32,
    /// Tick period for health regeneration auras.
    pub regen_period_ms: i32,
    /// Tick period for rage regeneration auras.
    pub rage_regen_period_ms: i32,
    /// Tick period for non-rage power regeneration auras.
    pub power_regen_period_ms: i32,
}

impl AuraConfig {
    // ===== compile-time constants used as type parameters =====
    /// Effect slots per spell and aura slots per holder.
    pub const MAX_EFFECT_INDEX: usize = 3;
    /// Visible aura slots reported to observers.
    pub const MAX_VISIBLE_SLOTS: usize = 48;
    /// Slots `0..MAX_POSITIVE_SLOTS` hold positive auras, the rest negative ones.
    pub const MAX_POSITIVE_SLOTS: usize = 32;
    /// Application counts are reported in one byte.
    pub const MAX_STACK_DISPLAY: u32 = 255;
    /// Power kinds tracked per unit.
    pub const MAX_POWERS: usize = 5;
    /// Spell schools.
    pub const MAX_SCHOOLS: usize = 7;
    /// Primary stats.
    pub const MAX_STATS: usize = 5;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_MANA_DRAIN_INTERVAL_MS: i32 = 1000;
    pub const DEFAULT_PERIODIC_THREAT_PCT: u32 = 50;
    pub const DEFAULT_DIMINISHING_RESET_MS: i32 = 15_000;
    pub const DEFAULT_MAX_TRIGGER_DEPTH: u32 = 8;
    pub const DEFAULT_OBS_MANA_PERIOD_MS: i32 = 1000;
    pub const DEFAULT_REGEN_PERIOD_MS: i32 = 5000;
    pub const DEFAULT_RAGE_REGEN_PERIOD_MS: i32 = 3000;
    pub const DEFAULT_POWER_REGEN_PERIOD_MS: i32 = 2000;

    pub fn new() -> Self {
        Self {
            mana_drain_interval_ms: Self::DEFAULT_MANA_DRAIN_INTERVAL_MS,
            periodic_threat_pct: Self::DEFAULT_PERIODIC_THREAT_PCT,
            diminishing_reset_ms: Self::DEFAULT_DIMINISHING_RESET_MS,
            max_trigger_depth: Self::DEFAULT_MAX_TRIGGER_DEPTH,
            heartbeat_resist: true,
            obs_mana_period_ms: Self::DEFAULT_OBS_MANA_PERIOD_MS,
            regen_period_ms: Self::DEFAULT_REGEN_PERIOD_MS,
            rage_regen_period_ms: Self::DEFAULT_RAGE_REGEN_PERIOD_MS,
            power_regen_period_ms: Self::DEFAULT_POWER_REGEN_PERIOD_MS,
        }
    }

    /// Configuration with every probabilistic extra disabled; used by replays
    /// that must not depend on roll outcomes.
    pub fn deterministic() -> Self {
        Self {
            heartbeat_resist: false,
            ..Self::new()
        }
    }

    pub fn with_max_trigger_depth(mut self, depth: u32) -> Self {
        self.max_trigger_depth = depth;
        self
    }
}

impl Default for AuraConfig {
    fn default() -> Self {
        Self::new()
    }
}
