//! Diminishing returns on repeated crowd control.
//!
//! Each hit of a diminished spell raises the group's level on the target;
//! the level scales the duration of the next application (100%, 50%, 25%,
//! immune). Levels reset once no aura of the group has been active for the
//! configured reset window.

/// Diminishing category of a spell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiminishingGroup {
    #[default]
    None,
    Stun,
    TriggeredStun,
    Root,
    TriggeredRoot,
    Fear,
    Polymorph,
    Sleep,
    Charm,
    Disorient,
    Horror,
    Silence,
    Disarm,
    Freeze,
    Banish,
    KnockoutSap,
}

/// Which units a group diminishes on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiminishingScope {
    All,
    PlayersOnly,
}

impl DiminishingGroup {
    pub const fn scope(self) -> DiminishingScope {
        match self {
            Self::Stun | Self::TriggeredStun | Self::Root | Self::TriggeredRoot | Self::KnockoutSap => {
                DiminishingScope::All
            }
            _ => DiminishingScope::PlayersOnly,
        }
    }

    /// Groups whose durations are capped in player-vs-player.
    pub const fn is_duration_limited(self) -> bool {
        matches!(
            self,
            Self::Stun
                | Self::TriggeredStun
                | Self::Root
                | Self::TriggeredRoot
                | Self::Fear
                | Self::Polymorph
                | Self::Sleep
                | Self::Charm
                | Self::Disorient
                | Self::Horror
                | Self::KnockoutSap
                | Self::Banish
                | Self::Freeze
        )
    }

    pub const fn max_level(self) -> DiminishingLevel {
        DiminishingLevel::Immune
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiminishingLevel {
    #[default]
    Level1 = 0,
    Level2 = 1,
    Level3 = 2,
    Immune = 3,
}

impl DiminishingLevel {
    const fn from_count(count: u32) -> Self {
        match count {
            0 => Self::Level1,
            1 => Self::Level2,
            2 => Self::Level3,
            _ => Self::Immune,
        }
    }

    /// Duration multiplier for this level.
    pub const fn duration_factor(self) -> f32 {
        match self {
            Self::Level1 => 1.0,
            Self::Level2 => 0.5,
            Self::Level3 => 0.25,
            Self::Immune => 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiminishingEntry {
    pub group: DiminishingGroup,
    pub hit_count: u32,
    /// World time the last aura of the group was removed.
    pub hit_time_ms: u64,
    /// Active holders registered in the group.
    pub stack: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiminishingReturns {
    entries: Vec<DiminishingEntry>,
}

impl DiminishingReturns {
    /// Current level of `group`, resetting it when the reset window elapsed.
    pub fn level(&mut self, group: DiminishingGroup, now_ms: u64, reset_ms: i32) -> DiminishingLevel {
        let Some(entry) = self.entries.iter_mut().find(|e| e.group == group) else {
            return DiminishingLevel::Level1;
        };
        if entry.stack == 0 && now_ms.saturating_sub(entry.hit_time_ms) > reset_ms.max(0) as u64 {
            entry.hit_count = 0;
        }
        DiminishingLevel::from_count(entry.hit_count)
    }

    /// Records one more hit of `group`.
    pub fn increment(&mut self, group: DiminishingGroup, now_ms: u64) {
        let max = group.max_level() as u32;
        match self.entries.iter_mut().find(|e| e.group == group) {
            Some(entry) => {
                if entry.hit_count < max {
                    entry.hit_count += 1;
                }
            }
            None => self.entries.push(DiminishingEntry {
                group,
                hit_count: 1,
                hit_time_ms: now_ms,
                stack: 0,
            }),
        }
    }

    /// Registers or releases an active holder of `group`.
    pub fn apply_aura(&mut self, group: DiminishingGroup, apply: bool, now_ms: u64) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.group == group) {
            if apply {
                entry.stack += 1;
            } else if entry.stack > 0 {
                entry.stack -= 1;
                if entry.stack == 0 {
                    entry.hit_time_ms = now_ms;
                }
            }
        }
    }

    pub fn entry(&self, group: DiminishingGroup) -> Option<&DiminishingEntry> {
        self.entries.iter().find(|e| e.group == group)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_climb_and_cap_at_immune() {
        let mut dr = DiminishingReturns::default();
        let g = DiminishingGroup::Stun;
        assert_eq!(dr.level(g, 0, 15_000), DiminishingLevel::Level1);
        dr.increment(g, 0);
        assert_eq!(dr.level(g, 0, 15_000), DiminishingLevel::Level2);
        dr.increment(g, 0);
        dr.increment(g, 0);
        dr.increment(g, 0);
        assert_eq!(dr.level(g, 0, 15_000), DiminishingLevel::Immune);
        assert_eq!(DiminishingLevel::Immune.duration_factor(), 0.0);
    }

    #[test]
    fn resets_after_window_only_when_no_aura_active() {
        let mut dr = DiminishingReturns::default();
        let g = DiminishingGroup::Fear;
        dr.increment(g, 0);
        dr.apply_aura(g, true, 0);
        assert_eq!(dr.level(g, 60_000, 15_000), DiminishingLevel::Level2);
        dr.apply_aura(g, false, 60_000);
        assert_eq!(dr.level(g, 70_000, 15_000), DiminishingLevel::Level2);
        assert_eq!(dr.level(g, 80_000, 15_000), DiminishingLevel::Level1);
    }

    #[test]
    fn scope_of_groups() {
        assert_eq!(DiminishingGroup::Stun.scope(), DiminishingScope::All);
        assert_eq!(DiminishingGroup::Fear.scope(), DiminishingScope::PlayersOnly);
    }
}
