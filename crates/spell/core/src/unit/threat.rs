//! Threat bookkeeping for units that keep a hostile reference list.

use crate::spell::SchoolMask;
use crate::types::UnitId;

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThreatEntry {
    pub unit: UnitId,
    pub threat: f32,
    /// Temporary threat added by total-threat auras, kept apart so it can be taken back.
    pub temp_threat: f32,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThreatManager {
    entries: Vec<ThreatEntry>,
    /// Unit forcing this one to attack it.
    pub taunted_by: Option<UnitId>,
    /// Per-school generated-threat multipliers (threat auras on the attacker side).
    pub school_modifiers: [f32; 7],
}

impl Default for ThreatManager {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            taunted_by: None,
            school_modifiers: [1.0; 7],
        }
    }
}

impl ThreatManager {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ThreatEntry] {
        &self.entries
    }

    pub fn threat(&self, unit: UnitId) -> f32 {
        self.entries
            .iter()
            .find(|e| e.unit == unit)
            .map_or(0.0, |e| e.threat + e.temp_threat)
    }

    /// Adds threat, creating the entry on first contact. Negative totals clamp to zero.
    pub fn add_threat(&mut self, unit: UnitId, amount: f32) {
        match self.entries.iter_mut().find(|e| e.unit == unit) {
            Some(entry) => entry.threat = (entry.threat + amount).max(0.0),
            None => self.entries.push(ThreatEntry {
                unit,
                threat: amount.max(0.0),
                temp_threat: 0.0,
            }),
        }
    }

    /// Scales one entry by `(100 + pct)%`; `-100` drops the entry.
    pub fn modify_threat_percent(&mut self, unit: UnitId, pct: i32) {
        if pct <= -100 {
            self.remove(unit);
            return;
        }
        if let Some(entry) = self.entries.iter_mut().find(|e| e.unit == unit) {
            entry.threat *= (100 + pct) as f32 / 100.0;
        }
    }

    pub fn add_temp_threat(&mut self, unit: UnitId, amount: f32) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.unit == unit) {
            entry.temp_threat += amount;
        }
    }

    pub fn reset_temp_threat(&mut self, unit: UnitId) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.unit == unit) {
            entry.temp_threat = 0.0;
        }
    }

    pub fn remove(&mut self, unit: UnitId) {
        self.entries.retain(|e| e.unit != unit);
        if self.taunted_by == Some(unit) {
            self.taunted_by = None;
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.taunted_by = None;
    }

    /// Raises `unit` to the current top threat so it takes the lead.
    pub fn raise_to_top(&mut self, unit: UnitId) {
        let top = self.top_threat();
        match self.entries.iter_mut().find(|e| e.unit == unit) {
            Some(entry) if entry.threat < top => entry.threat = top,
            Some(_) => {}
            None => self.add_threat(unit, top),
        }
    }

    pub fn top_threat(&self) -> f32 {
        self.entries
            .iter()
            .map(|e| e.threat + e.temp_threat)
            .fold(0.0, f32::max)
    }

    /// Current attack target: the taunter if any, else the highest entry
    /// (earliest entry wins ties).
    pub fn victim(&self) -> Option<UnitId> {
        if let Some(taunter) = self.taunted_by
            && self.entries.iter().any(|e| e.unit == taunter)
        {
            return Some(taunter);
        }
        let mut best: Option<&ThreatEntry> = None;
        for entry in &self.entries {
            let total = entry.threat + entry.temp_threat;
            if best.is_none_or(|b| total > b.threat + b.temp_threat) {
                best = Some(entry);
            }
        }
        best.map(|e| e.unit)
    }

    /// Multiplier applied to threat generated by a spell of `school`.
    pub fn school_multiplier(&self, school: SchoolMask) -> f32 {
        let school = school.first_school();
        self.school_modifiers[school.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taunt_raises_to_top_and_forces_victim() {
        let mut threat = ThreatManager::default();
        threat.add_threat(UnitId(1), 500.0);
        threat.add_threat(UnitId(2), 100.0);
        assert_eq!(threat.victim(), Some(UnitId(1)));
        threat.raise_to_top(UnitId(2));
        threat.taunted_by = Some(UnitId(2));
        assert_eq!(threat.threat(UnitId(2)), 500.0);
        assert_eq!(threat.victim(), Some(UnitId(2)));
    }

    #[test]
    fn percent_modification_and_removal() {
        let mut threat = ThreatManager::default();
        threat.add_threat(UnitId(1), 200.0);
        threat.modify_threat_percent(UnitId(1), -50);
        assert_eq!(threat.threat(UnitId(1)), 100.0);
        threat.modify_threat_percent(UnitId(1), -100);
        assert!(threat.is_empty());
    }

    #[test]
    fn negative_threat_clamps() {
        let mut threat = ThreatManager::default();
        threat.add_threat(UnitId(3), 10.0);
        threat.add_threat(UnitId(3), -50.0);
        assert_eq!(threat.threat(UnitId(3)), 0.0);
    }
}
