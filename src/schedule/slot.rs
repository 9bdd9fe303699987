//! Dose slots
//!
//! The three daily administration windows and a small per-slot container.

use serde::{Deserialize, Serialize};

/// One of the three daily administration windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoseSlot {
    Morning,
    Midday,
    Night,
}

impl DoseSlot {
    pub const ALL: [DoseSlot; 3] = [DoseSlot::Morning, DoseSlot::Midday, DoseSlot::Night];

    pub fn as_str(&self) -> &'static str {
        match self {
            DoseSlot::Morning => "morning",
            DoseSlot::Midday => "midday",
            DoseSlot::Night => "night",
        }
    }

    /// Parse a slot name. "evening" and "noon" are accepted for midday.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "morning" | "am" => Some(DoseSlot::Morning),
            "midday" | "noon" | "evening" | "afternoon" => Some(DoseSlot::Midday),
            "night" | "pm" | "bedtime" => Some(DoseSlot::Night),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            DoseSlot::Morning => "Morning",
            DoseSlot::Midday => "Midday",
            DoseSlot::Night => "Night",
        }
    }
}

/// A value for each dose slot
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerSlot<T> {
    pub morning: T,
    pub midday: T,
    pub night: T,
}

impl<T> PerSlot<T> {
    pub fn new(morning: T, midday: T, night: T) -> Self {
        Self { morning, midday, night }
    }

    pub fn get(&self, slot: DoseSlot) -> &T {
        match slot {
            DoseSlot::Morning => &self.morning,
            DoseSlot::Midday => &self.midday,
            DoseSlot::Night => &self.night,
        }
    }

    pub fn get_mut(&mut self, slot: DoseSlot) -> &mut T {
        match slot {
            DoseSlot::Morning => &mut self.morning,
            DoseSlot::Midday => &mut self.midday,
            DoseSlot::Night => &mut self.night,
        }
    }

    /// Iterate `(slot, value)` pairs in morning, midday, night order
    pub fn iter(&self) -> impl Iterator<Item = (DoseSlot, &T)> {
        DoseSlot::ALL.into_iter().map(move |slot| (slot, self.get(slot)))
    }
}

impl PerSlot<Option<f64>> {
    /// A slot is active when its configured quantity is present and positive
    pub fn is_active(&self, slot: DoseSlot) -> bool {
        matches!(self.get(slot), Some(q) if *q > 0.0)
    }

    pub fn active_slots(&self) -> impl Iterator<Item = DoseSlot> + '_ {
        DoseSlot::ALL.into_iter().filter(move |slot| self.is_active(*slot))
    }

    pub fn has_active_slot(&self) -> bool {
        self.active_slots().next().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_slot_aliases() {
        assert_eq!(DoseSlot::parse("Morning"), Some(DoseSlot::Morning));
        assert_eq!(DoseSlot::parse("evening"), Some(DoseSlot::Midday));
        assert_eq!(DoseSlot::parse(" night "), Some(DoseSlot::Night));
        assert_eq!(DoseSlot::parse("brunch"), None);
    }

    #[test]
    fn test_active_slots_require_positive_quantity() {
        let doses = PerSlot::new(Some(1.0), Some(0.0), None);
        let active: Vec<_> = doses.active_slots().collect();
        assert_eq!(active, vec![DoseSlot::Morning]);
        assert!(doses.has_active_slot());

        let none: PerSlot<Option<f64>> = PerSlot::default();
        assert!(!none.has_active_slot());
    }

    #[test]
    fn test_get_mut_targets_one_slot() {
        let mut taken = PerSlot::new(false, false, false);
        *taken.get_mut(DoseSlot::Night) = true;
        assert_eq!(taken, PerSlot::new(false, false, true));
    }
}
