//! Dose-completion aggregation
//!
//! Classifies a day (or a single medicine on a day) by how many of its
//! active dose slots were marked taken.

use serde::{Deserialize, Serialize};

use super::slot::PerSlot;

/// Completion status of a day's dosing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    /// Every active slot was taken
    Complete,
    /// Some but not all active slots were taken
    Partial,
    /// No active slot was taken
    None,
    /// Nothing was scheduled
    NoData,
}

impl CompletionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionStatus::Complete => "complete",
            CompletionStatus::Partial => "partial",
            CompletionStatus::None => "none",
            CompletionStatus::NoData => "no_data",
        }
    }

    /// Single-character marker for calendar cells
    pub fn symbol(&self) -> char {
        match self {
            CompletionStatus::Complete => 'o',
            CompletionStatus::Partial => '^',
            CompletionStatus::None => 'x',
            CompletionStatus::NoData => '-',
        }
    }
}

/// Running count of active and taken slots
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotTally {
    pub active: usize,
    pub taken: usize,
}

impl SlotTally {
    /// Count one medicine's active slots against its day record.
    /// A missing record counts every active slot as untaken.
    pub fn add(&mut self, doses: &PerSlot<Option<f64>>, taken: Option<&PerSlot<bool>>) {
        for slot in doses.active_slots() {
            self.active += 1;
            if taken.map(|t| *t.get(slot)).unwrap_or(false) {
                self.taken += 1;
            }
        }
    }

    pub fn status(&self) -> CompletionStatus {
        if self.active == 0 {
            CompletionStatus::NoData
        } else if self.taken == 0 {
            CompletionStatus::None
        } else if self.taken == self.active {
            CompletionStatus::Complete
        } else {
            CompletionStatus::Partial
        }
    }
}

/// Status of a single medicine on a day
pub fn medicine_status(doses: &PerSlot<Option<f64>>, taken: Option<&PerSlot<bool>>) -> CompletionStatus {
    let mut tally = SlotTally::default();
    tally.add(doses, taken);
    tally.status()
}

/// Status of a whole day across all medicines
pub fn day_status<'a, I>(entries: I) -> CompletionStatus
where
    I: IntoIterator<Item = (&'a PerSlot<Option<f64>>, Option<&'a PerSlot<bool>>)>,
{
    let mut tally = SlotTally::default();
    for (doses, taken) in entries {
        tally.add(doses, taken);
    }
    tally.status()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doses(m: f64, d: f64, n: f64) -> PerSlot<Option<f64>> {
        PerSlot::new(Some(m), Some(d), Some(n))
    }

    #[test]
    fn test_example_partial_day() {
        // morning=1, midday=0, night=0.5; morning taken, night not
        let a = doses(1.0, 0.0, 0.5);
        let record = PerSlot::new(true, false, false);
        assert_eq!(medicine_status(&a, Some(&record)), CompletionStatus::Partial);
        assert_eq!(day_status([(&a, Some(&record))]), CompletionStatus::Partial);
    }

    #[test]
    fn test_complete_requires_every_active_slot() {
        let a = doses(1.0, 0.0, 0.5);
        let b = doses(0.0, 2.0, 0.0);
        let a_taken = PerSlot::new(true, false, true);
        let b_taken = PerSlot::new(false, true, false);
        assert_eq!(
            day_status([(&a, Some(&a_taken)), (&b, Some(&b_taken))]),
            CompletionStatus::Complete
        );
        assert_eq!(
            day_status([(&a, Some(&a_taken)), (&b, None)]),
            CompletionStatus::Partial
        );
    }

    #[test]
    fn test_taken_flags_on_inactive_slots_are_ignored() {
        let a = doses(1.0, 0.0, 0.0);
        let taken = PerSlot::new(false, true, true);
        assert_eq!(medicine_status(&a, Some(&taken)), CompletionStatus::None);
    }

    #[test]
    fn test_no_records_means_none() {
        let a = doses(1.0, 1.0, 1.0);
        assert_eq!(day_status([(&a, None)]), CompletionStatus::None);
    }

    #[test]
    fn test_zero_active_slots_is_no_data() {
        let inactive: PerSlot<Option<f64>> = PerSlot::new(None, Some(0.0), None);
        let all_taken = PerSlot::new(true, true, true);
        assert_eq!(
            day_status([(&inactive, Some(&all_taken))]),
            CompletionStatus::NoData
        );
        assert_eq!(day_status(std::iter::empty()), CompletionStatus::NoData);
    }

    #[test]
    fn test_status_exhaustive_over_three_slots() {
        let a = doses(1.0, 1.0, 1.0);
        for bits in 0u8..8 {
            let taken = PerSlot::new(bits & 1 != 0, bits & 2 != 0, bits & 4 != 0);
            let expected = match bits.count_ones() {
                0 => CompletionStatus::None,
                3 => CompletionStatus::Complete,
                _ => CompletionStatus::Partial,
            };
            assert_eq!(medicine_status(&a, Some(&taken)), expected, "bits {bits:03b}");
        }
    }
}
