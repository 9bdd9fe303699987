//! Dose-toggle reconciliation
//!
//! Decides the new taken/time state of a (medicine, date) record when one
//! slot is toggled. The store applies the result in place so there is never
//! more than one record per medicine per day.

use chrono::NaiveTime;

use super::slot::{DoseSlot, PerSlot};

/// Taken flags and stamped times of one dose record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DoseMarks {
    pub taken: PerSlot<bool>,
    pub times: PerSlot<Option<NaiveTime>>,
}

/// Result of toggling one slot
#[derive(Debug, Clone, PartialEq)]
pub struct ToggleOutcome {
    pub marks: DoseMarks,
    /// No record existed for the pair; the caller must insert one
    pub created: bool,
    /// New taken state of the toggled slot
    pub taken: bool,
}

/// Toggle `slot` on the existing record, or start a new one.
///
/// Marking a slot taken stamps it with `stamp` (an explicit time or the
/// current wall-clock time, chosen by the caller). Un-marking keeps the
/// previously stamped time. The other two slots are never touched.
pub fn toggle_slot(existing: Option<&DoseMarks>, slot: DoseSlot, stamp: NaiveTime) -> ToggleOutcome {
    match existing {
        Some(current) => {
            let mut marks = current.clone();
            let taken = !*current.taken.get(slot);
            *marks.taken.get_mut(slot) = taken;
            if taken {
                *marks.times.get_mut(slot) = Some(stamp);
            }
            ToggleOutcome {
                marks,
                created: false,
                taken,
            }
        }
        None => {
            let mut marks = DoseMarks::default();
            *marks.taken.get_mut(slot) = true;
            *marks.times.get_mut(slot) = Some(stamp);
            ToggleOutcome {
                marks,
                created: true,
                taken: true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_new_record_sets_only_target_slot() {
        let outcome = toggle_slot(None, DoseSlot::Midday, t(12, 15));
        assert!(outcome.created);
        assert!(outcome.taken);
        assert_eq!(outcome.marks.taken, PerSlot::new(false, true, false));
        assert_eq!(outcome.marks.times, PerSlot::new(None, Some(t(12, 15)), None));
    }

    #[test]
    fn test_marking_taken_stamps_time() {
        let existing = DoseMarks {
            taken: PerSlot::new(true, false, false),
            times: PerSlot::new(Some(t(8, 0)), None, None),
        };
        let outcome = toggle_slot(Some(&existing), DoseSlot::Night, t(21, 30));
        assert!(!outcome.created);
        assert!(outcome.taken);
        assert_eq!(outcome.marks.taken, PerSlot::new(true, false, true));
        assert_eq!(
            outcome.marks.times,
            PerSlot::new(Some(t(8, 0)), None, Some(t(21, 30)))
        );
    }

    #[test]
    fn test_untaking_keeps_other_slots_and_stamped_time() {
        let existing = DoseMarks {
            taken: PerSlot::new(true, true, false),
            times: PerSlot::new(Some(t(8, 0)), Some(t(12, 0)), None),
        };
        let outcome = toggle_slot(Some(&existing), DoseSlot::Morning, t(23, 59));
        assert!(!outcome.taken);
        assert_eq!(outcome.marks.taken, PerSlot::new(false, true, false));
        // Times untouched, including the un-taken slot
        assert_eq!(outcome.marks.times, existing.times);
    }

    #[test]
    fn test_retaking_restamps() {
        let existing = DoseMarks {
            taken: PerSlot::new(false, false, false),
            times: PerSlot::new(Some(t(8, 0)), None, None),
        };
        let outcome = toggle_slot(Some(&existing), DoseSlot::Morning, t(9, 45));
        assert_eq!(outcome.marks.times.morning, Some(t(9, 45)));
    }
}
