//! Schedule module
//!
//! Pure computations over already-loaded records: day completion status,
//! dose-toggle reconciliation, the month grid and the health summary.

pub mod completion;
pub mod importance;
pub mod scaffold;
pub mod slot;
pub mod toggle;

pub use completion::{day_status, medicine_status, CompletionStatus, SlotTally};
pub use importance::{important_since_last_visit, last_hospital_visit, ImportantRecords};
pub use scaffold::MonthScaffold;
pub use slot::{DoseSlot, PerSlot};
pub use toggle::{toggle_slot, DoseMarks, ToggleOutcome};
