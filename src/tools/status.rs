//! petmed Status Tool
//!
//! Provides runtime status information about the petmed service, plus the
//! usage guide returned by `petmed_instructions`.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;

/// Usage guide for AI assistants
pub const INSTRUCTIONS: &str = r#"
# petmed Usage Instructions

petmed tracks a pet's medicine schedule and daily health observations.

## Signing In

Every data tool needs a signed-in user. Use `register` (name + e-mail) the
first time and `login` (e-mail) afterwards. The session survives restarts;
`whoami` shows who is signed in and `logout` ends the session.

## Medicines

Each medicine has a name, a unit label ("tablet", "ml", "drop") and a dose
for each of three daily slots:

| Slot | Meaning |
|------|---------|
| morning | Morning dose |
| midday | Midday/evening dose |
| night | Night dose |

A slot is **active** when its dose is greater than 0. Leave a slot out (or
set it to 0) when the medicine is not given at that time. Every medicine
needs at least one active slot.

## Recording Doses

1. Call `get_daily_doses` with the date (YYYY-MM-DD) to see the day's
   medicines and which active slots are already taken.
2. Call `toggle_dose` with `medicine_id`, `date` and `slot` to mark a dose
   taken. Pass `time` (HH:MM) if the dose was given earlier; otherwise the
   current time is recorded.
3. Calling `toggle_dose` again on a taken slot un-marks it. The recorded
   time is kept.
4. If a different amount was given, call `set_dose_quantity` on the record.

There is only ever one dose record per medicine per day.

## Calendar

`get_dose_calendar` returns every day of a month with a status:

| Status | Symbol | Meaning |
|--------|--------|---------|
| complete | o | All active slots taken |
| partial | ^ | Some active slots taken |
| none | x | No active slot taken |
| no_data | - | Nothing scheduled |

Days with `has_data: false` have no dose records at all.

## Health Records

`save_health_record` creates or replaces the observation for a date:

- `condition`, `appetite`: 1 very bad, 2 bad, 3 normal, 4 good, 5 very good
- `importance`: 1 low (default), 2 medium, 3 high
- `is_hospital_day`: true for a vet visit
- `notes`: free text

`important_since_hospital_visit` lists medium and high importance records
dated after the most recent hospital visit. Use it to prepare for the next
vet appointment.

## Notes

- Dates use ISO format: YYYY-MM-DD
- Times use 24-hour HH:MM
- Deleting a medicine deletes its dose records
"#;

/// Runtime status of the petmed service
#[derive(Debug, Clone, Serialize)]
pub struct PetmedStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,

    /// Signed-in user's e-mail, if any
    pub logged_in_as: Option<String>,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
}

impl StatusTracker {
    /// Create a new status tracker
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
        }
    }

    /// Get the current status
    pub fn get_status(&self, logged_in_as: Option<String>) -> PetmedStatus {
        let build_info = BuildInfo::current();

        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        PetmedStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            logged_in_as,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reports_missing_database() {
        let tracker = StatusTracker::new(PathBuf::from("/nonexistent/petmed.db"));
        let status = tracker.get_status(None);
        assert_eq!(status.database_size_bytes, None);
        assert_eq!(status.process_id, std::process::id());
        assert_eq!(status.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_instructions_cover_every_slot() {
        for slot in ["morning", "midday", "night"] {
            assert!(INSTRUCTIONS.contains(slot));
        }
    }
}
