//! Records of note since the last hospital visit

use serde::Serialize;

use crate::models::HealthRecord;

/// The latest hospital visit and the notable records that followed it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportantRecords {
    pub last_hospital_visit: Option<HealthRecord>,
    pub important_records: Vec<HealthRecord>,
}

/// The hospital-visit record with the latest date
pub fn last_hospital_visit(records: &[HealthRecord]) -> Option<&HealthRecord> {
    records
        .iter()
        .filter(|r| r.is_hospital_day)
        .max_by_key(|r| r.date)
}

/// Medium and high importance records dated strictly after the last
/// hospital visit (all of them if there has been no visit), oldest first.
pub fn important_since_last_visit(records: &[HealthRecord]) -> ImportantRecords {
    let last_visit = last_hospital_visit(records);
    let cutoff = last_visit.map(|r| r.date);

    let mut important: Vec<HealthRecord> = records
        .iter()
        .filter(|r| r.importance.is_notable())
        .filter(|r| cutoff.map_or(true, |c| r.date > c))
        .cloned()
        .collect();
    important.sort_by_key(|r| r.date);

    ImportantRecords {
        last_hospital_visit: last_visit.cloned(),
        important_records: important,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Importance;
    use chrono::NaiveDate;

    fn record(id: i64, day: u32, importance: Importance, hospital: bool) -> HealthRecord {
        HealthRecord {
            id,
            user_id: 1,
            date: NaiveDate::from_ymd_opt(2025, 5, day).unwrap(),
            condition: None,
            appetite: None,
            notes: None,
            importance,
            is_hospital_day: hospital,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_window_starts_after_latest_visit() {
        let records = vec![
            record(1, 1, Importance::High, true),
            record(2, 3, Importance::High, false),
            record(3, 10, Importance::Medium, true),
            record(4, 18, Importance::Medium, false),
            record(5, 12, Importance::High, false),
            record(6, 15, Importance::Low, false),
        ];

        let summary = important_since_last_visit(&records);
        assert_eq!(summary.last_hospital_visit.as_ref().map(|r| r.id), Some(3));
        let ids: Vec<i64> = summary.important_records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![5, 4]);
    }

    #[test]
    fn test_visit_day_itself_is_excluded() {
        let records = vec![record(1, 7, Importance::High, true)];
        let summary = important_since_last_visit(&records);
        assert!(summary.important_records.is_empty());
    }

    #[test]
    fn test_no_visit_includes_all_notable() {
        let records = vec![
            record(1, 9, Importance::Medium, false),
            record(2, 2, Importance::High, false),
            record(3, 5, Importance::Low, false),
        ];
        let summary = important_since_last_visit(&records);
        assert!(summary.last_hospital_visit.is_none());
        let ids: Vec<i64> = summary.important_records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_never_includes_low_or_pre_visit_records() {
        let records: Vec<HealthRecord> = (1..=28)
            .map(|d| {
                let importance = match d % 3 {
                    0 => Importance::Low,
                    1 => Importance::Medium,
                    _ => Importance::High,
                };
                record(d as i64, d, importance, d == 14 || d == 20)
            })
            .collect();

        let summary = important_since_last_visit(&records);
        let visit = summary.last_hospital_visit.unwrap().date;
        assert_eq!(visit, NaiveDate::from_ymd_opt(2025, 5, 20).unwrap());
        for r in &summary.important_records {
            assert!(r.date > visit);
            assert_ne!(r.importance, Importance::Low);
        }
        assert!(!summary.important_records.is_empty());
    }
}
