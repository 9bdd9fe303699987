//! Calendar MCP Tools
//!
//! Monthly maps of dose completion and health records, keyed by date in
//! order, plus the bare month scaffold for laying out a week grid.

use std::collections::{BTreeMap, HashMap};

use chrono::Datelike;
use serde::Serialize;

use crate::db::Database;
use crate::models::{rating_label, DoseRecord, HealthRecord, Medicine, User};
use crate::schedule::{day_status, medicine_status, CompletionStatus, MonthScaffold};

use super::{format_date, validate_month};

/// Completion of one medicine on a calendar day
#[derive(Debug, Serialize)]
pub struct CalendarRecordRow {
    pub record_id: i64,
    pub medicine_id: i64,
    pub medicine_name: String,
    pub completion_status: CompletionStatus,
}

/// One day of the dose calendar
#[derive(Debug, Serialize)]
pub struct DoseCalendarDay {
    /// Any dose record exists for the day
    pub has_data: bool,
    pub status: CompletionStatus,
    pub records: Vec<CalendarRecordRow>,
}

/// Response for get_dose_calendar
#[derive(Debug, Serialize)]
pub struct DoseCalendarResponse {
    pub year: i32,
    pub month: u32,
    pub leading_blanks: u32,
    pub days: BTreeMap<String, DoseCalendarDay>,
    pub complete_days: usize,
    pub partial_days: usize,
    pub missed_days: usize,
}

/// One day of the health calendar
#[derive(Debug, Serialize)]
pub struct HealthCalendarDay {
    pub has_record: bool,
    pub record_id: Option<i64>,
    pub condition: Option<u8>,
    pub condition_label: Option<String>,
    pub appetite: Option<u8>,
    pub appetite_label: Option<String>,
    pub importance: Option<i64>,
    pub is_hospital_day: Option<bool>,
    pub notes: Option<String>,
}

impl HealthCalendarDay {
    fn empty() -> Self {
        Self {
            has_record: false,
            record_id: None,
            condition: None,
            condition_label: None,
            appetite: None,
            appetite_label: None,
            importance: None,
            is_hospital_day: None,
            notes: None,
        }
    }
}

impl From<&HealthRecord> for HealthCalendarDay {
    fn from(record: &HealthRecord) -> Self {
        Self {
            has_record: true,
            record_id: Some(record.id),
            condition: record.condition,
            condition_label: Some(rating_label(record.condition).to_string()),
            appetite: record.appetite,
            appetite_label: Some(rating_label(record.appetite).to_string()),
            importance: Some(record.importance.level()),
            is_hospital_day: Some(record.is_hospital_day),
            notes: record.notes.clone(),
        }
    }
}

/// Response for get_health_calendar
#[derive(Debug, Serialize)]
pub struct HealthCalendarResponse {
    pub year: i32,
    pub month: u32,
    pub leading_blanks: u32,
    pub days: BTreeMap<String, HealthCalendarDay>,
    pub recorded_days: usize,
    pub hospital_days: Vec<String>,
}

/// Response for month_scaffold
#[derive(Debug, Serialize)]
pub struct MonthScaffoldResponse {
    pub year: i32,
    pub month: u32,
    pub leading_blanks: u32,
    pub days: Vec<String>,
    /// Sunday-first rows of day numbers; `null` cells are blanks
    pub weeks: Vec<Vec<Option<u32>>>,
}

fn scaffold_for(year: i32, month: u32) -> Result<MonthScaffold, String> {
    validate_month(year, month)?;
    MonthScaffold::new(year, month).ok_or_else(|| format!("Invalid month {}-{:02}", year, month))
}

/// Build the dose calendar from already-loaded medicines and the month's records
pub fn build_dose_calendar(
    scaffold: &MonthScaffold,
    medicines: &[Medicine],
    records: &[DoseRecord],
) -> DoseCalendarResponse {
    let by_id: HashMap<i64, &Medicine> = medicines.iter().map(|m| (m.id, m)).collect();

    let mut by_date: HashMap<_, Vec<&DoseRecord>> = HashMap::new();
    for record in records {
        by_date.entry(record.dose_date).or_default().push(record);
    }

    let mut days = BTreeMap::new();
    let (mut complete_days, mut partial_days, mut missed_days) = (0, 0, 0);

    for date in &scaffold.days {
        let day_records = by_date.get(date).map(Vec::as_slice).unwrap_or(&[]);
        let taken_by_medicine: HashMap<i64, &DoseRecord> =
            day_records.iter().map(|r| (r.medicine_id, *r)).collect();

        let status = day_status(
            medicines
                .iter()
                .map(|m| (&m.doses, taken_by_medicine.get(&m.id).map(|r| &r.taken))),
        );

        let rows: Vec<CalendarRecordRow> = day_records
            .iter()
            .filter_map(|r| {
                let med = by_id.get(&r.medicine_id)?;
                Some(CalendarRecordRow {
                    record_id: r.id,
                    medicine_id: med.id,
                    medicine_name: med.name.clone(),
                    completion_status: medicine_status(&med.doses, Some(&r.taken)),
                })
            })
            .collect();

        let has_data = !rows.is_empty();
        if has_data {
            match status {
                CompletionStatus::Complete => complete_days += 1,
                CompletionStatus::Partial => partial_days += 1,
                CompletionStatus::None => missed_days += 1,
                CompletionStatus::NoData => {}
            }
        }

        days.insert(
            format_date(*date),
            DoseCalendarDay {
                has_data,
                status,
                records: rows,
            },
        );
    }

    DoseCalendarResponse {
        year: scaffold.year,
        month: scaffold.month,
        leading_blanks: scaffold.leading_blanks,
        days,
        complete_days,
        partial_days,
        missed_days,
    }
}

/// Render a dose calendar as a text week grid. Each cell is the day number
/// followed by the status symbol, or `-` when the day has no records.
pub fn render_dose_calendar(scaffold: &MonthScaffold, calendar: &DoseCalendarResponse) -> String {
    let mut out = String::new();

    if let Some(first) = scaffold.first_day() {
        out.push_str(&format!("{:^28}\n", first.format("%B %Y").to_string()));
    }
    out.push_str(" Su  Mo  Tu  We  Th  Fr  Sa\n");

    for week in scaffold.weeks() {
        let line: String = week
            .iter()
            .map(|cell| match cell {
                Some(date) => {
                    let symbol = calendar
                        .days
                        .get(&format_date(*date))
                        .filter(|d| d.has_data)
                        .map(|d| d.status.symbol())
                        .unwrap_or('-');
                    format!("{:>3}{}", date.day(), symbol)
                }
                None => "    ".to_string(),
            })
            .collect();
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out.push_str(&format!(
        "\no complete: {}  ^ partial: {}  x missed: {}\n",
        calendar.complete_days, calendar.partial_days, calendar.missed_days
    ));
    out
}

// ============================================================================
// Tool Functions
// ============================================================================

/// Per-day dose completion for a month
pub fn get_dose_calendar(db: &Database, user: &User, year: i32, month: u32) -> Result<DoseCalendarResponse, String> {
    let scaffold = scaffold_for(year, month)?;
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let medicines = Medicine::list(&conn, user.id)
        .map_err(|e| format!("Failed to list medicines: {}", e))?;
    let records = DoseRecord::list(&conn, user.id, scaffold.first_day(), scaffold.last_day())
        .map_err(|e| format!("Failed to list dose records: {}", e))?;

    Ok(build_dose_calendar(&scaffold, &medicines, &records))
}

/// Per-day health records for a month
pub fn get_health_calendar(
    db: &Database,
    user: &User,
    year: i32,
    month: u32,
) -> Result<HealthCalendarResponse, String> {
    let scaffold = scaffold_for(year, month)?;
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let records = HealthRecord::list(&conn, user.id, scaffold.first_day(), scaffold.last_day())
        .map_err(|e| format!("Failed to list health records: {}", e))?;
    let by_date: HashMap<_, &HealthRecord> = records.iter().map(|r| (r.date, r)).collect();

    let days: BTreeMap<String, HealthCalendarDay> = scaffold
        .days
        .iter()
        .map(|date| {
            let day = by_date
                .get(date)
                .map(|r| HealthCalendarDay::from(*r))
                .unwrap_or_else(HealthCalendarDay::empty);
            (format_date(*date), day)
        })
        .collect();

    let hospital_days = records
        .iter()
        .filter(|r| r.is_hospital_day)
        .map(|r| format_date(r.date))
        .collect();

    Ok(HealthCalendarResponse {
        year,
        month,
        leading_blanks: scaffold.leading_blanks,
        days,
        recorded_days: records.len(),
        hospital_days,
    })
}

/// Dates and leading blanks for a month
pub fn month_scaffold(year: i32, month: u32) -> Result<MonthScaffoldResponse, String> {
    let scaffold = scaffold_for(year, month)?;

    let weeks = scaffold
        .weeks()
        .iter()
        .map(|week| week.iter().map(|cell| cell.map(|d| d.day())).collect())
        .collect();

    Ok(MonthScaffoldResponse {
        year,
        month,
        leading_blanks: scaffold.leading_blanks,
        days: scaffold.days.iter().copied().map(format_date).collect(),
        weeks,
    })
}
