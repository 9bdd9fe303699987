//! Dose MCP Tools
//!
//! The daily dose view and dose-record operations. A day view joins each
//! medicine with its record for the date and shows only the active slots.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::db::Database;
use crate::models::{DoseRecord, Medicine, User};
use crate::schedule::{day_status, medicine_status, CompletionStatus, DoseSlot, PerSlot};

use super::{current_stamp, format_date, format_time, parse_time};

/// One active slot of a medicine on a day
#[derive(Debug, Serialize)]
pub struct SlotView {
    pub slot: String,
    pub dose: f64,
    pub dose_display: String,
    pub taken: bool,
    pub time: Option<String>,
    /// Quantity actually given, when it differed from the dose
    pub recorded_quantity: Option<f64>,
}

/// A medicine joined with its record for the day
#[derive(Debug, Serialize)]
pub struct MedicineDay {
    pub medicine_id: i64,
    pub name: String,
    pub unit: String,
    pub record_id: Option<i64>,
    pub status: CompletionStatus,
    pub slots: Vec<SlotView>,
}

/// Response for get_daily_doses
#[derive(Debug, Serialize)]
pub struct DailyDosesResponse {
    pub date: String,
    pub status: CompletionStatus,
    pub medicines: Vec<MedicineDay>,
    pub taken_count: usize,
    pub scheduled_count: usize,
}

/// Full dose record detail
#[derive(Debug, Serialize)]
pub struct DoseRecordDetail {
    pub id: i64,
    pub medicine_id: i64,
    pub medicine_name: Option<String>,
    pub dose_date: String,
    pub taken: PerSlot<bool>,
    pub times: PerSlot<Option<String>>,
    pub quantities: PerSlot<Option<f64>>,
    pub created_at: String,
    pub updated_at: String,
}

impl DoseRecordDetail {
    fn new(record: DoseRecord, medicine_name: Option<String>) -> Self {
        Self {
            id: record.id,
            medicine_id: record.medicine_id,
            medicine_name,
            dose_date: format_date(record.dose_date),
            taken: record.taken,
            times: PerSlot::new(
                record.times.morning.map(format_time),
                record.times.midday.map(format_time),
                record.times.night.map(format_time),
            ),
            quantities: record.quantities,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Response for toggle_dose
#[derive(Debug, Serialize)]
pub struct ToggleDoseResponse {
    pub medicine_id: i64,
    pub slot: String,
    pub taken: bool,
    pub record_created: bool,
    pub record: DoseRecordDetail,
    /// The whole day, re-read after the write
    pub day: DailyDosesResponse,
}

/// Response for list_dose_records
#[derive(Debug, Serialize)]
pub struct ListDoseRecordsResponse {
    pub records: Vec<DoseRecordDetail>,
    pub total: usize,
}

/// Response for delete_dose_record
#[derive(Debug, Serialize)]
pub struct DeleteDoseRecordResponse {
    pub success: bool,
    pub deleted_id: i64,
}

fn medicine_day(med: &Medicine, record: Option<&DoseRecord>) -> MedicineDay {
    let slots = med
        .doses
        .active_slots()
        .filter_map(|slot| {
            let dose = med.active_dose(slot)?;
            Some(SlotView {
                slot: slot.as_str().to_string(),
                dose,
                dose_display: format!("{} {}", dose, med.unit),
                taken: record.map(|r| *r.taken.get(slot)).unwrap_or(false),
                time: record.and_then(|r| *r.times.get(slot)).map(format_time),
                recorded_quantity: record.and_then(|r| *r.quantities.get(slot)),
            })
        })
        .collect();

    MedicineDay {
        medicine_id: med.id,
        name: med.name.clone(),
        unit: med.unit.clone(),
        record_id: record.map(|r| r.id),
        status: medicine_status(&med.doses, record.map(|r| &r.taken)),
        slots,
    }
}

/// Build the day view from already-loaded medicines and records
pub fn build_day(date: NaiveDate, medicines: &[Medicine], records: &[DoseRecord]) -> DailyDosesResponse {
    let by_medicine: HashMap<i64, &DoseRecord> = records.iter().map(|r| (r.medicine_id, r)).collect();

    let status = day_status(
        medicines
            .iter()
            .map(|m| (&m.doses, by_medicine.get(&m.id).map(|r| &r.taken))),
    );

    // Medicines with no active slot have nothing to show
    let days: Vec<MedicineDay> = medicines
        .iter()
        .filter(|m| m.doses.has_active_slot())
        .map(|m| medicine_day(m, by_medicine.get(&m.id).copied()))
        .collect();

    let scheduled_count = days.iter().map(|d| d.slots.len()).sum();
    let taken_count = days
        .iter()
        .flat_map(|d| d.slots.iter())
        .filter(|s| s.taken)
        .count();

    DailyDosesResponse {
        date: format_date(date),
        status,
        medicines: days,
        taken_count,
        scheduled_count,
    }
}

// ============================================================================
// Tool Functions
// ============================================================================

/// Medicines and dose records for a date, joined per medicine
pub fn get_daily_doses(db: &Database, user: &User, date: NaiveDate) -> Result<DailyDosesResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let medicines = Medicine::list(&conn, user.id)
        .map_err(|e| format!("Failed to list medicines: {}", e))?;
    let records = DoseRecord::list_for_date(&conn, user.id, date)
        .map_err(|e| format!("Failed to list dose records: {}", e))?;

    Ok(build_day(date, &medicines, &records))
}

/// Toggle one slot of a medicine on a date.
///
/// Marking a slot taken stamps `time` (`HH:MM`) or the current local time.
/// Only active slots can be toggled.
pub fn toggle_dose(
    db: &Database,
    user: &User,
    medicine_id: i64,
    date: NaiveDate,
    slot: &str,
    time: Option<&str>,
) -> Result<ToggleDoseResponse, String> {
    let slot = DoseSlot::parse(slot)
        .ok_or_else(|| format!("Invalid slot '{}', expected morning, midday or night", slot))?;
    let stamp = match time {
        Some(t) => parse_time(t)?,
        None => current_stamp(),
    };

    let mut conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let med = Medicine::get_by_id(&conn, user.id, medicine_id)
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| format!("Medicine not found with id: {}", medicine_id))?;

    if !med.doses.is_active(slot) {
        return Err(format!(
            "{} has no {} dose scheduled",
            med.name,
            slot.as_str()
        ));
    }

    let (record, outcome) = DoseRecord::toggle(&mut conn, med.id, date, slot, stamp)
        .map_err(|e| format!("Failed to toggle dose: {}", e))?;

    info!(
        medicine_id = med.id,
        date = %date,
        slot = slot.as_str(),
        taken = outcome.taken,
        created = outcome.created,
        "dose toggled"
    );
    drop(conn);

    let day = get_daily_doses(db, user, date)?;

    Ok(ToggleDoseResponse {
        medicine_id: med.id,
        slot: slot.as_str().to_string(),
        taken: outcome.taken,
        record_created: outcome.created,
        record: DoseRecordDetail::new(record, Some(med.name)),
        day,
    })
}

/// Set or clear the quantity actually given for one slot of a record
pub fn set_dose_quantity(
    db: &Database,
    user: &User,
    record_id: i64,
    slot: &str,
    quantity: Option<f64>,
) -> Result<Option<DoseRecordDetail>, String> {
    let slot = DoseSlot::parse(slot)
        .ok_or_else(|| format!("Invalid slot '{}', expected morning, midday or night", slot))?;
    if let Some(q) = quantity {
        if !q.is_finite() || q < 0.0 {
            return Err(format!("Quantity must be a non-negative number, got {}", q));
        }
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let updated = DoseRecord::set_quantity(&conn, user.id, record_id, slot, quantity)
        .map_err(|e| format!("Failed to set quantity: {}", e))?;

    let Some(record) = updated else {
        return Ok(None);
    };
    let name = Medicine::get_by_id(&conn, user.id, record.medicine_id)
        .map_err(|e| format!("Database error: {}", e))?
        .map(|m| m.name);

    Ok(Some(DoseRecordDetail::new(record, name)))
}

/// List dose records, optionally bounded by dates (inclusive)
pub fn list_dose_records(
    db: &Database,
    user: &User,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<ListDoseRecordsResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let names: HashMap<i64, String> = Medicine::list(&conn, user.id)
        .map_err(|e| format!("Failed to list medicines: {}", e))?
        .into_iter()
        .map(|m| (m.id, m.name))
        .collect();

    let records = DoseRecord::list(&conn, user.id, start, end)
        .map_err(|e| format!("Failed to list dose records: {}", e))?;

    let records: Vec<DoseRecordDetail> = records
        .into_iter()
        .map(|r| {
            let name = names.get(&r.medicine_id).cloned();
            DoseRecordDetail::new(r, name)
        })
        .collect();
    let total = records.len();

    Ok(ListDoseRecordsResponse { records, total })
}

/// Get a dose record by ID
pub fn get_dose_record(db: &Database, user: &User, id: i64) -> Result<Option<DoseRecordDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let Some(record) = DoseRecord::get_by_id(&conn, user.id, id)
        .map_err(|e| format!("Failed to get dose record: {}", e))?
    else {
        return Ok(None);
    };

    let name = Medicine::get_by_id(&conn, user.id, record.medicine_id)
        .map_err(|e| format!("Database error: {}", e))?
        .map(|m| m.name);

    Ok(Some(DoseRecordDetail::new(record, name)))
}

/// Delete a dose record
pub fn delete_dose_record(db: &Database, user: &User, id: i64) -> Result<Option<DeleteDoseRecordResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let deleted = DoseRecord::delete(&conn, user.id, id)
        .map_err(|e| format!("Failed to delete dose record: {}", e))?;

    if !deleted {
        return Ok(None);
    }

    info!(record_id = id, "dose record deleted");
    Ok(Some(DeleteDoseRecordResponse {
        success: true,
        deleted_id: id,
    }))
}
