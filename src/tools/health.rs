//! Health Record MCP Tools
//!
//! Daily observations for the pet. Saving a date creates its record or
//! overwrites the existing one.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::db::Database;
use crate::models::{rating_label, HealthRecord, HealthRecordInput, Importance, User};
use crate::schedule::important_since_last_visit;

use super::format_date;

/// Full health record detail
#[derive(Debug, Serialize)]
pub struct HealthRecordDetail {
    pub id: i64,
    pub date: String,
    pub condition: Option<u8>,
    pub condition_label: String,
    pub appetite: Option<u8>,
    pub appetite_label: String,
    pub notes: Option<String>,
    pub importance: i64,
    pub importance_label: String,
    pub is_hospital_day: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<HealthRecord> for HealthRecordDetail {
    fn from(record: HealthRecord) -> Self {
        Self {
            id: record.id,
            date: format_date(record.date),
            condition: record.condition,
            condition_label: rating_label(record.condition).to_string(),
            appetite: record.appetite,
            appetite_label: rating_label(record.appetite).to_string(),
            notes: record.notes,
            importance: record.importance.level(),
            importance_label: record.importance.as_str().to_string(),
            is_hospital_day: record.is_hospital_day,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Response for save_health_record
#[derive(Debug, Serialize)]
pub struct SaveHealthRecordResponse {
    pub created: bool,
    pub record: HealthRecordDetail,
    /// Summary re-read after the write
    pub important: ImportantRecordsResponse,
}

/// Response for list_health_records
#[derive(Debug, Serialize)]
pub struct ListHealthRecordsResponse {
    pub records: Vec<HealthRecordDetail>,
    pub total: usize,
}

/// Response for important_since_hospital_visit
#[derive(Debug, Serialize)]
pub struct ImportantRecordsResponse {
    pub last_hospital_visit: Option<HealthRecordDetail>,
    pub important_records: Vec<HealthRecordDetail>,
    pub count: usize,
}

/// Response for delete_health_record
#[derive(Debug, Serialize)]
pub struct DeleteHealthRecordResponse {
    pub success: bool,
    pub deleted_id: i64,
}

/// Raw values for save_health_record before validation
#[derive(Debug, Clone, Default)]
pub struct HealthRecordFields {
    pub condition: Option<i64>,
    pub appetite: Option<i64>,
    pub notes: Option<String>,
    pub importance: Option<i64>,
    pub is_hospital_day: bool,
}

fn validate_rating(value: Option<i64>, field: &str) -> Result<Option<u8>, String> {
    match value {
        None => Ok(None),
        Some(v @ 1..=5) => Ok(Some(v as u8)),
        Some(v) => Err(format!("{} must be between 1 and 5, got {}", field, v)),
    }
}

impl HealthRecordFields {
    fn validate(self) -> Result<HealthRecordInput, String> {
        let importance = match self.importance {
            None => Importance::default(),
            Some(level) => Importance::from_level(level)
                .ok_or_else(|| format!("Importance must be 1 (low), 2 (medium) or 3 (high), got {}", level))?,
        };

        Ok(HealthRecordInput {
            condition: validate_rating(self.condition, "Condition")?,
            appetite: validate_rating(self.appetite, "Appetite")?,
            notes: self
                .notes
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            importance,
            is_hospital_day: self.is_hospital_day,
        })
    }
}

fn load_important(conn: &rusqlite::Connection, user: &User) -> Result<ImportantRecordsResponse, String> {
    let records = HealthRecord::list(conn, user.id, None, None)
        .map_err(|e| format!("Failed to list health records: {}", e))?;

    let summary = important_since_last_visit(&records);
    let important_records: Vec<HealthRecordDetail> = summary
        .important_records
        .into_iter()
        .map(HealthRecordDetail::from)
        .collect();

    Ok(ImportantRecordsResponse {
        last_hospital_visit: summary.last_hospital_visit.map(HealthRecordDetail::from),
        count: important_records.len(),
        important_records,
    })
}

// ============================================================================
// Tool Functions
// ============================================================================

/// Create or overwrite the health record for a date
pub fn save_health_record(
    db: &Database,
    user: &User,
    date: NaiveDate,
    fields: HealthRecordFields,
) -> Result<SaveHealthRecordResponse, String> {
    let input = fields.validate()?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let (record, created) = HealthRecord::save(&conn, user.id, date, &input)
        .map_err(|e| format!("Failed to save health record: {}", e))?;

    info!(record_id = record.id, date = %date, created, "health record saved");

    let important = load_important(&conn, user)?;

    Ok(SaveHealthRecordResponse {
        created,
        record: HealthRecordDetail::from(record),
        important,
    })
}

/// Get the health record for a date
pub fn get_health_record_by_date(
    db: &Database,
    user: &User,
    date: NaiveDate,
) -> Result<Option<HealthRecordDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let record = HealthRecord::get_by_date(&conn, user.id, date)
        .map_err(|e| format!("Failed to get health record: {}", e))?;

    Ok(record.map(HealthRecordDetail::from))
}

/// Get a health record by ID
pub fn get_health_record_by_id(db: &Database, user: &User, id: i64) -> Result<Option<HealthRecordDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let record = HealthRecord::get_by_id(&conn, user.id, id)
        .map_err(|e| format!("Failed to get health record: {}", e))?;

    Ok(record.map(HealthRecordDetail::from))
}

/// List health records, optionally bounded by dates (inclusive)
pub fn list_health_records(
    db: &Database,
    user: &User,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<ListHealthRecordsResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let records: Vec<HealthRecordDetail> = HealthRecord::list(&conn, user.id, start, end)
        .map_err(|e| format!("Failed to list health records: {}", e))?
        .into_iter()
        .map(HealthRecordDetail::from)
        .collect();
    let total = records.len();

    Ok(ListHealthRecordsResponse { records, total })
}

/// Delete a health record
pub fn delete_health_record(
    db: &Database,
    user: &User,
    id: i64,
) -> Result<Option<DeleteHealthRecordResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let deleted = HealthRecord::delete(&conn, user.id, id)
        .map_err(|e| format!("Failed to delete health record: {}", e))?;

    if !deleted {
        return Ok(None);
    }

    info!(record_id = id, "health record deleted");
    Ok(Some(DeleteHealthRecordResponse {
        success: true,
        deleted_id: id,
    }))
}

/// Medium and high importance records since the last hospital visit
pub fn important_since_hospital_visit(db: &Database, user: &User) -> Result<ImportantRecordsResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    load_important(&conn, user)
}
