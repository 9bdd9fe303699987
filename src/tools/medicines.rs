//! Medicine MCP Tools
//!
//! Tools for managing medicine definitions: a name, a unit label and a dose
//! quantity for each of the morning, midday and night slots.

use serde::Serialize;
use tracing::info;

use crate::db::Database;
use crate::models::{Medicine, MedicineCreate, MedicineUpdate, User};
use crate::schedule::{DoseSlot, PerSlot};

/// Medicine summary for listing
#[derive(Debug, Serialize)]
pub struct MedicineSummary {
    pub id: i64,
    pub name: String,
    pub unit: String,
    pub schedule: String,
}

/// Full medicine detail
#[derive(Debug, Serialize)]
pub struct MedicineDetail {
    pub id: i64,
    pub name: String,
    pub unit: String,
    pub morning_dose: Option<f64>,
    pub midday_dose: Option<f64>,
    pub night_dose: Option<f64>,
    pub active_slots: Vec<String>,
    pub schedule: String,
    pub created_at: String,
    pub updated_at: String,
}

/// "Morning 1 tablet, Night 0.5 tablet"
fn schedule_display(med: &Medicine) -> String {
    let parts: Vec<String> = med
        .doses
        .active_slots()
        .filter_map(|slot| {
            med.active_dose(slot)
                .map(|q| format!("{} {} {}", slot.display_name(), q, med.unit))
        })
        .collect();

    if parts.is_empty() {
        "No active slots".to_string()
    } else {
        parts.join(", ")
    }
}

impl From<&Medicine> for MedicineSummary {
    fn from(med: &Medicine) -> Self {
        Self {
            id: med.id,
            name: med.name.clone(),
            unit: med.unit.clone(),
            schedule: schedule_display(med),
        }
    }
}

impl From<Medicine> for MedicineDetail {
    fn from(med: Medicine) -> Self {
        let schedule = schedule_display(&med);
        let active_slots = med
            .doses
            .active_slots()
            .map(|s| s.as_str().to_string())
            .collect();
        Self {
            id: med.id,
            morning_dose: med.doses.morning,
            midday_dose: med.doses.midday,
            night_dose: med.doses.night,
            active_slots,
            schedule,
            name: med.name,
            unit: med.unit,
            created_at: med.created_at,
            updated_at: med.updated_at,
        }
    }
}

/// Response for list_medicines
#[derive(Debug, Serialize)]
pub struct ListMedicinesResponse {
    pub medicines: Vec<MedicineSummary>,
    pub total: usize,
}

/// Response for delete_medicine
#[derive(Debug, Serialize)]
pub struct DeleteMedicineResponse {
    pub success: bool,
    pub deleted_id: i64,
    pub dose_records_removed: i64,
}

// ============================================================================
// Validation
// ============================================================================

fn validate_dose(slot: DoseSlot, dose: Option<f64>) -> Result<(), String> {
    match dose {
        Some(q) if !q.is_finite() || q < 0.0 => Err(format!(
            "{} dose must be a non-negative number, got {}",
            slot.display_name(),
            q
        )),
        _ => Ok(()),
    }
}

fn validate_doses(doses: &PerSlot<Option<f64>>) -> Result<(), String> {
    for (slot, dose) in doses.iter() {
        validate_dose(slot, *dose)?;
    }
    if !doses.has_active_slot() {
        return Err("At least one of morning, midday or night dose must be greater than 0".to_string());
    }
    Ok(())
}

fn non_empty(value: &str, field: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(format!("Medicine {} cannot be empty", field))
    } else {
        Ok(trimmed.to_string())
    }
}

// ============================================================================
// Tool Functions
// ============================================================================

/// Add a new medicine
pub fn add_medicine(db: &Database, user: &User, data: MedicineCreate) -> Result<MedicineDetail, String> {
    let name = non_empty(&data.name, "name")?;
    let unit = non_empty(&data.unit, "unit")?;
    validate_doses(&data.doses)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let med = Medicine::create(
        &conn,
        user.id,
        &MedicineCreate {
            name,
            unit,
            doses: data.doses,
        },
    )
    .map_err(|e| format!("Failed to create medicine: {}", e))?;

    info!(medicine_id = med.id, user_id = user.id, "medicine added");
    Ok(MedicineDetail::from(med))
}

/// Get a medicine by ID
pub fn get_medicine(db: &Database, user: &User, id: i64) -> Result<Option<MedicineDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let med = Medicine::get_by_id(&conn, user.id, id)
        .map_err(|e| format!("Failed to get medicine: {}", e))?;

    Ok(med.map(MedicineDetail::from))
}

/// List the user's medicines
pub fn list_medicines(db: &Database, user: &User) -> Result<ListMedicinesResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let meds = Medicine::list(&conn, user.id)
        .map_err(|e| format!("Failed to list medicines: {}", e))?;

    let summaries: Vec<MedicineSummary> = meds.iter().map(MedicineSummary::from).collect();
    let total = summaries.len();

    Ok(ListMedicinesResponse {
        medicines: summaries,
        total,
    })
}

/// Update a medicine. Absent fields are unchanged; the result must still
/// have at least one active slot.
pub fn update_medicine(
    db: &Database,
    user: &User,
    id: i64,
    data: MedicineUpdate,
) -> Result<Option<MedicineDetail>, String> {
    if data.is_empty() {
        return Err("No fields to update".to_string());
    }

    let data = MedicineUpdate {
        name: data.name.as_deref().map(|n| non_empty(n, "name")).transpose()?,
        unit: data.unit.as_deref().map(|u| non_empty(u, "unit")).transpose()?,
        ..data
    };
    for slot in DoseSlot::ALL {
        validate_dose(slot, data.dose(slot))?;
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let existing = match Medicine::get_by_id(&conn, user.id, id)
        .map_err(|e| format!("Database error: {}", e))?
    {
        Some(med) => med,
        None => return Ok(None),
    };

    let mut merged = existing.doses;
    for slot in DoseSlot::ALL {
        if let Some(dose) = data.dose(slot) {
            *merged.get_mut(slot) = Some(dose);
        }
    }
    if !merged.has_active_slot() {
        return Err("Update would leave the medicine with no active dose slot".to_string());
    }

    let updated = Medicine::update(&conn, user.id, id, &data)
        .map_err(|e| format!("Failed to update medicine: {}", e))?;

    info!(medicine_id = id, "medicine updated");
    Ok(updated.map(MedicineDetail::from))
}

/// Delete a medicine and, by cascade, its dose records
pub fn delete_medicine(db: &Database, user: &User, id: i64) -> Result<Option<DeleteMedicineResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let record_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM dose_records WHERE medicine_id = ?1",
            [id],
            |row| row.get(0),
        )
        .map_err(|e| format!("Database error: {}", e))?;

    let deleted = Medicine::delete(&conn, user.id, id)
        .map_err(|e| format!("Failed to delete medicine: {}", e))?;

    if !deleted {
        return Ok(None);
    }

    info!(medicine_id = id, dose_records = record_count, "medicine deleted");
    Ok(Some(DeleteMedicineResponse {
        success: true,
        deleted_id: id,
        dose_records_removed: record_count,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_database;

    fn tablet(name: &str, m: f64, d: f64, n: f64) -> MedicineCreate {
        MedicineCreate {
            name: name.to_string(),
            unit: "tablet".to_string(),
            doses: PerSlot::new(Some(m), Some(d), Some(n)),
        }
    }

    #[test]
    fn test_add_trims_and_describes_schedule() {
        let (_dir, db, user) = test_database();
        let detail = add_medicine(
            &db,
            &user,
            MedicineCreate {
                name: "  Apoquel ".to_string(),
                ..tablet("", 1.0, 0.0, 0.5)
            },
        )
        .unwrap();

        assert_eq!(detail.name, "Apoquel");
        assert_eq!(detail.active_slots, vec!["morning", "night"]);
        assert_eq!(detail.schedule, "Morning 1 tablet, Night 0.5 tablet");
    }

    #[test]
    fn test_add_rejects_invalid_input() {
        let (_dir, db, user) = test_database();
        assert!(add_medicine(&db, &user, tablet(" ", 1.0, 0.0, 0.0)).is_err());
        assert!(add_medicine(&db, &user, tablet("A", -1.0, 0.0, 0.0)).is_err());
        assert!(add_medicine(&db, &user, tablet("A", 0.0, 0.0, 0.0)).is_err());
        assert_eq!(list_medicines(&db, &user).unwrap().total, 0);
    }

    #[test]
    fn test_update_must_keep_an_active_slot() {
        let (_dir, db, user) = test_database();
        let med = add_medicine(&db, &user, tablet("A", 1.0, 0.0, 0.0)).unwrap();

        let err = update_medicine(
            &db,
            &user,
            med.id,
            MedicineUpdate {
                morning_dose: Some(0.0),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(err.contains("no active dose slot"));

        let updated = update_medicine(
            &db,
            &user,
            med.id,
            MedicineUpdate {
                morning_dose: Some(0.0),
                night_dose: Some(2.0),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
        assert_eq!(updated.active_slots, vec!["night"]);
    }

    #[test]
    fn test_update_and_delete_unknown_medicine() {
        let (_dir, db, user) = test_database();
        let update = MedicineUpdate {
            name: Some("B".to_string()),
            ..Default::default()
        };
        assert!(update_medicine(&db, &user, 99, update).unwrap().is_none());
        assert!(delete_medicine(&db, &user, 99).unwrap().is_none());
        assert!(get_medicine(&db, &user, 99).unwrap().is_none());
    }

    #[test]
    fn test_list_is_sorted_by_name() {
        let (_dir, db, user) = test_database();
        add_medicine(&db, &user, tablet("Zonisamide", 1.0, 0.0, 1.0)).unwrap();
        add_medicine(&db, &user, tablet("Amoxicillin", 0.0, 1.0, 0.0)).unwrap();

        let list = list_medicines(&db, &user).unwrap();
        let names: Vec<_> = list.medicines.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Amoxicillin", "Zonisamide"]);
    }
}
