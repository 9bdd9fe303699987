//! Medicine model
//!
//! A medicine definition with a dose quantity for each daily slot.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use crate::schedule::{DoseSlot, PerSlot};

/// A medicine record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medicine {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub unit: String,
    /// Quantity per slot; `None` or 0 means the slot is not scheduled
    pub doses: PerSlot<Option<f64>>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a new medicine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicineCreate {
    pub name: String,
    pub unit: String,
    pub doses: PerSlot<Option<f64>>,
}

/// Data for updating a medicine; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MedicineUpdate {
    pub name: Option<String>,
    pub unit: Option<String>,
    pub morning_dose: Option<f64>,
    pub midday_dose: Option<f64>,
    pub night_dose: Option<f64>,
}

impl MedicineUpdate {
    pub fn dose(&self, slot: DoseSlot) -> Option<f64> {
        match slot {
            DoseSlot::Morning => self.morning_dose,
            DoseSlot::Midday => self.midday_dose,
            DoseSlot::Night => self.night_dose,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.unit.is_none()
            && DoseSlot::ALL.iter().all(|s| self.dose(*s).is_none())
    }
}

fn dose_column(slot: DoseSlot) -> &'static str {
    match slot {
        DoseSlot::Morning => "morning_dose",
        DoseSlot::Midday => "midday_dose",
        DoseSlot::Night => "night_dose",
    }
}

impl Medicine {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            name: row.get("name")?,
            unit: row.get("unit")?,
            doses: PerSlot::new(
                row.get("morning_dose")?,
                row.get("midday_dose")?,
                row.get("night_dose")?,
            ),
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Quantity for a slot, if the slot is scheduled
    pub fn active_dose(&self, slot: DoseSlot) -> Option<f64> {
        if self.doses.is_active(slot) {
            *self.doses.get(slot)
        } else {
            None
        }
    }

    /// Create a new medicine owned by `user_id`
    pub fn create(conn: &Connection, user_id: i64, data: &MedicineCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO medicines (user_id, name, unit, morning_dose, midday_dose, night_dose)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                user_id,
                data.name,
                data.unit,
                data.doses.morning,
                data.doses.midday,
                data.doses.night,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, user_id, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a medicine by ID
    pub fn get_by_id(conn: &Connection, user_id: i64, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM medicines WHERE id = ?1 AND user_id = ?2")?;

        let result = stmt.query_row(params![id, user_id], Self::from_row);
        match result {
            Ok(med) => Ok(Some(med)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List a user's medicines by name
    pub fn list(conn: &Connection, user_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt =
            conn.prepare("SELECT * FROM medicines WHERE user_id = ?1 ORDER BY name, id")?;
        let meds = stmt
            .query_map([user_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(meds)
    }

    /// Update a medicine
    pub fn update(
        conn: &Connection,
        user_id: i64,
        id: i64,
        data: &MedicineUpdate,
    ) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref name) = data.name {
            params_vec.push(Box::new(name.clone()));
            updates.push(format!("name = ?{}", params_vec.len()));
        }
        if let Some(ref unit) = data.unit {
            params_vec.push(Box::new(unit.clone()));
            updates.push(format!("unit = ?{}", params_vec.len()));
        }
        for slot in DoseSlot::ALL {
            if let Some(dose) = data.dose(slot) {
                params_vec.push(Box::new(dose));
                updates.push(format!("{} = ?{}", dose_column(slot), params_vec.len()));
            }
        }

        if updates.is_empty() {
            return Self::get_by_id(conn, user_id, id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        params_vec.push(Box::new(id));
        let id_idx = params_vec.len();
        params_vec.push(Box::new(user_id));
        let user_idx = params_vec.len();

        let sql = format!(
            "UPDATE medicines SET {} WHERE id = ?{} AND user_id = ?{}",
            updates.join(", "),
            id_idx,
            user_idx
        );

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, user_id, id)
    }

    /// Delete a medicine; its dose records are removed by cascade
    pub fn delete(conn: &Connection, user_id: i64, id: i64) -> DbResult<bool> {
        let rows = conn.execute(
            "DELETE FROM medicines WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::test_connection;
    use crate::models::User;

    fn owner(conn: &Connection) -> i64 {
        User::create(conn, "Owner", "owner@example.com").unwrap().id
    }

    fn create_a(conn: &Connection, user_id: i64) -> Medicine {
        Medicine::create(
            conn,
            user_id,
            &MedicineCreate {
                name: "A".to_string(),
                unit: "tablet".to_string(),
                doses: PerSlot::new(Some(1.0), Some(0.0), Some(0.5)),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_create_and_get() {
        let conn = test_connection();
        let user_id = owner(&conn);
        let med = create_a(&conn, user_id);

        assert_eq!(med.name, "A");
        assert_eq!(med.doses, PerSlot::new(Some(1.0), Some(0.0), Some(0.5)));
        assert_eq!(med.active_dose(DoseSlot::Morning), Some(1.0));
        assert_eq!(med.active_dose(DoseSlot::Midday), None);

        let fetched = Medicine::get_by_id(&conn, user_id, med.id).unwrap().unwrap();
        assert_eq!(fetched.unit, "tablet");
    }

    #[test]
    fn test_other_users_cannot_see_medicine() {
        let conn = test_connection();
        let user_id = owner(&conn);
        let other = User::create(&conn, "Other", "other@example.com").unwrap().id;
        let med = create_a(&conn, user_id);

        assert!(Medicine::get_by_id(&conn, other, med.id).unwrap().is_none());
        assert!(Medicine::list(&conn, other).unwrap().is_empty());
        assert!(!Medicine::delete(&conn, other, med.id).unwrap());
    }

    #[test]
    fn test_partial_update() {
        let conn = test_connection();
        let user_id = owner(&conn);
        let med = create_a(&conn, user_id);

        let updated = Medicine::update(
            &conn,
            user_id,
            med.id,
            &MedicineUpdate {
                midday_dose: Some(2.0),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();

        assert_eq!(updated.name, "A");
        assert_eq!(updated.doses, PerSlot::new(Some(1.0), Some(2.0), Some(0.5)));
    }

    #[test]
    fn test_delete() {
        let conn = test_connection();
        let user_id = owner(&conn);
        let med = create_a(&conn, user_id);
        assert_eq!(Medicine::list(&conn, user_id).unwrap().len(), 1);
        assert!(Medicine::delete(&conn, user_id, med.id).unwrap());
        assert!(Medicine::list(&conn, user_id).unwrap().is_empty());
        assert!(!Medicine::delete(&conn, user_id, med.id).unwrap());
    }
}
