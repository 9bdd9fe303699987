//! Dose record model
//!
//! Taken flags, stamped times and quantity overrides for one medicine on one
//! date. There is at most one record per (medicine, date).

use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use crate::schedule::{toggle_slot, DoseMarks, DoseSlot, PerSlot, ToggleOutcome};

/// A dose record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoseRecord {
    pub id: i64,
    pub medicine_id: i64,
    pub dose_date: NaiveDate,
    pub taken: PerSlot<bool>,
    pub times: PerSlot<Option<NaiveTime>>,
    /// Quantity actually given, when it differs from the medicine's dose
    pub quantities: PerSlot<Option<f64>>,
    pub created_at: String,
    pub updated_at: String,
}

/// Ownership check shared by the user-scoped queries
const OWNED: &str = "medicine_id IN (SELECT id FROM medicines WHERE user_id = ?1)";

impl DoseRecord {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            medicine_id: row.get("medicine_id")?,
            dose_date: row.get("dose_date")?,
            taken: PerSlot::new(
                row.get::<_, i32>("morning_taken")? != 0,
                row.get::<_, i32>("midday_taken")? != 0,
                row.get::<_, i32>("night_taken")? != 0,
            ),
            times: PerSlot::new(
                row.get("morning_time")?,
                row.get("midday_time")?,
                row.get("night_time")?,
            ),
            quantities: PerSlot::new(
                row.get("morning_quantity")?,
                row.get("midday_quantity")?,
                row.get("night_quantity")?,
            ),
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn marks(&self) -> DoseMarks {
        DoseMarks {
            taken: self.taken,
            times: self.times,
        }
    }

    /// Get a dose record by ID, if it belongs to one of the user's medicines
    pub fn get_by_id(conn: &Connection, user_id: i64, id: i64) -> DbResult<Option<Self>> {
        let sql = format!("SELECT * FROM dose_records WHERE {} AND id = ?2", OWNED);
        let result = conn
            .query_row(&sql, params![user_id, id], Self::from_row)
            .optional()?;
        Ok(result)
    }

    /// Find the record for a (medicine, date) pair
    pub fn find(conn: &Connection, medicine_id: i64, date: NaiveDate) -> DbResult<Option<Self>> {
        let result = conn
            .query_row(
                "SELECT * FROM dose_records WHERE medicine_id = ?1 AND dose_date = ?2",
                params![medicine_id, date],
                Self::from_row,
            )
            .optional()?;
        Ok(result)
    }

    /// List the user's dose records in date order, optionally bounded (inclusive)
    pub fn list(
        conn: &Connection,
        user_id: i64,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> DbResult<Vec<Self>> {
        let mut sql = format!("SELECT * FROM dose_records WHERE {}", OWNED);
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        params_vec.push(Box::new(user_id));

        if let Some(start) = start {
            params_vec.push(Box::new(start));
            sql.push_str(&format!(" AND dose_date >= ?{}", params_vec.len()));
        }

        if let Some(end) = end {
            params_vec.push(Box::new(end));
            sql.push_str(&format!(" AND dose_date <= ?{}", params_vec.len()));
        }

        sql.push_str(" ORDER BY dose_date, medicine_id");

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();

        let records = stmt
            .query_map(params_refs.as_slice(), Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// List the user's dose records for one date
    pub fn list_for_date(conn: &Connection, user_id: i64, date: NaiveDate) -> DbResult<Vec<Self>> {
        Self::list(conn, user_id, Some(date), Some(date))
    }

    /// Toggle one slot for (medicine, date), updating in place or creating
    /// the record. Runs in a transaction so the lookup and write agree.
    pub fn toggle(
        conn: &mut Connection,
        medicine_id: i64,
        date: NaiveDate,
        slot: DoseSlot,
        stamp: NaiveTime,
    ) -> DbResult<(Self, ToggleOutcome)> {
        let tx = conn.transaction()?;

        let existing = Self::find(&tx, medicine_id, date)?;
        let outcome = toggle_slot(existing.as_ref().map(|r| r.marks()).as_ref(), slot, stamp);
        let marks = &outcome.marks;

        match existing {
            Some(record) => {
                tx.execute(
                    r#"
                    UPDATE dose_records SET
                        morning_taken = ?1, midday_taken = ?2, night_taken = ?3,
                        morning_time = ?4, midday_time = ?5, night_time = ?6,
                        updated_at = datetime('now')
                    WHERE id = ?7
                    "#,
                    params![
                        marks.taken.morning,
                        marks.taken.midday,
                        marks.taken.night,
                        marks.times.morning,
                        marks.times.midday,
                        marks.times.night,
                        record.id,
                    ],
                )?;
            }
            None => {
                tx.execute(
                    r#"
                    INSERT INTO dose_records (
                        medicine_id, dose_date,
                        morning_taken, midday_taken, night_taken,
                        morning_time, midday_time, night_time
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    "#,
                    params![
                        medicine_id,
                        date,
                        marks.taken.morning,
                        marks.taken.midday,
                        marks.taken.night,
                        marks.times.morning,
                        marks.times.midday,
                        marks.times.night,
                    ],
                )?;
            }
        }

        let record = Self::find(&tx, medicine_id, date)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })?;
        tx.commit()?;

        Ok((record, outcome))
    }

    /// Set (or clear) the recorded quantity for one slot
    pub fn set_quantity(
        conn: &Connection,
        user_id: i64,
        id: i64,
        slot: DoseSlot,
        quantity: Option<f64>,
    ) -> DbResult<Option<Self>> {
        let column = match slot {
            DoseSlot::Morning => "morning_quantity",
            DoseSlot::Midday => "midday_quantity",
            DoseSlot::Night => "night_quantity",
        };
        let sql = format!(
            "UPDATE dose_records SET {} = ?3, updated_at = datetime('now') WHERE {} AND id = ?2",
            column, OWNED
        );
        conn.execute(&sql, params![user_id, id, quantity])?;

        Self::get_by_id(conn, user_id, id)
    }

    pub fn delete(conn: &Connection, user_id: i64, id: i64) -> DbResult<bool> {
        let sql = format!("DELETE FROM dose_records WHERE {} AND id = ?2", OWNED);
        let rows = conn.execute(&sql, params![user_id, id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::test_connection;
    use crate::models::{Medicine, MedicineCreate, User};

    fn setup(conn: &Connection) -> (i64, Medicine) {
        let user = User::create(conn, "Owner", "owner@example.com").unwrap();
        let med = Medicine::create(
            conn,
            user.id,
            &MedicineCreate {
                name: "A".to_string(),
                unit: "tablet".to_string(),
                doses: PerSlot::new(Some(1.0), Some(0.0), Some(0.5)),
            },
        )
        .unwrap();
        (user.id, med)
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 9).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_first_toggle_creates_single_record() {
        let mut conn = test_connection();
        let (user_id, med) = setup(&conn);

        let (record, outcome) =
            DoseRecord::toggle(&mut conn, med.id, day(), DoseSlot::Morning, t(8, 5)).unwrap();

        assert!(outcome.created);
        assert_eq!(record.taken, PerSlot::new(true, false, false));
        assert_eq!(record.times.morning, Some(t(8, 5)));
        assert_eq!(DoseRecord::list_for_date(&conn, user_id, day()).unwrap().len(), 1);
    }

    #[test]
    fn test_second_toggle_updates_in_place() {
        let mut conn = test_connection();
        let (user_id, med) = setup(&conn);

        let (first, _) =
            DoseRecord::toggle(&mut conn, med.id, day(), DoseSlot::Morning, t(8, 5)).unwrap();
        let (second, outcome) =
            DoseRecord::toggle(&mut conn, med.id, day(), DoseSlot::Night, t(21, 0)).unwrap();

        assert!(!outcome.created);
        assert_eq!(first.id, second.id);
        assert_eq!(second.taken, PerSlot::new(true, false, true));
        assert_eq!(DoseRecord::list_for_date(&conn, user_id, day()).unwrap().len(), 1);
    }

    #[test]
    fn test_untoggle_keeps_time_and_other_slots() {
        let mut conn = test_connection();
        let (_, med) = setup(&conn);

        DoseRecord::toggle(&mut conn, med.id, day(), DoseSlot::Morning, t(8, 5)).unwrap();
        DoseRecord::toggle(&mut conn, med.id, day(), DoseSlot::Night, t(21, 0)).unwrap();
        let (record, outcome) =
            DoseRecord::toggle(&mut conn, med.id, day(), DoseSlot::Night, t(22, 0)).unwrap();

        assert!(!outcome.taken);
        assert_eq!(record.taken, PerSlot::new(true, false, false));
        assert_eq!(record.times, PerSlot::new(Some(t(8, 5)), None, Some(t(21, 0))));
    }

    #[test]
    fn test_set_quantity_and_delete() {
        let mut conn = test_connection();
        let (user_id, med) = setup(&conn);
        let (record, _) =
            DoseRecord::toggle(&mut conn, med.id, day(), DoseSlot::Morning, t(8, 5)).unwrap();

        let updated = DoseRecord::set_quantity(&conn, user_id, record.id, DoseSlot::Morning, Some(0.5))
            .unwrap()
            .unwrap();
        assert_eq!(updated.quantities.morning, Some(0.5));
        assert_eq!(updated.taken, record.taken);

        assert!(DoseRecord::delete(&conn, user_id, record.id).unwrap());
        assert!(DoseRecord::get_by_id(&conn, user_id, record.id).unwrap().is_none());
    }

    #[test]
    fn test_deleting_medicine_cascades() {
        let mut conn = test_connection();
        let (user_id, med) = setup(&conn);
        DoseRecord::toggle(&mut conn, med.id, day(), DoseSlot::Morning, t(8, 5)).unwrap();

        Medicine::delete(&conn, user_id, med.id).unwrap();
        assert!(DoseRecord::find(&conn, med.id, day()).unwrap().is_none());
    }

    #[test]
    fn test_records_scoped_to_owner() {
        let mut conn = test_connection();
        let (_, med) = setup(&conn);
        let other = User::create(&conn, "Other", "other@example.com").unwrap();
        let (record, _) =
            DoseRecord::toggle(&mut conn, med.id, day(), DoseSlot::Morning, t(8, 5)).unwrap();

        assert!(DoseRecord::get_by_id(&conn, other.id, record.id).unwrap().is_none());
        assert!(DoseRecord::list_for_date(&conn, other.id, day()).unwrap().is_empty());
    }
}
