//! Health record model
//!
//! Daily observations: condition and appetite ratings, notes, an importance
//! level and whether the day was a hospital visit. One record per date.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// Importance of a health record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    #[default]
    Low,
    Medium,
    High,
}

impl Importance {
    pub fn from_level(level: i64) -> Option<Self> {
        match level {
            1 => Some(Importance::Low),
            2 => Some(Importance::Medium),
            3 => Some(Importance::High),
            _ => None,
        }
    }

    pub fn level(&self) -> i64 {
        match self {
            Importance::Low => 1,
            Importance::Medium => 2,
            Importance::High => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Importance::Low => "low",
            Importance::Medium => "medium",
            Importance::High => "high",
        }
    }

    /// Medium and high records appear in the since-last-visit summary
    pub fn is_notable(&self) -> bool {
        *self >= Importance::Medium
    }
}

/// Label for a 1-5 condition or appetite rating
pub fn rating_label(rating: Option<u8>) -> &'static str {
    match rating {
        Some(1) => "very bad",
        Some(2) => "bad",
        Some(3) => "normal",
        Some(4) => "good",
        Some(5) => "very good",
        _ => "not recorded",
    }
}

/// A health record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthRecord {
    pub id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    pub condition: Option<u8>,
    pub appetite: Option<u8>,
    pub notes: Option<String>,
    pub importance: Importance,
    pub is_hospital_day: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// The full set of values saved for a date
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthRecordInput {
    pub condition: Option<u8>,
    pub appetite: Option<u8>,
    pub notes: Option<String>,
    pub importance: Importance,
    pub is_hospital_day: bool,
}

impl HealthRecord {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            date: row.get("date")?,
            condition: row.get("condition")?,
            appetite: row.get("appetite")?,
            notes: row.get("notes")?,
            importance: Importance::from_level(row.get("importance")?).unwrap_or_default(),
            is_hospital_day: row.get::<_, i32>("is_hospital_day")? != 0,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn get_by_id(conn: &Connection, user_id: i64, id: i64) -> DbResult<Option<Self>> {
        let result = conn
            .query_row(
                "SELECT * FROM health_records WHERE id = ?1 AND user_id = ?2",
                params![id, user_id],
                Self::from_row,
            )
            .optional()?;
        Ok(result)
    }

    pub fn get_by_date(conn: &Connection, user_id: i64, date: NaiveDate) -> DbResult<Option<Self>> {
        let result = conn
            .query_row(
                "SELECT * FROM health_records WHERE user_id = ?1 AND date = ?2",
                params![user_id, date],
                Self::from_row,
            )
            .optional()?;
        Ok(result)
    }

    /// List a user's records in date order, optionally bounded (inclusive)
    pub fn list(
        conn: &Connection,
        user_id: i64,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> DbResult<Vec<Self>> {
        let mut sql = String::from("SELECT * FROM health_records WHERE user_id = ?1");
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        params_vec.push(Box::new(user_id));

        if let Some(start) = start {
            params_vec.push(Box::new(start));
            sql.push_str(&format!(" AND date >= ?{}", params_vec.len()));
        }

        if let Some(end) = end {
            params_vec.push(Box::new(end));
            sql.push_str(&format!(" AND date <= ?{}", params_vec.len()));
        }

        sql.push_str(" ORDER BY date");

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();

        let records = stmt
            .query_map(params_refs.as_slice(), Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Create the record for a date, or overwrite the existing one.
    /// Returns the stored record and whether it was newly created.
    pub fn save(
        conn: &Connection,
        user_id: i64,
        date: NaiveDate,
        data: &HealthRecordInput,
    ) -> DbResult<(Self, bool)> {
        let created = Self::get_by_date(conn, user_id, date)?.is_none();

        conn.execute(
            r#"
            INSERT INTO health_records (user_id, date, condition, appetite, notes, importance, is_hospital_day)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(user_id, date) DO UPDATE SET
                condition = excluded.condition,
                appetite = excluded.appetite,
                notes = excluded.notes,
                importance = excluded.importance,
                is_hospital_day = excluded.is_hospital_day,
                updated_at = datetime('now')
            "#,
            params![
                user_id,
                date,
                data.condition,
                data.appetite,
                data.notes,
                data.importance.level(),
                data.is_hospital_day,
            ],
        )?;

        let record = Self::get_by_date(conn, user_id, date)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })?;
        Ok((record, created))
    }

    pub fn delete(conn: &Connection, user_id: i64, id: i64) -> DbResult<bool> {
        let rows = conn.execute(
            "DELETE FROM health_records WHERE id = ?1 AND user_id = ?2",
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

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn test_save_creates_then_updates() {
        let conn = test_connection();
        let user = User::create(&conn, "Owner", "owner@example.com").unwrap();

        let (first, created) = HealthRecord::save(
            &conn,
            user.id,
            date(4),
            &HealthRecordInput {
                condition: Some(3),
                notes: Some("Sneezing".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(created);
        assert_eq!(first.importance, Importance::Low);

        let (second, created) = HealthRecord::save(
            &conn,
            user.id,
            date(4),
            &HealthRecordInput {
                condition: Some(2),
                importance: Importance::High,
                is_hospital_day: true,
                ..Default::default()
            },
        )
        .unwrap();
        assert!(!created);
        assert_eq!(second.id, first.id);
        assert_eq!(second.condition, Some(2));
        assert_eq!(second.notes, None);
        assert!(second.is_hospital_day);
        assert_eq!(HealthRecord::list(&conn, user.id, None, None).unwrap().len(), 1);
    }

    #[test]
    fn test_list_range_in_date_order() {
        let conn = test_connection();
        let user = User::create(&conn, "Owner", "owner@example.com").unwrap();
        for d in [10, 2, 20] {
            HealthRecord::save(&conn, user.id, date(d), &HealthRecordInput::default()).unwrap();
        }

        let all = HealthRecord::list(&conn, user.id, None, None).unwrap();
        let dates: Vec<_> = all.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![date(2), date(10), date(20)]);

        let bounded = HealthRecord::list(&conn, user.id, Some(date(3)), Some(date(10))).unwrap();
        assert_eq!(bounded.len(), 1);
        assert_eq!(bounded[0].date, date(10));
    }

    #[test]
    fn test_rating_out_of_range_rejected_by_schema() {
        let conn = test_connection();
        let user = User::create(&conn, "Owner", "owner@example.com").unwrap();
        let result = HealthRecord::save(
            &conn,
            user.id,
            date(1),
            &HealthRecordInput {
                appetite: Some(6),
                ..Default::default()
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_labels_and_importance_levels() {
        assert_eq!(rating_label(Some(5)), "very good");
        assert_eq!(rating_label(None), "not recorded");
        assert_eq!(Importance::from_level(2), Some(Importance::Medium));
        assert_eq!(Importance::from_level(4), None);
        assert!(Importance::High.is_notable());
        assert!(!Importance::Low.is_notable());
    }
}
