//! User model
//!
//! The owner of medicines and health records.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// A registered user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: String,
}

impl User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            email: row.get("email")?,
            created_at: row.get("created_at")?,
        })
    }

    /// Create a new user. Fails on a duplicate e-mail.
    pub fn create(conn: &Connection, name: &str, email: &str) -> DbResult<Self> {
        conn.execute(
            "INSERT INTO users (name, email) VALUES (?1, ?2)",
            params![name, email],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM users WHERE id = ?1")?;

        match stmt.query_row([id], Self::from_row) {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// E-mail lookup is case-insensitive
    pub fn get_by_email(conn: &Connection, email: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM users WHERE email = ?1")?;

        match stmt.query_row([email], Self::from_row) {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::test_connection;

    #[test]
    fn test_create_and_lookup() {
        let conn = test_connection();
        let user = User::create(&conn, "Yotsu's owner", "owner@example.com").unwrap();

        assert_eq!(User::get_by_id(&conn, user.id).unwrap(), Some(user.clone()));
        assert_eq!(
            User::get_by_email(&conn, "OWNER@example.com").unwrap(),
            Some(user)
        );
        assert!(User::get_by_email(&conn, "nobody@example.com").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let conn = test_connection();
        User::create(&conn, "A", "a@example.com").unwrap();
        assert!(User::create(&conn, "B", "a@example.com").is_err());
    }
}
