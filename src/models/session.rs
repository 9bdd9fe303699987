//! Session persistence
//!
//! Issued bearer tokens, plus the single persisted "active" session that is
//! restored when the server starts.

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::User;
use crate::db::DbResult;

/// Bearer tokens issued to users
pub struct SessionToken;

impl SessionToken {
    /// Issue a new token for a user
    pub fn issue(conn: &Connection, user_id: i64) -> DbResult<String> {
        let token = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO sessions (token, user_id) VALUES (?1, ?2)",
            params![token, user_id],
        )?;
        Ok(token)
    }

    /// Resolve a token to its user, if the token is still known
    pub fn verify(conn: &Connection, token: &str) -> DbResult<Option<User>> {
        let user_id: Option<i64> = conn
            .query_row(
                "SELECT user_id FROM sessions WHERE token = ?1",
                [token],
                |row| row.get(0),
            )
            .optional()?;

        match user_id {
            Some(id) => User::get_by_id(conn, id),
            None => Ok(None),
        }
    }

    pub fn revoke(conn: &Connection, token: &str) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM sessions WHERE token = ?1", [token])?;
        Ok(rows > 0)
    }
}

/// The persisted token and user snapshot (single row table)
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSession {
    pub token: String,
    pub user: User,
}

impl StoredSession {
    /// Read the persisted session. A row whose user snapshot no longer
    /// parses is treated as absent.
    pub fn load(conn: &Connection) -> DbResult<Option<Self>> {
        let row: Option<(String, String)> = conn
            .query_row(
                "SELECT token, user_json FROM active_session WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        Ok(row.and_then(|(token, user_json)| {
            serde_json::from_str::<User>(&user_json)
                .ok()
                .map(|user| Self { token, user })
        }))
    }

    /// Persist (upsert) the active session
    pub fn save(conn: &Connection, token: &str, user: &User) -> DbResult<()> {
        // Cannot fail: User holds only strings and integers
        let user_json = serde_json::to_string(user).unwrap_or_default();
        conn.execute(
            r#"
            INSERT INTO active_session (id, token, user_json)
            VALUES (1, ?1, ?2)
            ON CONFLICT(id) DO UPDATE SET
                token = excluded.token,
                user_json = excluded.user_json,
                updated_at = datetime('now')
            "#,
            params![token, user_json],
        )?;
        Ok(())
    }

    pub fn clear(conn: &Connection) -> DbResult<()> {
        conn.execute("DELETE FROM active_session", [])?;
        Ok(())
    }
}
