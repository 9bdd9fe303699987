//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;

use super::connection::DbResult;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
    }

    Ok(())
}

/// Migration v1: Initial schema
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- USERS & SESSIONS
        -- ============================================
        CREATE TABLE users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE COLLATE NOCASE,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE sessions (
            token TEXT PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Single row: the session restored on startup
        CREATE TABLE active_session (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            token TEXT NOT NULL,
            user_json TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- ============================================
        -- MEDICINES
        -- Dose quantities per slot; NULL or 0 means the slot is inactive
        -- ============================================
        CREATE TABLE medicines (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            unit TEXT NOT NULL,
            morning_dose REAL CHECK (morning_dose IS NULL OR morning_dose >= 0),
            midday_dose REAL CHECK (midday_dose IS NULL OR midday_dose >= 0),
            night_dose REAL CHECK (night_dose IS NULL OR night_dose >= 0),
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_medicines_user ON medicines(user_id);

        -- ============================================
        -- DOSE RECORDS
        -- One row per (medicine, date)
        -- ============================================
        CREATE TABLE dose_records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            medicine_id INTEGER NOT NULL REFERENCES medicines(id) ON DELETE CASCADE,
            dose_date TEXT NOT NULL,             -- ISO date: "2025-01-09"

            morning_taken INTEGER NOT NULL DEFAULT 0,
            midday_taken INTEGER NOT NULL DEFAULT 0,
            night_taken INTEGER NOT NULL DEFAULT 0,

            morning_time TEXT,                   -- "HH:MM:SS"
            midday_time TEXT,
            night_time TEXT,

            morning_quantity REAL,
            midday_quantity REAL,
            night_quantity REAL,

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),

            UNIQUE(medicine_id, dose_date)
        );

        CREATE INDEX idx_dose_records_date ON dose_records(dose_date);

        -- ============================================
        -- HEALTH RECORDS
        -- One row per (user, date)
        -- ============================================
        CREATE TABLE health_records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            date TEXT NOT NULL,
            condition INTEGER CHECK (condition IS NULL OR condition BETWEEN 1 AND 5),
            appetite INTEGER CHECK (appetite IS NULL OR appetite BETWEEN 1 AND 5),
            notes TEXT,
            importance INTEGER NOT NULL DEFAULT 1 CHECK (importance BETWEEN 1 AND 3),
            is_hospital_day INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),

            UNIQUE(user_id, date)
        );

        CREATE INDEX idx_health_records_date ON health_records(date);
        "#,
    )?;

    Ok(())
}

/// Get the current schema version
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);
    Ok(version)
}

/// Check if the database needs migration
pub fn needs_migration(conn: &Connection) -> DbResult<bool> {
    let current = get_schema_version(conn)?;
    Ok(current < SCHEMA_VERSION)
}

/// In-memory connection with the full schema, for unit tests
#[cfg(test)]
pub fn test_connection() -> Connection {
    let conn = Connection::open_in_memory().expect("open in-memory db");
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .expect("enable foreign keys");
    run_migrations(&conn).expect("run migrations");
    conn
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(needs_migration(&conn).is_ok());
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
        assert!(!needs_migration(&conn).unwrap());
    }

    #[test]
    fn test_dose_records_unique_per_medicine_and_date() {
        let conn = test_connection();
        conn.execute(
            "INSERT INTO users (name, email) VALUES ('Owner', 'owner@example.com')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO medicines (user_id, name, unit, morning_dose) VALUES (1, 'A', 'tab', 1)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO dose_records (medicine_id, dose_date) VALUES (1, '2025-01-09')",
            [],
        )
        .unwrap();
        let dup = conn.execute(
            "INSERT INTO dose_records (medicine_id, dose_date) VALUES (1, '2025-01-09')",
            [],
        );
        assert!(dup.is_err());
    }
}
