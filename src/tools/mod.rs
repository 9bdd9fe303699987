//! petmed Tools module
//!
//! MCP tool implementations for the pet medication and health tracker.
//! Every data tool takes the signed-in user and only touches their rows.

pub mod account;
pub mod calendar;
pub mod doses;
pub mod health;
pub mod medicines;
pub mod status;

use chrono::{Local, NaiveDate, NaiveTime, Timelike};

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

/// Parse an `HH:MM` clock time
pub fn parse_time(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|_| format!("Invalid time '{}', expected HH:MM", s))
}

pub fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Local wall-clock time truncated to the minute
pub fn current_stamp() -> NaiveTime {
    let now = Local::now().time();
    NaiveTime::from_hms_opt(now.hour(), now.minute(), 0).unwrap_or(now)
}

/// Today's local date
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Validate a (year, month) pair
pub fn validate_month(year: i32, month: u32) -> Result<(), String> {
    if !(1..=12).contains(&month) {
        return Err(format!("Invalid month {}, expected 1-12", month));
    }
    if !(1900..=9999).contains(&year) {
        return Err(format!("Invalid year {}", year));
    }
    Ok(())
}

/// A migrated file-backed database with one registered user
#[cfg(test)]
pub(crate) fn test_database() -> (tempfile::TempDir, crate::db::Database, crate::models::User) {
    let dir = tempfile::tempdir().unwrap();
    let db = crate::db::Database::open_migrated(dir.path().join("petmed.db")).unwrap();
    let user = db
        .with_conn(|conn| crate::models::User::create(conn, "Owner", "owner@example.com"))
        .unwrap();
    (dir, db, user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_and_time() {
        assert_eq!(parse_date("2025-01-09"), Ok(NaiveDate::from_ymd_opt(2025, 1, 9).unwrap()));
        assert!(parse_date("09/01/2025").is_err());
        assert!(parse_date("2025-02-30").is_err());

        assert_eq!(parse_time("08:05"), Ok(NaiveTime::from_hms_opt(8, 5, 0).unwrap()));
        assert!(parse_time("25:00").is_err());
        assert_eq!(format_time(NaiveTime::from_hms_opt(21, 0, 0).unwrap()), "21:00");
    }

    #[test]
    fn test_current_stamp_has_no_seconds() {
        let stamp = current_stamp();
        assert_eq!(stamp.second(), 0);
        assert_eq!(stamp.nanosecond(), 0);
    }

    #[test]
    fn test_validate_month() {
        assert!(validate_month(2025, 1).is_ok());
        assert!(validate_month(2025, 0).is_err());
        assert!(validate_month(2025, 13).is_err());
    }
}
