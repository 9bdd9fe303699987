//! Calendar month scaffold
//!
//! Lays out the days of a month on a Sunday-first week grid.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// Days of one month plus the blank cells before day 1
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthScaffold {
    pub year: i32,
    pub month: u32,
    /// Empty cells before day 1 (0 when the month starts on Sunday)
    pub leading_blanks: u32,
    pub days: Vec<NaiveDate>,
}

impl MonthScaffold {
    /// Build the scaffold for a month. Returns `None` for an invalid month.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let leading_blanks = first.weekday().num_days_from_sunday();
        let days = first
            .iter_days()
            .take_while(|d| d.month() == month)
            .collect();

        Some(Self {
            year,
            month,
            leading_blanks,
            days,
        })
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        self.days.first().copied()
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        self.days.last().copied()
    }

    /// Rows of seven cells; blanks before day 1 and after the last day are `None`
    pub fn weeks(&self) -> Vec<[Option<NaiveDate>; 7]> {
        let cells: Vec<Option<NaiveDate>> = std::iter::repeat(None)
            .take(self.leading_blanks as usize)
            .chain(self.days.iter().copied().map(Some))
            .collect();

        cells
            .chunks(7)
            .map(|chunk| {
                let mut row = [None; 7];
                row[..chunk.len()].copy_from_slice(chunk);
                row
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_starting_wednesday_has_three_blanks() {
        // January 2025 starts on a Wednesday
        let scaffold = MonthScaffold::new(2025, 1).unwrap();
        assert_eq!(scaffold.leading_blanks, 3);
        assert_eq!(scaffold.days.len(), 31);
        assert_eq!(scaffold.first_day(), NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(scaffold.last_day(), NaiveDate::from_ymd_opt(2025, 1, 31));
    }

    #[test]
    fn test_month_starting_sunday_has_no_blanks() {
        // June 2025 starts on a Sunday
        let scaffold = MonthScaffold::new(2025, 6).unwrap();
        assert_eq!(scaffold.leading_blanks, 0);
        assert_eq!(scaffold.days.len(), 30);
    }

    #[test]
    fn test_leap_february() {
        assert_eq!(MonthScaffold::new(2024, 2).unwrap().days.len(), 29);
        assert_eq!(MonthScaffold::new(2025, 2).unwrap().days.len(), 28);
    }

    #[test]
    fn test_invalid_month() {
        assert!(MonthScaffold::new(2025, 0).is_none());
        assert!(MonthScaffold::new(2025, 13).is_none());
    }

    #[test]
    fn test_weeks_layout() {
        let scaffold = MonthScaffold::new(2025, 1).unwrap();
        let weeks = scaffold.weeks();
        assert_eq!(weeks.len(), 5);
        assert!(weeks[0][..3].iter().all(Option::is_none));
        assert_eq!(weeks[0][3], NaiveDate::from_ymd_opt(2025, 1, 1));
        // Jan 31 2025 is a Friday
        assert_eq!(weeks[4][5], NaiveDate::from_ymd_opt(2025, 1, 31));
        assert_eq!(weeks[4][6], None);
    }
}
