//! Reporting-period policy.
//!
//! Every report resolves its date window here so that "no dates given"
//! means the same thing everywhere: 1 January of the current year through
//! today.

use chrono::{Datelike, NaiveDate, Utc};

use tallyerp_core::{DomainError, DomainResult};
use tallyerp_ledger::DateWindow;

/// Source of "today" for default windows and aging reference dates.
pub trait Clock: Send + Sync + core::fmt::Debug {
    fn today(&self) -> NaiveDate;
}

/// Wall clock (UTC calendar date).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// Clock pinned to one date (tests, replays).
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Start of the current calendar year through `today`.
pub fn default_window(today: NaiveDate) -> DateWindow {
    DateWindow {
        start: NaiveDate::from_ymd_opt(today.year(), 1, 1),
        end: Some(today),
    }
}

/// Apply the default policy: both bounds missing → [`default_window`];
/// otherwise the given bounds, open-ended where one is missing.
pub fn resolve_window(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> DomainResult<DateWindow> {
    if start.is_none() && end.is_none() {
        return Ok(default_window(today));
    }
    DateWindow::new(start, end)
}

/// 1 January through 31 December of `year`.
pub fn year_window(year: i32) -> DomainResult<DateWindow> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1);
    let end = NaiveDate::from_ymd_opt(year, 12, 31);
    if start.is_none() || end.is_none() {
        return Err(DomainError::validation(format!("year {year} is out of range")));
    }
    DateWindow::new(start, end)
}

/// First through last day of one calendar month.
pub fn month_window(year: i32, month: u32) -> DomainResult<DateWindow> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| DomainError::validation(format!("invalid month {year}-{month}")))?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let end = next
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| DomainError::validation(format!("invalid month {year}-{month}")))?;
    DateWindow::new(Some(start), Some(end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn no_dates_means_year_to_date() {
        let w = resolve_window(None, None, d(2026, 10, 16)).unwrap();
        assert_eq!(w.start, Some(d(2026, 1, 1)));
        assert_eq!(w.end, Some(d(2026, 10, 16)));
    }

    #[test]
    fn one_bound_stays_open_ended() {
        let w = resolve_window(Some(d(2025, 3, 1)), None, d(2026, 10, 16)).unwrap();
        assert_eq!(w.start, Some(d(2025, 3, 1)));
        assert_eq!(w.end, None);

        let w = resolve_window(None, Some(d(2025, 3, 1)), d(2026, 10, 16)).unwrap();
        assert_eq!(w.start, None);
        assert_eq!(w.end, Some(d(2025, 3, 1)));
    }

    #[test]
    fn inverted_range_is_validation_error() {
        assert!(resolve_window(Some(d(2026, 5, 1)), Some(d(2026, 4, 1)), d(2026, 10, 16)).is_err());
    }

    #[test]
    fn month_window_handles_leap_february_and_december() {
        let feb = month_window(2028, 2).unwrap();
        assert_eq!(feb.end, Some(d(2028, 2, 29)));
        let dec = month_window(2026, 12).unwrap();
        assert_eq!(dec.start, Some(d(2026, 12, 1)));
        assert_eq!(dec.end, Some(d(2026, 12, 31)));
        assert!(month_window(2026, 13).is_err());
    }
}
