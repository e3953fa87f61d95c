//! Date utilities and constants for the purchases service.

use chrono::{Months, NaiveDate, Utc};

/// Service timing constants.
pub mod constants {
    use std::time::Duration;

    /// Months searched backwards for a usable exchange rate.
    pub const DEFAULT_LOOKBACK_MONTHS: u32 = 6;

    /// Rate limiter permits per refresh period.
    pub const RATE_LIMIT_PER_PERIOD: u32 = 10;

    /// Rate limiter refresh period (1 second).
    pub fn rate_limit_refresh_period() -> Duration {
        Duration::from_secs(1)
    }

    /// Maximum time a caller waits for a permit (500 milliseconds).
    pub fn rate_limit_timeout() -> Duration {
        Duration::from_millis(500)
    }

    /// Default store call timeout (5 seconds).
    pub fn store_timeout() -> Duration {
        Duration::from_secs(5)
    }

    /// Default exchange-rate source timeout (5 seconds).
    pub fn rate_source_timeout() -> Duration {
        Duration::from_secs(5)
    }
}

/// Today's calendar date in UTC.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Inclusive date window searched for an exchange rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LookbackWindow {
    /// Earliest acceptable effective date.
    pub start: NaiveDate,
    /// Latest acceptable effective date.
    pub end: NaiveDate,
}

impl LookbackWindow {
    /// Window of `months` calendar months ending at `end`.
    ///
    /// Month arithmetic clamps to the end of shorter months, so
    /// 2021-08-31 minus six months starts on 2021-02-28. Dates that would
    /// fall before the supported calendar start at `NaiveDate::MIN`.
    pub fn ending_at(end: NaiveDate, months: u32) -> Self {
        let start = end
            .checked_sub_months(Months::new(months))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end }
    }

    /// Check if a date falls inside the window.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_window_spans_six_months() {
        let window = LookbackWindow::ending_at(date(2021, 1, 1), 6);
        assert_eq!(window.start, date(2020, 7, 1));
        assert_eq!(window.end, date(2021, 1, 1));
    }

    #[test]
    fn test_window_is_inclusive() {
        let window = LookbackWindow::ending_at(date(2021, 1, 1), 6);
        assert!(window.contains(date(2020, 7, 1)));
        assert!(window.contains(date(2021, 1, 1)));
        assert!(!window.contains(date(2020, 6, 30)));
        assert!(!window.contains(date(2021, 1, 2)));
    }

    #[test]
    fn test_window_clamps_month_end() {
        let window = LookbackWindow::ending_at(date(2021, 8, 31), 6);
        assert_eq!(window.start, date(2021, 2, 28));
    }

    #[test]
    fn test_zero_month_window_is_single_day() {
        let window = LookbackWindow::ending_at(date(2022, 3, 15), 0);
        assert_eq!(window.start, window.end);
    }

    proptest! {
        #[test]
        fn prop_window_never_extends_past_end(days in 0i64..40_000, months in 0u32..24) {
            let end = date(1970, 1, 1) + chrono::Duration::days(days);
            let window = LookbackWindow::ending_at(end, months);
            prop_assert!(window.start <= window.end);
            prop_assert!(window.contains(end));
            prop_assert!(!window.contains(end + chrono::Duration::days(1)));
        }
    }
}
