use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, Weekday};

/// Calendar-day key for "today" in server-local time (YYYY-MM-DD).
pub fn today_key() -> NaiveDate {
    Local::now().date_naive()
}

/// Current wall-clock timestamp in server-local time.
pub fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Number of non-weekend days in `from..=to`. The only calendar awareness the
/// leave engine has; no holiday calendar is consulted.
pub fn business_days(from: NaiveDate, to: NaiveDate) -> u32 {
    let mut days = 0;
    let mut current = from;
    while current <= to {
        if !is_weekend(current) {
            days += 1;
        }
        current = match current.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }
    days
}

/// Day count used identically for sufficiency checks, display and settlement.
/// A half-day request is always 0.5 regardless of the date range.
pub fn leave_days(from: NaiveDate, to: NaiveDate, is_half_day: bool) -> f64 {
    if is_half_day {
        0.5
    } else {
        business_days(from, to) as f64
    }
}

/// First and last date of a `YYYY-MM` month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next_month.pred_opt()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn saturday_counts_for_nothing() {
        // 2024-01-06 is a Saturday
        assert_eq!(leave_days(d("2024-01-06"), d("2024-01-06"), false), 0.0);
        // full weekend
        assert_eq!(leave_days(d("2024-01-06"), d("2024-01-07"), false), 0.0);
    }

    #[test]
    fn monday_to_friday_is_five() {
        assert_eq!(leave_days(d("2024-01-08"), d("2024-01-12"), false), 5.0);
    }

    #[test]
    fn range_spanning_a_weekend() {
        // Thu..=Tue crosses one weekend
        assert_eq!(leave_days(d("2024-01-11"), d("2024-01-16"), false), 4.0);
    }

    #[test]
    fn half_day_wins_over_any_range() {
        assert_eq!(leave_days(d("2024-01-08"), d("2024-01-12"), true), 0.5);
        assert_eq!(leave_days(d("2024-01-06"), d("2024-01-06"), true), 0.5);
    }

    #[test]
    fn single_weekday() {
        assert_eq!(leave_days(d("2024-01-10"), d("2024-01-10"), false), 1.0);
    }

    #[test]
    fn month_bounds_handle_year_end_and_leap() {
        assert_eq!(
            month_bounds(2024, 2),
            Some((d("2024-02-01"), d("2024-02-29")))
        );
        assert_eq!(
            month_bounds(2023, 12),
            Some((d("2023-12-01"), d("2023-12-31")))
        );
        assert_eq!(month_bounds(2024, 13), None);
    }
}
