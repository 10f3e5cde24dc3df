use chrono::{DateTime, Datelike, Days, NaiveDate};

/// Accepts `YYYY-MM-DD`, an RFC 3339 timestamp, or any text that starts
/// with a `YYYY-MM-DD` date.
pub fn parse_entry_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|datetime| datetime.date_naive())
        })
        .or_else(|| {
            trimmed
                .get(..10)
                .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        })
}

pub fn first_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = first_of_month(year, month)?;
    let next = if month == 12 {
        first_of_month(year.checked_add(1)?, 1)?
    } else {
        first_of_month(year, month + 1)?
    };

    u32::try_from((next - first).num_days()).ok()
}

/// Weekday of the 1st as 0 = Sunday .. 6 = Saturday.
pub fn first_weekday(year: i32, month: u32) -> Option<u32> {
    first_of_month(year, month).map(|date| date.weekday().num_days_from_sunday())
}

/// Sunday through Saturday containing `day`. `None` when the week runs past
/// the representable date range.
pub fn week_bounds(day: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let start = day.checked_sub_days(Days::new(u64::from(day.weekday().num_days_from_sunday())))?;
    let end = start.checked_add_days(Days::new(6))?;
    Some((start, end))
}

pub fn month_bounds(day: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let start = day.with_day(1)?;
    let length = days_in_month(day.year(), day.month())?;
    let end = start.checked_add_days(Days::new(u64::from(length - 1)))?;
    Some((start, end))
}

#[cfg(test)]
mod tests {
    use super::{days_in_month, first_weekday, month_bounds, parse_entry_date, week_bounds};
    use chrono::{Datelike, NaiveDate};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn parses_plain_and_timestamp_dates() {
        assert_eq!(parse_entry_date("2024-02-29"), Some(date(2024, 2, 29)));
        assert_eq!(
            parse_entry_date("2024-03-01T08:15:00.000Z"),
            Some(date(2024, 3, 1))
        );
        assert_eq!(parse_entry_date("2024-03-01 evening"), Some(date(2024, 3, 1)));
        assert_eq!(parse_entry_date("yesterday"), None);
        assert_eq!(parse_entry_date("2024-13-01"), None);
        assert_eq!(parse_entry_date(""), None);
    }

    #[test]
    fn month_lengths_follow_calendar() {
        assert_eq!(days_in_month(2024, 2), Some(29));
        assert_eq!(days_in_month(2023, 2), Some(28));
        assert_eq!(days_in_month(2024, 12), Some(31));
        assert_eq!(days_in_month(2024, 4), Some(30));
        assert_eq!(days_in_month(2024, 13), None);
    }

    #[test]
    fn first_weekday_counts_from_sunday() {
        // 2024-09-01 was a Sunday, 2024-02-01 a Thursday.
        assert_eq!(first_weekday(2024, 9), Some(0));
        assert_eq!(first_weekday(2024, 2), Some(4));
    }

    #[test]
    fn week_runs_sunday_to_saturday() {
        // Wednesday 2024-01-03.
        assert_eq!(week_bounds(date(2024, 1, 3)), Some((date(2023, 12, 31), date(2024, 1, 6))));
        // Sunday stays the start of its own week.
        assert_eq!(week_bounds(date(2024, 1, 7)), Some((date(2024, 1, 7), date(2024, 1, 13))));
    }

    #[test]
    fn month_bounds_cover_whole_month() {
        assert_eq!(month_bounds(date(2024, 2, 14)), Some((date(2024, 2, 1), date(2024, 2, 29))));
    }

    #[test]
    fn windows_at_the_date_limits_do_not_panic() {
        assert_eq!(month_bounds(NaiveDate::MAX), None);
        let _ = week_bounds(NaiveDate::MAX);
        let _ = week_bounds(NaiveDate::MIN);
        assert_eq!(days_in_month(NaiveDate::MAX.year(), 12), None);
    }
}
