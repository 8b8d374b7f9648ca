//! Date tokens as statements print them.

use chrono::{Datelike, Duration, NaiveDate};

/// Partial dates may fall this many days after the issue date before they are
/// taken to belong to the previous year.
pub const YEAR_ROLLOVER_DAYS: i64 = 40;

/// Month number from a Dutch or English month name or abbreviation.
pub fn month_from_name(name: &str) -> Option<u32> {
    let key: String = name
        .trim_end_matches('.')
        .chars()
        .take(3)
        .flat_map(char::to_lowercase)
        .collect();
    let month = match key.as_str() {
        "jan" => 1,
        "feb" => 2,
        "maa" | "mar" | "mrt" => 3,
        "apr" => 4,
        "mei" | "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "okt" | "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Resolve a day and month against the statement's issue date.
///
/// The issue year is used unless that puts the date more than
/// [`YEAR_ROLLOVER_DAYS`] after the issue date, as happens for December
/// purchases on a January statement. A day that does not exist in the issue
/// year is rejected.
pub fn resolve_day_month(day: u32, month: u32, year_hint: NaiveDate) -> Option<NaiveDate> {
    let latest = year_hint + Duration::days(YEAR_ROLLOVER_DAYS);
    let date = NaiveDate::from_ymd_opt(year_hint.year(), month, day)?;
    if date <= latest {
        Some(date)
    } else {
        NaiveDate::from_ymd_opt(year_hint.year() - 1, month, day)
    }
}

/// `19 mei`, `3 Dec.`
pub fn parse_day_month(token: &str, year_hint: NaiveDate) -> Option<NaiveDate> {
    let mut parts = token.split_whitespace();
    let day: u32 = parts.next()?.parse().ok()?;
    let month = month_from_name(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }
    resolve_day_month(day, month, year_hint)
}

/// `12 jun 2025`
pub fn parse_day_month_year(token: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = token.split_whitespace().collect();
    let [day, month, year] = parts.as_slice() else {
        return None;
    };
    NaiveDate::from_ymd_opt(year.parse().ok()?, month_from_name(month)?, day.parse().ok()?)
}

/// `2025-06-03`
pub fn parse_iso(token: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(token.trim(), "%Y-%m-%d").ok()
}

/// First and last day of the month `date` falls in.
pub fn month_bounds(date: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let start = date.with_day(1)?;
    let next = if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)?
    };
    Some((start, next.pred_opt()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_names() {
        assert_eq!(month_from_name("mei"), Some(5));
        assert_eq!(month_from_name("Mrt"), Some(3));
        assert_eq!(month_from_name("maart"), Some(3));
        assert_eq!(month_from_name("Oct."), Some(10));
        assert_eq!(month_from_name("xyz"), None);
    }

    #[test]
    fn test_year_rollover() {
        let issued = date(2025, 1, 12);
        assert_eq!(parse_day_month("28 dec", issued), Some(date(2024, 12, 28)));
        assert_eq!(parse_day_month("3 jan", issued), Some(date(2025, 1, 3)));
        // still within the 40 day window
        assert_eq!(parse_day_month("20 feb", issued), Some(date(2025, 2, 20)));
        assert_eq!(parse_day_month("22 feb", issued), Some(date(2024, 2, 22)));
    }

    #[test]
    fn test_day_missing_from_issue_year() {
        assert_eq!(parse_day_month("29 feb", date(2025, 3, 12)), None);
        assert_eq!(parse_day_month("29 feb", date(2024, 3, 5)), Some(date(2024, 2, 29)));
        assert_eq!(parse_day_month("31 apr", date(2025, 5, 2)), None);
    }

    #[test]
    fn test_full_dates() {
        assert_eq!(parse_day_month_year("12 jun 2025"), Some(date(2025, 6, 12)));
        assert_eq!(parse_day_month_year("12 jun"), None);
        assert_eq!(parse_iso("2025-06-30"), Some(date(2025, 6, 30)));
        assert_eq!(parse_iso("2025-13-01"), None);
    }

    #[test]
    fn test_month_bounds() {
        assert_eq!(
            month_bounds(date(2024, 2, 12)),
            Some((date(2024, 2, 1), date(2024, 2, 29)))
        );
        assert_eq!(
            month_bounds(date(2025, 12, 5)),
            Some((date(2025, 12, 1), date(2025, 12, 31)))
        );
    }
}
