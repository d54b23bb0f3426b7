//! Date normalization and range building.
//!
//! auth.log stamps carry no year, so normalization works under an assumed
//! reference year supplied by the caller. A log that spans a year boundary
//! will normalize incorrectly; that limitation is inherent to the format.

use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::models::DateRange;

const ISO_FORMAT: &str = "%Y-%m-%d";

/// Month number for a three-letter abbreviation, `Jan` through `Dec`.
pub fn month_number(abbr: &str) -> Result<u32> {
    let month = match abbr {
        "Jan" => 1,
        "Feb" => 2,
        "Mar" => 3,
        "Apr" => 4,
        "May" => 5,
        "Jun" => 6,
        "Jul" => 7,
        "Aug" => 8,
        "Sep" => 9,
        "Oct" => 10,
        "Nov" => 11,
        "Dec" => 12,
        _ => return Err(Error::UnknownMonth(abbr.to_string())),
    };
    Ok(month)
}

/// Normalize a year-less `Mon DD` stamp to `YYYY-MM-DD` under the assumed
/// year. Calendar validity is enforced (`Feb 30` fails).
pub fn normalize(month_abbr: &str, day: u32, assumed_year: i32) -> Result<String> {
    let month = month_number(month_abbr)?;
    let date = NaiveDate::from_ymd_opt(assumed_year, month, day).ok_or_else(|| {
        Error::InvalidCalendarDate(format!("{}-{:02}-{:02}", assumed_year, month, day))
    })?;
    Ok(date.format(ISO_FORMAT).to_string())
}

/// Normalize a raw date stamp such as `"Mar 31"` or `"Apr  1"`.
pub fn normalize_stamp(stamp: &str, assumed_year: i32) -> Result<String> {
    let mut parts = stamp.split_whitespace();
    let abbr = parts.next().unwrap_or("");
    let day_text = parts.next().unwrap_or("");
    let day: u32 = day_text
        .parse()
        .map_err(|_| Error::InvalidCalendarDate(stamp.to_string()))?;
    normalize(abbr, day, assumed_year)
}

/// Build the dense skeleton of every calendar day from `first` to `last`
/// inclusive, ascending, each mapped to zero.
pub fn build_range(first: &str, last: &str) -> Result<DateRange> {
    let begin = parse_iso(first)?;
    let end = parse_iso(last)?;

    if end < begin {
        return Err(Error::InvalidRange {
            first: first.to_string(),
            last: last.to_string(),
        });
    }

    let mut dates = Vec::new();
    let mut current = begin;
    while current <= end {
        dates.push(current.format(ISO_FORMAT).to_string());
        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }

    Ok(DateRange::from_dates(dates))
}

fn parse_iso(date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date, ISO_FORMAT)
        .map_err(|_| Error::InvalidCalendarDate(date.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("Apr", 14, 2025).unwrap(), "2025-04-14");
        assert_eq!(normalize("Mar", 1, 2025).unwrap(), "2025-03-01");
    }

    #[test]
    fn test_normalize_unknown_month() {
        assert!(matches!(
            normalize("Xyz", 1, 2025),
            Err(Error::UnknownMonth(_))
        ));
    }

    #[test]
    fn test_normalize_invalid_day() {
        assert!(matches!(
            normalize("Feb", 30, 2025),
            Err(Error::InvalidCalendarDate(_))
        ));
    }

    #[test]
    fn test_normalize_stamp_collapses_whitespace() {
        assert_eq!(normalize_stamp("Mar 31", 2025).unwrap(), "2025-03-31");
        assert_eq!(normalize_stamp("Apr  1", 2025).unwrap(), "2025-04-01");
    }

    #[test]
    fn test_build_range_inclusive() {
        let range = build_range("2025-03-27", "2025-03-30").unwrap();
        let dates: Vec<&str> = range.dates().collect();
        assert_eq!(
            dates,
            vec!["2025-03-27", "2025-03-28", "2025-03-29", "2025-03-30"]
        );
        assert!(range.buckets().values().all(|&v| v == 0));
    }

    #[test]
    fn test_build_range_single_day() {
        let range = build_range("2025-04-02", "2025-04-02").unwrap();
        assert_eq!(range.len(), 1);
    }

    #[test]
    fn test_build_range_reversed_fails() {
        assert!(matches!(
            build_range("2025-03-30", "2025-03-27"),
            Err(Error::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_build_range_crosses_month_boundary() {
        let range = build_range("2025-03-27", "2025-04-20").unwrap();
        assert_eq!(range.len(), 25);
        assert_eq!(range.first(), Some("2025-03-27"));
        assert_eq!(range.last(), Some("2025-04-20"));
        assert!(range.contains("2025-04-01"));
    }
}
