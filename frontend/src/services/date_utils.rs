use chrono::{Datelike, NaiveDate};

/// Separator used by the canonical `yyyy/mm/dd` form
pub const CANONICAL_SEPARATOR: char = '/';

/// Why a date field was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DateError {
    #[error("Please enter a date in a 'yyyy/mm/dd' format")]
    BadFormat,
    #[error("Please enter a valid date.")]
    NonExistent,
}

/// Normalize a `yyyy-mm-dd` or `yyyy/mm/dd` string to `yyyy/mm/dd`.
///
/// Both separators must be the same. Dates that do not exist on the calendar
/// (`2024-02-30`, month 13) are rejected with [`DateError::NonExistent`].
pub fn normalize_date_string(value: &str) -> Result<String, DateError> {
    parse_date_string(value).map(|date| to_canonical(&date))
}

/// Parse a `yyyy-mm-dd` or `yyyy/mm/dd` string into a calendar date
pub fn parse_date_string(value: &str) -> Result<NaiveDate, DateError> {
    let (year, month, day) = split_date_parts(value.trim()).ok_or(DateError::BadFormat)?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or(DateError::NonExistent)
}

/// Render a date in the canonical `yyyy/mm/dd` form
pub fn to_canonical(date: &NaiveDate) -> String {
    format!(
        "{:04}{sep}{:02}{sep}{:02}",
        date.year(),
        date.month(),
        date.day(),
        sep = CANONICAL_SEPARATOR
    )
}

/// Format a date for display (e.g., "March 1, 2024")
pub fn format_date_for_display(date: &NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Split `yyyy?mm?dd` where `?` is `-` or `/` used consistently
fn split_date_parts(value: &str) -> Option<(i32, u32, u32)> {
    let separator = if value.contains('-') { '-' } else { '/' };
    let parts: Vec<&str> = value.split(separator).collect();
    let [year, month, day]: [&str; 3] = parts.try_into().ok()?;

    let widths_ok = year.len() == 4 && month.len() == 2 && day.len() == 2;
    let digits_ok = [year, month, day]
        .iter()
        .all(|part| part.bytes().all(|b| b.is_ascii_digit()));
    if !widths_ok || !digits_ok {
        return None;
    }

    Some((year.parse().ok()?, month.parse().ok()?, day.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_existent_dates() {
        assert_eq!(normalize_date_string("2024-02-30"), Err(DateError::NonExistent));
        assert_eq!(normalize_date_string("2023-02-29"), Err(DateError::NonExistent));
        assert_eq!(normalize_date_string("2024-13-01"), Err(DateError::NonExistent));
        assert_eq!(normalize_date_string("2024-04-31"), Err(DateError::NonExistent));
        assert_eq!(normalize_date_string("2024-00-10"), Err(DateError::NonExistent));
    }

    #[test]
    fn test_accepts_leap_day() {
        assert_eq!(normalize_date_string("2024-02-29"), Ok("2024/02/29".to_string()));
        assert_eq!(normalize_date_string("2000/02/29"), Ok("2000/02/29".to_string()));
    }

    #[test]
    fn test_both_separators_share_canonical_form() {
        let dashed = normalize_date_string("2024-03-01").unwrap();
        let slashed = normalize_date_string("2024/03/01").unwrap();
        assert_eq!(dashed, slashed);
        assert_eq!(dashed, "2024/03/01");
    }

    #[test]
    fn test_rejects_malformed_input() {
        for input in ["", "2024", "2024-3-1", "24-03-01", "2024-03/01", "2024.03.01", "abcd-ef-gh", "2024-03-01x"] {
            assert_eq!(normalize_date_string(input), Err(DateError::BadFormat), "input {:?}", input);
        }
    }

    #[test]
    fn test_parse_returns_calendar_date() {
        let date = parse_date_string(" 2024/12/25 ").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 12, 25).unwrap());
    }

    #[test]
    fn test_format_date_for_display() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(format_date_for_display(&date), "March 1, 2024");
    }

    #[test]
    fn test_century_leap_rule() {
        assert_eq!(normalize_date_string("1900-02-29"), Err(DateError::NonExistent));
        assert_eq!(normalize_date_string("2023-02-28"), Ok("2023/02/28".to_string()));
    }
}
