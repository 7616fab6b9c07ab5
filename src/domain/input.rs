//! Parsing and validation of raw request fields.

use chrono::{NaiveDate, NaiveTime};

use super::ValidationError;

pub fn parse_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(raw.to_string()))
}

/// Accepts `HH:MM` and `HH:MM:SS`.
pub fn parse_time(raw: &str) -> Result<NaiveTime, ValidationError> {
    let raw_trimmed = raw.trim();
    NaiveTime::parse_from_str(raw_trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw_trimmed, "%H:%M:%S"))
        .map_err(|_| ValidationError::InvalidTime(raw.to_string()))
}

pub fn validate_time_range(start: NaiveTime, end: NaiveTime) -> Result<(), ValidationError> {
    if end <= start {
        return Err(ValidationError::InvalidTimeRange);
    }
    Ok(())
}

pub fn validate_counts(total: i64, attended: i64) -> Result<(), ValidationError> {
    if total < 0 {
        return Err(ValidationError::NegativeCount { field: "Total lectures" });
    }
    if attended < 0 {
        return Err(ValidationError::NegativeCount { field: "Attended lectures" });
    }
    if attended > total {
        return Err(ValidationError::AttendedExceedsTotal);
    }
    Ok(())
}

pub fn non_empty(raw: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty(field));
    }
    Ok(trimmed.to_string())
}

/// Empty optional text collapses to `None`.
pub fn optional_text(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_long_times() {
        assert_eq!(parse_time("09:30").unwrap(), NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert_eq!(parse_time("09:30:15").unwrap(), NaiveTime::from_hms_opt(9, 30, 15).unwrap());
        assert_eq!(parse_time("9h30"), Err(ValidationError::InvalidTime("9h30".into())));
    }

    #[test]
    fn rejects_bad_dates() {
        assert!(parse_date("2024-02-30").is_err());
        assert_eq!(parse_date("2024-02-29").unwrap(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn time_range_must_move_forward() {
        let ten = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        let eleven = NaiveTime::from_hms_opt(11, 0, 0).unwrap();
        assert!(validate_time_range(ten, eleven).is_ok());
        assert_eq!(validate_time_range(ten, ten), Err(ValidationError::InvalidTimeRange));
        assert_eq!(validate_time_range(eleven, ten), Err(ValidationError::InvalidTimeRange));
    }

    #[test]
    fn counts_are_checked() {
        assert!(validate_counts(10, 10).is_ok());
        assert_eq!(validate_counts(3, 4), Err(ValidationError::AttendedExceedsTotal));
        assert!(matches!(validate_counts(-1, 0), Err(ValidationError::NegativeCount { .. })));
        assert!(matches!(validate_counts(1, -1), Err(ValidationError::NegativeCount { .. })));
    }

    #[test]
    fn blank_text_is_dropped() {
        assert_eq!(optional_text(Some("  ".into())), None);
        assert_eq!(optional_text(Some(" B12 ".into())), Some("B12".into()));
        assert_eq!(non_empty("   ", "Name"), Err(ValidationError::Empty("Name")));
    }
}
