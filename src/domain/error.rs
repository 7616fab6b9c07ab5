use thiserror::Error;

/// Rejected user input. Always recoverable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} cannot be negative")]
    NegativeCount { field: &'static str },

    #[error("Attended lectures cannot exceed total lectures")]
    AttendedExceedsTotal,

    #[error("End time must be after start time")]
    InvalidTimeRange,

    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid time '{0}', expected HH:MM")]
    InvalidTime(String),

    #[error("Unknown weekday '{0}'")]
    UnknownWeekday(String),

    #[error("Unknown slot category '{0}'")]
    UnknownCategory(String),

    #[error("{0} cannot be empty")]
    Empty(&'static str),

    #[error("Threshold must be between 1 and 99 percent, got {0}")]
    InvalidThreshold(i64),
}
