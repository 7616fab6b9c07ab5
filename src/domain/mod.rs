//! Pure attendance and timetable rules. Nothing in here touches storage or HTTP.

pub mod attendance;
pub mod calculator;
pub mod error;
pub mod input;
pub mod refresh;
pub mod schedule;
pub mod suggestions;
pub mod timetable;

pub use attendance::Counters;
pub use calculator::{AttendanceStats, Threshold};
pub use error::ValidationError;
pub use schedule::{Occurrence, ScheduleIndex, next_occurrence};
pub use suggestions::{CourseSuggestion, LectureSuggestion, NextLecture, Suggestion};
pub use timetable::{ConflictOutcome, SlotCandidate, TimetableEntry, WeeklyView};
