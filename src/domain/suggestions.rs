//! Attend/skip recommendations derived from attendance figures.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use super::calculator::{self, Threshold};
use super::schedule::{Occurrence, ScheduleIndex, next_occurrence};
use crate::models::{Course, Weekday};

/// Percentage below which a course that meets the threshold is still flagged.
const COMFORT_PERCENT: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Critical,
    Warning,
    Safe,
    Caution,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestedAction {
    Attend,
    Optional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    pub action: SuggestedAction,
    pub priority: Priority,
    pub message: String,
}

pub fn suggest(total: i64, attended: i64, threshold: Threshold) -> Suggestion {
    let pct = calculator::percentage(total, attended);
    let limit = threshold.percent();

    if calculator::is_below_threshold(total, attended, threshold) {
        let needed = calculator::lectures_needed(total, attended, threshold);
        return Suggestion {
            kind: SuggestionKind::Critical,
            action: SuggestedAction::Attend,
            priority: Priority::High,
            message: format!("Must attend! Need {needed} more lectures to reach {limit}%"),
        };
    }
    if pct < COMFORT_PERCENT {
        return Suggestion {
            kind: SuggestionKind::Warning,
            action: SuggestedAction::Attend,
            priority: Priority::Medium,
            message: format!("Recommended to attend (currently {pct}%)"),
        };
    }

    let can_skip = calculator::lectures_skippable(total, attended, threshold);
    if can_skip > 0 {
        Suggestion {
            kind: SuggestionKind::Safe,
            action: SuggestedAction::Optional,
            priority: Priority::Low,
            message: format!("Can skip if needed (can skip {can_skip} more and stay above {limit}%)"),
        }
    } else {
        Suggestion {
            kind: SuggestionKind::Caution,
            action: SuggestedAction::Attend,
            priority: Priority::Medium,
            message: "Better to attend to maintain buffer".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NextLecture {
    pub date: NaiveDate,
    pub weekday: Weekday,
    #[serde(serialize_with = "serialize_hhmm")]
    pub start_time: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseSuggestion {
    pub course_id: String,
    pub course_name: String,
    pub current_percentage: f64,
    #[serde(flatten)]
    pub suggestion: Suggestion,
    pub next_lecture: Option<NextLecture>,
}

/// Soonest upcoming lecture of a course, if it has any slots.
pub fn next_lecture(index: &ScheduleIndex, course_id: &str, now: NaiveDateTime) -> Option<NextLecture> {
    index
        .slots_for_course(course_id)
        .iter()
        .map(|slot| NextLecture {
            date: next_occurrence(slot, now),
            weekday: slot.weekday,
            start_time: slot.start_time,
        })
        .min_by_key(|n| (n.date, n.start_time))
}

/// One suggestion per regular course, most urgent first.
pub fn course_suggestions(
    courses: &[Course],
    index: &ScheduleIndex,
    now: NaiveDateTime,
    threshold: Threshold,
) -> Vec<CourseSuggestion> {
    let mut out: Vec<_> = courses
        .iter()
        .filter(|c| c.is_regular)
        .map(|c| {
            let next = next_lecture(index, &c.id, now);
            let mut suggestion = suggest(c.total_lectures, c.attended_lectures, threshold);
            if let (SuggestionKind::Critical, Some(n)) = (suggestion.kind, next) {
                suggestion.message = format!(
                    "{} (Next: {} {})",
                    suggestion.message,
                    n.weekday.label(),
                    n.start_time.format("%H:%M")
                );
            }
            CourseSuggestion {
                course_id: c.id.clone(),
                course_name: c.name.clone(),
                current_percentage: calculator::percentage(c.total_lectures, c.attended_lectures),
                suggestion,
                next_lecture: next,
            }
        })
        .collect();
    out.sort_by_key(|s| s.suggestion.priority);
    out
}

/// A course suggestion pinned to a specific upcoming lecture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LectureSuggestion {
    pub course_id: String,
    pub course_name: String,
    #[serde(flatten)]
    pub suggestion: Suggestion,
    pub current_percentage: f64,
    pub schedule_id: String,
    pub lecture_date: NaiveDate,
    #[serde(serialize_with = "serialize_hhmm")]
    pub lecture_time: NaiveTime,
    pub lecture_day: &'static str,
    pub is_today: bool,
    pub days_from_now: i64,
}

fn serialize_hhmm<S: serde::Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(&time.format("%H:%M"))
}

impl LectureSuggestion {
    fn new(course: &Course, occurrence: &Occurrence, threshold: Threshold) -> Self {
        Self {
            course_id: course.id.clone(),
            course_name: course.name.clone(),
            suggestion: suggest(course.total_lectures, course.attended_lectures, threshold),
            current_percentage: calculator::percentage(course.total_lectures, course.attended_lectures),
            schedule_id: occurrence.slot.id.clone(),
            lecture_date: occurrence.date,
            lecture_time: occurrence.slot.start_time,
            lecture_day: occurrence.weekday.label(),
            is_today: occurrence.is_today,
            days_from_now: occurrence.days_from_now,
        }
    }
}

/// Suggestions for every regular-course lecture in `[today, today + horizon_days]`,
/// ordered by date then start time.
pub fn upcoming_suggestions(
    courses: &[Course],
    index: &ScheduleIndex,
    today: NaiveDate,
    horizon_days: u32,
    threshold: Threshold,
) -> Vec<LectureSuggestion> {
    let mut out: Vec<_> = courses
        .iter()
        .filter(|c| c.is_regular)
        .flat_map(|course| {
            index
                .upcoming(&course.id, today, horizon_days)
                .into_iter()
                .map(move |occ| LectureSuggestion::new(course, &occ, threshold))
        })
        .collect();
    out.sort_by_key(|s| (s.lecture_date, s.lecture_time));
    out
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;
    use crate::models::{RecurringSlot, Weekday};

    const T: Threshold = Threshold::DEFAULT;

    fn stamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    fn course(id: &str, total: i64, attended: i64, is_regular: bool) -> Course {
        Course {
            id: id.into(),
            owner_id: "u1".into(),
            name: id.to_uppercase(),
            total_lectures: total,
            attended_lectures: attended,
            is_regular,
            version: 0,
            created_at: stamp(),
            updated_at: stamp(),
        }
    }

    fn lecture(id: &str, course_id: &str, weekday: Weekday, hour: u32) -> RecurringSlot {
        RecurringSlot {
            id: id.into(),
            course_id: course_id.into(),
            weekday,
            start_time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(hour + 1, 0, 0).unwrap(),
            room: None,
            professor: None,
        }
    }

    #[test]
    fn below_threshold_is_critical() {
        let s = suggest(28, 20, T);
        assert_eq!(s.kind, SuggestionKind::Critical);
        assert_eq!(s.action, SuggestedAction::Attend);
        assert_eq!(s.message, "Must attend! Need 4 more lectures to reach 75%");
    }

    #[test]
    fn between_threshold_and_comfort_is_warning() {
        let s = suggest(10, 8, T); // 80% is not a warning
        assert_ne!(s.kind, SuggestionKind::Warning);
        let s = suggest(20, 15, T);
        assert_eq!(s.kind, SuggestionKind::Warning);
        assert_eq!(s.message, "Recommended to attend (currently 75%)");
    }

    #[test]
    fn comfortable_with_buffer_is_safe() {
        let s = suggest(30, 28, T);
        assert_eq!(s.kind, SuggestionKind::Safe);
        assert_eq!(s.action, SuggestedAction::Optional);
        assert!(s.message.contains("skip 7 more"));
    }

    #[test]
    fn comfortable_without_buffer_is_caution() {
        // 4/5 = 80%, and 4/6 would drop below 75%
        let s = suggest(5, 4, T);
        assert_eq!(s.kind, SuggestionKind::Caution);
        assert_eq!(s.action, SuggestedAction::Attend);
    }

    #[test]
    fn only_regular_courses_are_suggested_most_urgent_first() {
        let courses = vec![
            course("safe", 30, 28, true),
            course("crit", 28, 20, true),
            course("side", 10, 1, false),
        ];
        let out = course_suggestions(&courses, &ScheduleIndex::default(), stamp(), T);
        let ids: Vec<_> = out.iter().map(|s| s.course_id.as_str()).collect();
        assert_eq!(ids, vec!["crit", "safe"]);
        assert_eq!(out[0].current_percentage, 71.43);
        assert_eq!(out[0].next_lecture, None);
    }

    #[test]
    fn critical_suggestion_names_the_next_lecture() {
        let courses = vec![course("math", 28, 20, true)];
        let index = ScheduleIndex::new(vec![
            lecture("math-fri", "math", Weekday::Friday, 9),
            lecture("math-wed", "math", Weekday::Wednesday, 11),
        ]);
        // Monday 2024-01-01 midnight
        let out = course_suggestions(&courses, &index, stamp(), T);
        let next = out[0].next_lecture.unwrap();
        assert_eq!(next.date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert_eq!(
            out[0].suggestion.message,
            "Must attend! Need 4 more lectures to reach 75% (Next: Wednesday 11:00)"
        );
    }

    #[test]
    fn upcoming_suggestions_are_time_ordered() {
        let courses = vec![course("math", 28, 20, true), course("bio", 30, 28, true)];
        let index = ScheduleIndex::new(vec![
            lecture("math-tue", "math", Weekday::Tuesday, 9),
            lecture("bio-mon", "bio", Weekday::Monday, 14),
            lecture("math-mon", "math", Weekday::Monday, 10),
        ]);
        // Monday 2024-01-01
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let out = upcoming_suggestions(&courses, &index, today, 1, T);
        let got: Vec<_> = out.iter().map(|s| (s.schedule_id.as_str(), s.suggestion.kind)).collect();
        assert_eq!(
            got,
            vec![
                ("math-mon", SuggestionKind::Critical),
                ("bio-mon", SuggestionKind::Safe),
                ("math-tue", SuggestionKind::Critical),
            ]
        );
        assert!(out[0].is_today);
        assert_eq!(out[2].lecture_day, "Tuesday");
        assert_eq!(out[2].days_from_now, 1);
    }

    #[test]
    fn lecture_suggestion_serializes_flat() {
        let courses = vec![course("math", 28, 20, true)];
        let index = ScheduleIndex::new(vec![lecture("m", "math", Weekday::Monday, 10)]);
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let out = upcoming_suggestions(&courses, &index, today, 0, T);
        let json = serde_json::to_value(&out[0]).unwrap();
        assert_eq!(json["type"], "critical");
        assert_eq!(json["lecture_time"], "10:00");
        assert_eq!(json["lecture_date"], "2024-01-01");
        assert_eq!(json["current_percentage"], 71.43);
    }
}
