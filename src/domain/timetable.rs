//! Merges recurring lectures with booked manual slots and checks bookings for overlaps.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate, NaiveTime};
use serde::Serialize;

use super::ValidationError;
use super::input::validate_time_range;
use super::schedule::ScheduleIndex;
use crate::models::{Course, ManualSlot, SlotCategory, Weekday};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Recurring,
    Manual,
}

/// One row of a composed day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimetableEntry {
    pub kind: EntryKind,
    pub id: String,
    pub title: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub duration_minutes: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub professor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<SlotCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl TimetableEntry {
    fn manual(slot: &ManualSlot) -> Self {
        Self {
            kind: EntryKind::Manual,
            id: slot.id.clone(),
            title: slot.title.clone(),
            start_time: slot.start_time,
            end_time: slot.end_time,
            duration_minutes: slot.duration_minutes(),
            course_id: None,
            date: Some(slot.date),
            room: None,
            professor: None,
            category: Some(slot.category),
            notes: slot.notes.clone(),
        }
    }
}

/// Entries for all seven weekdays, Monday first.
pub type WeeklyView = BTreeMap<Weekday, Vec<TimetableEntry>>;

fn recurring_entries(courses: &[Course], index: &ScheduleIndex, weekday: Weekday) -> Vec<TimetableEntry> {
    courses
        .iter()
        .filter(|c| c.is_regular)
        .flat_map(|course| {
            index
                .slots_for_weekday(&course.id, weekday)
                .into_iter()
                .map(move |slot| TimetableEntry {
                    kind: EntryKind::Recurring,
                    id: slot.id.clone(),
                    title: course.name.clone(),
                    start_time: slot.start_time,
                    end_time: slot.end_time,
                    duration_minutes: slot.duration_minutes(),
                    course_id: Some(course.id.clone()),
                    date: None,
                    room: slot.room.clone(),
                    professor: slot.professor.clone(),
                    category: None,
                    notes: None,
                })
        })
        .collect()
}

pub fn weekly_view(
    courses: &[Course],
    index: &ScheduleIndex,
    manual_slots: &[ManualSlot],
    week_start: NaiveDate,
) -> WeeklyView {
    let week_end = week_start + Days::new(6);
    let mut view: WeeklyView = Weekday::ALL
        .into_iter()
        .map(|day| (day, recurring_entries(courses, index, day)))
        .collect();

    for slot in manual_slots
        .iter()
        .filter(|s| s.date >= week_start && s.date <= week_end)
    {
        view.entry(Weekday::of(slot.date))
            .or_default()
            .push(TimetableEntry::manual(slot));
    }

    for entries in view.values_mut() {
        entries.sort_by_key(|e| e.start_time);
    }
    view
}

pub fn day_view(
    courses: &[Course],
    index: &ScheduleIndex,
    manual_slots: &[ManualSlot],
    date: NaiveDate,
) -> Vec<TimetableEntry> {
    let mut entries = recurring_entries(courses, index, Weekday::of(date));
    entries.extend(
        manual_slots
            .iter()
            .filter(|s| s.date == date)
            .map(TimetableEntry::manual),
    );
    entries.sort_by_key(|e| e.start_time);
    entries
}

/// A booking being placed or moved.
#[derive(Debug, Clone, Copy)]
pub struct SlotCandidate<'a> {
    /// Set when editing an existing slot so it is not compared with itself.
    pub id: Option<&'a str>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl<'a> SlotCandidate<'a> {
    pub fn for_slot(slot: &'a ManualSlot) -> Self {
        Self {
            id: Some(slot.id.as_str()),
            date: slot.date,
            start_time: slot.start_time,
            end_time: slot.end_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictOutcome {
    pub has_conflict: bool,
    pub reason: Option<String>,
}

impl ConflictOutcome {
    fn clear() -> Self {
        Self { has_conflict: false, reason: None }
    }

    fn with(reason: String) -> Self {
        Self { has_conflict: true, reason: Some(reason) }
    }
}

/// Half-open interval overlap.
pub fn overlaps(a_start: NaiveTime, a_end: NaiveTime, b_start: NaiveTime, b_end: NaiveTime) -> bool {
    a_start < b_end && a_end > b_start
}

fn span(start: NaiveTime, end: NaiveTime) -> String {
    format!("{}-{}", start.format("%H:%M"), end.format("%H:%M"))
}

/// Checks a candidate against the owner's booked slots and regular lectures.
///
/// Manual slots on the same date are checked before lectures; the first hit
/// is reported.
pub fn detect_conflict(
    candidate: &SlotCandidate<'_>,
    manual_slots: &[ManualSlot],
    courses: &[Course],
    index: &ScheduleIndex,
) -> Result<ConflictOutcome, ValidationError> {
    validate_time_range(candidate.start_time, candidate.end_time)?;

    let manual_hit = manual_slots
        .iter()
        .filter(|s| s.date == candidate.date)
        .filter(|s| candidate.id != Some(s.id.as_str()))
        .find(|s| overlaps(candidate.start_time, candidate.end_time, s.start_time, s.end_time));
    if let Some(slot) = manual_hit {
        return Ok(ConflictOutcome::with(format!(
            "Overlaps with \"{}\" ({})",
            slot.title,
            span(slot.start_time, slot.end_time)
        )));
    }

    let weekday = Weekday::of(candidate.date);
    for course in courses.iter().filter(|c| c.is_regular) {
        let hit = index
            .slots_for_weekday(&course.id, weekday)
            .into_iter()
            .find(|s| overlaps(candidate.start_time, candidate.end_time, s.start_time, s.end_time));
        if let Some(lecture) = hit {
            return Ok(ConflictOutcome::with(format!(
                "Overlaps with {} lecture on {} ({})",
                course.name,
                weekday.label(),
                span(lecture.start_time, lecture.end_time)
            )));
        }
    }

    Ok(ConflictOutcome::clear())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;
    use crate::models::RecurringSlot;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    // 2024-01-01 is a Monday
    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn stamp() -> NaiveDateTime {
        day(1).and_hms_opt(0, 0, 0).unwrap()
    }

    fn course(id: &str, name: &str, is_regular: bool) -> Course {
        Course {
            id: id.into(),
            owner_id: "u1".into(),
            name: name.into(),
            total_lectures: 0,
            attended_lectures: 0,
            is_regular,
            version: 0,
            created_at: stamp(),
            updated_at: stamp(),
        }
    }

    fn lecture(id: &str, course_id: &str, weekday: Weekday, start: NaiveTime, end: NaiveTime) -> RecurringSlot {
        RecurringSlot {
            id: id.into(),
            course_id: course_id.into(),
            weekday,
            start_time: start,
            end_time: end,
            room: Some("B12".into()),
            professor: None,
        }
    }

    fn manual(id: &str, date: NaiveDate, start: NaiveTime, end: NaiveTime) -> ManualSlot {
        ManualSlot {
            id: id.into(),
            timetable_id: "tt".into(),
            date,
            start_time: start,
            end_time: end,
            title: format!("slot {id}"),
            category: SlotCategory::Study,
            notes: None,
            created_at: stamp(),
        }
    }

    fn fixture() -> (Vec<Course>, ScheduleIndex) {
        let courses = vec![course("phy", "Physics", true), course("art", "Art", false)];
        let index = ScheduleIndex::new(vec![
            lecture("phy-mon", "phy", Weekday::Monday, t(10, 30), t(11, 30)),
            lecture("phy-wed", "phy", Weekday::Wednesday, t(8, 0), t(9, 0)),
            lecture("art-mon", "art", Weekday::Monday, t(8, 0), t(9, 0)),
        ]);
        (courses, index)
    }

    #[test]
    fn manual_slot_overlapping_lecture_conflicts() {
        let (courses, index) = fixture();
        let candidate = SlotCandidate { id: None, date: day(1), start_time: t(10, 0), end_time: t(11, 0) };
        let outcome = detect_conflict(&candidate, &[], &courses, &index).unwrap();
        assert!(outcome.has_conflict);
        assert!(outcome.reason.unwrap().contains("Physics"));
    }

    #[test]
    fn touching_ranges_do_not_conflict() {
        let (courses, index) = fixture();
        let before = SlotCandidate { id: None, date: day(1), start_time: t(9, 30), end_time: t(10, 30) };
        let after = SlotCandidate { id: None, date: day(1), start_time: t(11, 30), end_time: t(12, 0) };
        assert!(!detect_conflict(&before, &[], &courses, &index).unwrap().has_conflict);
        assert!(!detect_conflict(&after, &[], &courses, &index).unwrap().has_conflict);
    }

    #[test]
    fn irregular_course_lectures_are_ignored() {
        let (courses, index) = fixture();
        let candidate = SlotCandidate { id: None, date: day(1), start_time: t(8, 0), end_time: t(9, 0) };
        assert!(!detect_conflict(&candidate, &[], &courses, &index).unwrap().has_conflict);
    }

    #[test]
    fn manual_conflicts_respect_date_and_self() {
        let (courses, index) = fixture();
        let existing = vec![manual("gym", day(2), t(18, 0), t(19, 0))];
        let same_day = SlotCandidate { id: None, date: day(2), start_time: t(18, 30), end_time: t(19, 30) };
        let other_day = SlotCandidate { id: None, date: day(3), start_time: t(18, 30), end_time: t(19, 30) };
        let editing_self = SlotCandidate { id: Some("gym"), date: day(2), start_time: t(18, 30), end_time: t(19, 30) };

        let outcome = detect_conflict(&same_day, &existing, &courses, &index).unwrap();
        assert_eq!(outcome.reason.as_deref(), Some("Overlaps with \"slot gym\" (18:00-19:00)"));
        assert!(!detect_conflict(&other_day, &existing, &courses, &index).unwrap().has_conflict);
        assert!(!detect_conflict(&editing_self, &existing, &courses, &index).unwrap().has_conflict);
    }

    #[test]
    fn inverted_range_is_a_validation_error() {
        let (courses, index) = fixture();
        let candidate = SlotCandidate { id: None, date: day(1), start_time: t(11, 0), end_time: t(11, 0) };
        assert_eq!(
            detect_conflict(&candidate, &[], &courses, &index),
            Err(ValidationError::InvalidTimeRange)
        );
    }

    #[test]
    fn conflict_is_symmetric() {
        let (courses, index) = fixture();
        let ranges = [(9, 10), (9, 11), (10, 11), (10, 12), (11, 12), (8, 13), (12, 13)];
        for &(a0, a1) in &ranges {
            for &(b0, b1) in &ranges {
                let a = manual("a", day(2), t(a0, 0), t(a1, 0));
                let b = manual("b", day(2), t(b0, 0), t(b1, 0));
                let ab = detect_conflict(&SlotCandidate::for_slot(&a), &[b.clone()], &courses, &index).unwrap();
                let ba = detect_conflict(&SlotCandidate::for_slot(&b), &[a.clone()], &courses, &index).unwrap();
                assert_eq!(ab.has_conflict, ba.has_conflict, "{a0}-{a1} vs {b0}-{b1}");
            }
        }
    }

    #[test]
    fn weekly_view_merges_and_sorts() {
        let (courses, index) = fixture();
        let slots = vec![
            manual("early", day(1), t(7, 0), t(8, 0)),
            manual("late", day(1), t(12, 0), t(13, 0)),
            manual("next-week", day(8), t(7, 0), t(8, 0)),
            manual("sunday", day(7), t(20, 0), t(21, 0)),
        ];
        let view = weekly_view(&courses, &index, &slots, day(1));
        assert_eq!(view.len(), 7);

        let monday: Vec<_> = view[&Weekday::Monday].iter().map(|e| (e.kind, e.id.as_str())).collect();
        assert_eq!(
            monday,
            vec![
                (EntryKind::Manual, "early"),
                (EntryKind::Recurring, "phy-mon"),
                (EntryKind::Manual, "late"),
            ]
        );
        assert_eq!(view[&Weekday::Wednesday].len(), 1);
        assert_eq!(view[&Weekday::Sunday][0].id, "sunday");
        assert!(view[&Weekday::Tuesday].is_empty());
    }

    #[test]
    fn ties_keep_recurring_before_manual() {
        let (courses, index) = fixture();
        let slots = vec![manual("same", day(1), t(10, 30), t(10, 45))];
        let view = weekly_view(&courses, &index, &slots, day(1));
        let kinds: Vec<_> = view[&Weekday::Monday].iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EntryKind::Recurring, EntryKind::Manual]);
    }

    #[test]
    fn day_view_uses_exact_date_for_manual_slots() {
        let (courses, index) = fixture();
        let slots = vec![
            manual("this-monday", day(1), t(12, 0), t(13, 0)),
            manual("next-monday", day(8), t(12, 0), t(13, 0)),
        ];
        let entries = day_view(&courses, &index, &slots, day(8));
        let ids: Vec<_> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["phy-mon", "next-monday"]);
        assert_eq!(entries[0].title, "Physics");
    }

    #[test]
    fn entries_carry_their_length() {
        let (courses, index) = fixture();
        let slots = vec![manual("short", day(1), t(12, 0), t(12, 45))];
        let entries = day_view(&courses, &index, &slots, day(1));
        let lengths: Vec<_> = entries.iter().map(|e| (e.id.as_str(), e.duration_minutes)).collect();
        assert_eq!(lengths, vec![("phy-mon", 60), ("short", 45)]);
    }
}
