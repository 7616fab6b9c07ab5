//! Lookup of recurring lecture slots by course and weekday.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::models::{RecurringSlot, Weekday};

/// One concrete date a recurring slot falls on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub slot: RecurringSlot,
    pub is_today: bool,
    pub days_from_now: i64,
}

/// Recurring slots grouped per course, each group ordered by weekday then start time.
#[derive(Debug, Clone, Default)]
pub struct ScheduleIndex {
    by_course: BTreeMap<String, Vec<RecurringSlot>>,
}

impl ScheduleIndex {
    pub fn new(slots: impl IntoIterator<Item = RecurringSlot>) -> Self {
        let mut by_course: BTreeMap<String, Vec<RecurringSlot>> = BTreeMap::new();
        for slot in slots {
            by_course.entry(slot.course_id.clone()).or_default().push(slot);
        }
        for slots in by_course.values_mut() {
            slots.sort_by_key(|s| (s.weekday, s.start_time));
        }
        Self { by_course }
    }

    pub fn slots_for_course(&self, course_id: &str) -> &[RecurringSlot] {
        self.by_course
            .get(course_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn slots_for_weekday(&self, course_id: &str, weekday: Weekday) -> Vec<&RecurringSlot> {
        self.slots_for_course(course_id)
            .iter()
            .filter(|s| s.weekday == weekday)
            .collect()
    }

    /// Every occurrence of the course's slots in `[today, today + horizon_days]`.
    pub fn upcoming(&self, course_id: &str, today: NaiveDate, horizon_days: u32) -> Vec<Occurrence> {
        let slots = self.slots_for_course(course_id);
        let mut out = Vec::new();
        for offset in 0..=u64::from(horizon_days) {
            let Some(date) = today.checked_add_days(Days::new(offset)) else {
                break;
            };
            let weekday = Weekday::of(date);
            for slot in slots.iter().filter(|s| s.weekday == weekday) {
                out.push(Occurrence {
                    date,
                    weekday,
                    slot: slot.clone(),
                    is_today: offset == 0,
                    days_from_now: offset as i64,
                });
            }
        }
        // dates are generated in order; slots within a day already sorted
        out
    }
}

/// Next date on or after today the slot happens. A slot that already started
/// today rolls over to next week.
pub fn next_occurrence(slot: &RecurringSlot, now: NaiveDateTime) -> NaiveDate {
    let today = now.date();
    let current = Weekday::of(today).offset();
    let target = slot.weekday.offset();
    let days_ahead = if target == current {
        if slot.start_time > now.time() { 0 } else { 7 }
    } else {
        (target + 7 - current) % 7
    };
    today + Days::new(u64::from(days_ahead))
}
