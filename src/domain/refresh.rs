//! Weekly pruning of past manual slots.

use chrono::{Days, NaiveDate, NaiveDateTime};

use crate::models::{Timetable, Weekday};

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(Weekday::of(date).offset()))
}

pub fn should_refresh(last_refreshed: NaiveDateTime, now: NaiveDateTime) -> bool {
    week_start(now.date()) > week_start(last_refreshed.date())
}

/// What a due refresh has to do to the stored timetable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPlan {
    /// Manual slots dated before this day are deleted.
    pub purge_before: NaiveDate,
    pub refreshed_at: NaiveDateTime,
}

/// `None` while the timetable is still current.
pub fn plan_refresh(timetable: &Timetable, now: NaiveDateTime) -> Option<RefreshPlan> {
    should_refresh(timetable.last_refreshed, now).then(|| RefreshPlan {
        purge_before: week_start(now.date()),
        refreshed_at: now,
    })
}
