use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::Weekday;

/// A lecture that repeats every week on a fixed weekday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RecurringSlot {
    pub id: String,
    pub course_id: String,
    pub weekday: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub room: Option<String>,
    pub professor: Option<String>,
}

impl RecurringSlot {
    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewScheduleRequest {
    pub weekday: String,
    pub start_time: String,
    pub end_time: String,
    pub room: Option<String>,
    pub professor: Option<String>,
}

/// Accepts either a single schedule or a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NewSchedulesRequest {
    Many(Vec<NewScheduleRequest>),
    One(NewScheduleRequest),
}

impl NewSchedulesRequest {
    pub fn into_vec(self) -> Vec<NewScheduleRequest> {
        match self {
            NewSchedulesRequest::Many(items) => items,
            NewSchedulesRequest::One(item) => vec![item],
        }
    }
}
