use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AttendanceRecord {
    pub id: String,
    pub course_id: String,
    pub date: NaiveDate,
    pub attended: bool,
    pub notes: Option<String>,
    pub schedule_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceAction {
    Increment,
    Decrement,
    AddTotal,
    RemoveTotal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAttendanceRequest {
    pub course_id: String,
    pub action: AttendanceAction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkAttendanceRequest {
    pub course_id: String,
    pub date: String,
    #[serde(default = "default_attended")]
    pub attended: bool,
    pub notes: Option<String>,
    pub schedule_id: Option<String>,
}

fn default_attended() -> bool {
    true
}

/// Body returned by the attendance endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceUpdateResponse {
    pub success: bool,
    pub attendance_percentage: f64,
    pub attended_lectures: i64,
    pub total_lectures: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_below_threshold: Option<bool>,
}
