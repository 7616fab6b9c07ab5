use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub total_lectures: i64,
    pub attended_lectures: i64,
    pub is_regular: bool,
    pub version: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCourseRequest {
    pub name: String,
    #[serde(default)]
    pub total_lectures: i64,
    #[serde(default)]
    pub attended_lectures: i64,
    #[serde(default)]
    pub is_regular: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCourseRequest {
    pub name: Option<String>,
    pub total_lectures: Option<i64>,
    pub attended_lectures: Option<i64>,
    pub is_regular: Option<bool>,
}
