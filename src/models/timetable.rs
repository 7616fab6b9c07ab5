use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::domain::ValidationError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Timetable {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub last_refreshed: NaiveDateTime,
    pub version: i64,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum SlotCategory {
    Study,
    Personal,
    Meeting,
    Break,
    Other,
}

impl SlotCategory {
    pub const ALL: [SlotCategory; 5] = [
        SlotCategory::Study,
        SlotCategory::Personal,
        SlotCategory::Meeting,
        SlotCategory::Break,
        SlotCategory::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SlotCategory::Study => "study",
            SlotCategory::Personal => "personal",
            SlotCategory::Meeting => "meeting",
            SlotCategory::Break => "break",
            SlotCategory::Other => "other",
        }
    }
}

impl FromStr for SlotCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        SlotCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == needle)
            .ok_or_else(|| ValidationError::UnknownCategory(s.to_string()))
    }
}

impl fmt::Display for SlotCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A one-off block booked on a specific date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ManualSlot {
    pub id: String,
    pub timetable_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub title: String,
    pub category: SlotCategory,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

impl ManualSlot {
    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSlotRequest {
    pub title: String,
    #[serde(default = "default_category")]
    pub category: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub notes: Option<String>,
}

fn default_category() -> String {
    SlotCategory::Other.as_str().to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSlotRequest {
    pub title: Option<String>,
    pub category: Option<String>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub notes: Option<String>,
}
