pub mod repository;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::error::AppError;
use crate::models::{AttendanceRecord, Course, ManualSlot, RecurringSlot, Timetable};

pub use repository::SqliteStore;

/// Data-access verbs the services rely on.
///
/// Methods taking an owner id never return another owner's rows. Writes
/// guarded by a `version` only succeed when the stored version still equals
/// the one on the passed record, and report `false`/`None` otherwise.
#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> Result<(), AppError>;

    async fn list_courses(&self, owner_id: &str) -> Result<Vec<Course>, AppError>;
    async fn load_course(&self, owner_id: &str, id: &str) -> Result<Option<Course>, AppError>;
    /// `false` when the owner already has a course with that name.
    async fn insert_course(&self, course: &Course) -> Result<bool, AppError>;
    /// Version-guarded update of name, counters and the regular flag.
    async fn save_course(&self, course: &Course) -> Result<bool, AppError>;
    async fn delete_course(&self, owner_id: &str, id: &str) -> Result<bool, AppError>;

    async fn list_schedules_for_course(&self, course_id: &str) -> Result<Vec<RecurringSlot>, AppError>;
    async fn list_schedules_for_owner(&self, owner_id: &str) -> Result<Vec<RecurringSlot>, AppError>;
    /// `false` when the course already has a slot at that weekday and start time.
    async fn insert_schedule(&self, slot: &RecurringSlot) -> Result<bool, AppError>;
    async fn delete_schedule(&self, owner_id: &str, id: &str) -> Result<bool, AppError>;

    async fn list_attendance_records(&self, course_id: &str, limit: i64) -> Result<Vec<AttendanceRecord>, AppError>;
    async fn find_attendance_record(&self, course_id: &str, date: NaiveDate) -> Result<Option<AttendanceRecord>, AppError>;
    /// Writes the record and the course counters together, guarded by the course version.
    async fn upsert_attendance_record(&self, course: &Course, record: &AttendanceRecord) -> Result<bool, AppError>;

    async fn load_or_create_timetable(&self, owner_id: &str, now: NaiveDateTime) -> Result<Timetable, AppError>;
    /// Slots with `from <= date <= to`, ordered by date and start time.
    async fn list_manual_slots(&self, timetable_id: &str, from: NaiveDate, to: NaiveDate) -> Result<Vec<ManualSlot>, AppError>;
    async fn load_manual_slot(&self, owner_id: &str, id: &str) -> Result<Option<ManualSlot>, AppError>;
    /// Inserts or replaces the slot, guarded by the timetable version.
    async fn save_manual_slot(&self, timetable: &Timetable, slot: &ManualSlot) -> Result<bool, AppError>;
    async fn delete_manual_slot(&self, owner_id: &str, id: &str) -> Result<bool, AppError>;
    /// Deletes slots dated before `before` and stamps `last_refreshed`. Returns
    /// the number of deleted slots, or `None` when the timetable moved on.
    async fn purge_manual_slots(
        &self,
        timetable: &Timetable,
        before: NaiveDate,
        refreshed_at: NaiveDateTime,
    ) -> Result<Option<u64>, AppError>;
}
