use std::str::FromStr;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::debug;
use uuid::Uuid;

use crate::db::Store;
use crate::error::AppError;
use crate::models::{AttendanceRecord, Course, ManualSlot, RecurringSlot, Timetable};

const COURSE_COLUMNS: &str =
    "id, owner_id, name, total_lectures, attended_lectures, is_regular, version, created_at, updated_at";
const SCHEDULE_COLUMNS: &str = "id, course_id, weekday, start_time, end_time, room, professor";
const SLOT_COLUMNS: &str =
    "id, timetable_id, date, start_time, end_time, title, category, notes, created_at";

#[derive(Clone)]
pub struct SqliteStore {
    db: SqlitePool,
}

impl SqliteStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        Ok(Self::new(pool))
    }

    /// Single-connection in-memory database with the schema applied.
    pub async fn in_memory() -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .map_err(sqlx::Error::from)?;
        Ok(())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

#[async_trait]
impl Store for SqliteStore {
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("select 1").execute(&self.db).await?;
        Ok(())
    }

    async fn list_courses(&self, owner_id: &str) -> Result<Vec<Course>, AppError> {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE owner_id = ? ORDER BY name");
        let courses = sqlx::query_as::<_, Course>(&sql)
            .bind(owner_id)
            .fetch_all(&self.db)
            .await?;
        Ok(courses)
    }

    async fn load_course(&self, owner_id: &str, id: &str) -> Result<Option<Course>, AppError> {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = ? AND owner_id = ?");
        let course = sqlx::query_as::<_, Course>(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.db)
            .await?;
        Ok(course)
    }

    async fn insert_course(&self, course: &Course) -> Result<bool, AppError> {
        let result = sqlx::query(
            "INSERT INTO courses (id, owner_id, name, total_lectures, attended_lectures, is_regular, version, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&course.id)
        .bind(&course.owner_id)
        .bind(&course.name)
        .bind(course.total_lectures)
        .bind(course.attended_lectures)
        .bind(course.is_regular)
        .bind(course.version)
        .bind(course.created_at)
        .bind(course.updated_at)
        .execute(&self.db)
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) if is_unique_violation(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn save_course(&self, course: &Course) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE courses SET name = ?, total_lectures = ?, attended_lectures = ?, is_regular = ?, updated_at = ?, version = version + 1 WHERE id = ? AND owner_id = ? AND version = ?"
        )
        .bind(&course.name)
        .bind(course.total_lectures)
        .bind(course.attended_lectures)
        .bind(course.is_regular)
        .bind(course.updated_at)
        .bind(&course.id)
        .bind(&course.owner_id)
        .bind(course.version)
        .execute(&self.db)
        .await;

        match result {
            Ok(done) => Ok(done.rows_affected() > 0),
            Err(e) if is_unique_violation(&e) => Err(AppError::Conflict(format!(
                "Course \"{}\" already exists",
                course.name
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_course(&self, owner_id: &str, id: &str) -> Result<bool, AppError> {
        let deleted = sqlx::query("DELETE FROM courses WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(owner_id)
            .execute(&self.db)
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }

    async fn list_schedules_for_course(&self, course_id: &str) -> Result<Vec<RecurringSlot>, AppError> {
        let sql = format!(
            "SELECT {SCHEDULE_COLUMNS} FROM lecture_schedules WHERE course_id = ? ORDER BY start_time"
        );
        let slots = sqlx::query_as::<_, RecurringSlot>(&sql)
            .bind(course_id)
            .fetch_all(&self.db)
            .await?;
        Ok(slots)
    }

    async fn list_schedules_for_owner(&self, owner_id: &str) -> Result<Vec<RecurringSlot>, AppError> {
        let slots = sqlx::query_as::<_, RecurringSlot>(
            "SELECT s.id, s.course_id, s.weekday, s.start_time, s.end_time, s.room, s.professor FROM lecture_schedules s JOIN courses c ON c.id = s.course_id WHERE c.owner_id = ? ORDER BY s.start_time"
        )
        .bind(owner_id)
        .fetch_all(&self.db)
        .await?;
        Ok(slots)
    }

    async fn insert_schedule(&self, slot: &RecurringSlot) -> Result<bool, AppError> {
        let result = sqlx::query(
            "INSERT INTO lecture_schedules (id, course_id, weekday, start_time, end_time, room, professor) VALUES (?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&slot.id)
        .bind(&slot.course_id)
        .bind(slot.weekday)
        .bind(slot.start_time)
        .bind(slot.end_time)
        .bind(&slot.room)
        .bind(&slot.professor)
        .execute(&self.db)
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) if is_unique_violation(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_schedule(&self, owner_id: &str, id: &str) -> Result<bool, AppError> {
        let deleted = sqlx::query(
            "DELETE FROM lecture_schedules WHERE id = ? AND course_id IN (SELECT id FROM courses WHERE owner_id = ?)"
        )
        .bind(id)
        .bind(owner_id)
        .execute(&self.db)
        .await?
        .rows_affected();
        Ok(deleted > 0)
    }

    async fn list_attendance_records(&self, course_id: &str, limit: i64) -> Result<Vec<AttendanceRecord>, AppError> {
        let records = sqlx::query_as::<_, AttendanceRecord>(
            "SELECT id, course_id, date, attended, notes, schedule_id FROM attendance_records WHERE course_id = ? ORDER BY date DESC LIMIT ?"
        )
        .bind(course_id)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;
        Ok(records)
    }

    async fn find_attendance_record(&self, course_id: &str, date: NaiveDate) -> Result<Option<AttendanceRecord>, AppError> {
        let record = sqlx::query_as::<_, AttendanceRecord>(
            "SELECT id, course_id, date, attended, notes, schedule_id FROM attendance_records WHERE course_id = ? AND date = ?"
        )
        .bind(course_id)
        .bind(date)
        .fetch_optional(&self.db)
        .await?;
        Ok(record)
    }

    async fn upsert_attendance_record(&self, course: &Course, record: &AttendanceRecord) -> Result<bool, AppError> {
        let mut tx = self.db.begin().await?;

        let bumped = sqlx::query(
            "UPDATE courses SET total_lectures = ?, attended_lectures = ?, updated_at = ?, version = version + 1 WHERE id = ? AND owner_id = ? AND version = ?"
        )
        .bind(course.total_lectures)
        .bind(course.attended_lectures)
        .bind(course.updated_at)
        .bind(&course.id)
        .bind(&course.owner_id)
        .bind(course.version)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if bumped == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO attendance_records (id, course_id, date, attended, notes, schedule_id) VALUES (?, ?, ?, ?, ?, ?) ON CONFLICT(course_id, date) DO UPDATE SET attended = excluded.attended, notes = excluded.notes, schedule_id = excluded.schedule_id"
        )
        .bind(&record.id)
        .bind(&record.course_id)
        .bind(record.date)
        .bind(record.attended)
        .bind(&record.notes)
        .bind(&record.schedule_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn load_or_create_timetable(&self, owner_id: &str, now: NaiveDateTime) -> Result<Timetable, AppError> {
        let created = sqlx::query(
            "INSERT INTO timetables (id, owner_id, name, last_refreshed, version, created_at) VALUES (?, ?, 'My Timetable', ?, 0, ?) ON CONFLICT(owner_id) DO NOTHING"
        )
        .bind(Uuid::new_v4().to_string())
        .bind(owner_id)
        .bind(now)
        .bind(now)
        .execute(&self.db)
        .await?
        .rows_affected();

        if created > 0 {
            debug!("created timetable for {}", owner_id);
        }

        let timetable = sqlx::query_as::<_, Timetable>(
            "SELECT id, owner_id, name, last_refreshed, version, created_at FROM timetables WHERE owner_id = ?"
        )
        .bind(owner_id)
        .fetch_one(&self.db)
        .await?;
        Ok(timetable)
    }

    async fn list_manual_slots(&self, timetable_id: &str, from: NaiveDate, to: NaiveDate) -> Result<Vec<ManualSlot>, AppError> {
        let sql = format!(
            "SELECT {SLOT_COLUMNS} FROM timetable_slots WHERE timetable_id = ? AND date >= ? AND date <= ? ORDER BY date, start_time"
        );
        let slots = sqlx::query_as::<_, ManualSlot>(&sql)
            .bind(timetable_id)
            .bind(from)
            .bind(to)
            .fetch_all(&self.db)
            .await?;
        Ok(slots)
    }

    async fn load_manual_slot(&self, owner_id: &str, id: &str) -> Result<Option<ManualSlot>, AppError> {
        let slot = sqlx::query_as::<_, ManualSlot>(
            "SELECT s.id, s.timetable_id, s.date, s.start_time, s.end_time, s.title, s.category, s.notes, s.created_at FROM timetable_slots s JOIN timetables t ON t.id = s.timetable_id WHERE s.id = ? AND t.owner_id = ?"
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(slot)
    }

    async fn save_manual_slot(&self, timetable: &Timetable, slot: &ManualSlot) -> Result<bool, AppError> {
        let mut tx = self.db.begin().await?;

        let bumped = sqlx::query(
            "UPDATE timetables SET version = version + 1 WHERE id = ? AND version = ?"
        )
        .bind(&timetable.id)
        .bind(timetable.version)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if bumped == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        let result = sqlx::query(
            "INSERT INTO timetable_slots (id, timetable_id, date, start_time, end_time, title, category, notes, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) ON CONFLICT(id) DO UPDATE SET date = excluded.date, start_time = excluded.start_time, end_time = excluded.end_time, title = excluded.title, category = excluded.category, notes = excluded.notes"
        )
        .bind(&slot.id)
        .bind(&timetable.id)
        .bind(slot.date)
        .bind(slot.start_time)
        .bind(slot.end_time)
        .bind(&slot.title)
        .bind(slot.category)
        .bind(&slot.notes)
        .bind(slot.created_at)
        .execute(&mut *tx)
        .await;

        match result {
            Ok(_) => {
                tx.commit().await?;
                Ok(true)
            }
            Err(e) if is_unique_violation(&e) => {
                tx.rollback().await?;
                Err(AppError::Conflict(
                    "A slot already starts at this time".to_string(),
                ))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_manual_slot(&self, owner_id: &str, id: &str) -> Result<bool, AppError> {
        let deleted = sqlx::query(
            "DELETE FROM timetable_slots WHERE id = ? AND timetable_id IN (SELECT id FROM timetables WHERE owner_id = ?)"
        )
        .bind(id)
        .bind(owner_id)
        .execute(&self.db)
        .await?
        .rows_affected();
        Ok(deleted > 0)
    }

    async fn purge_manual_slots(
        &self,
        timetable: &Timetable,
        before: NaiveDate,
        refreshed_at: NaiveDateTime,
    ) -> Result<Option<u64>, AppError> {
        let mut tx = self.db.begin().await?;

        let bumped = sqlx::query(
            "UPDATE timetables SET last_refreshed = ?, version = version + 1 WHERE id = ? AND version = ?"
        )
        .bind(refreshed_at)
        .bind(&timetable.id)
        .bind(timetable.version)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if bumped == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let purged = sqlx::query("DELETE FROM timetable_slots WHERE timetable_id = ? AND date < ?")
            .bind(&timetable.id)
            .bind(before)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(Some(purged))
    }
}
