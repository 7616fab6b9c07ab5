use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::context::RequestContext;
use crate::db::Store;
use crate::domain::{input, AttendanceStats, Counters, Occurrence, ScheduleIndex, Threshold};
use crate::error::AppError;
use crate::models::*;
use crate::services::{MAX_ATTEMPTS, concurrent_update};

const RECENT_RECORDS: i64 = 10;
const DETAIL_HORIZON_DAYS: u32 = 14;

#[derive(Debug, Clone, Serialize)]
pub struct CourseSummary {
    #[serde(flatten)]
    pub course: Course,
    #[serde(flatten)]
    pub stats: AttendanceStats,
}

impl CourseSummary {
    pub fn new(course: Course, threshold: Threshold) -> Self {
        let stats = AttendanceStats::compute(course.total_lectures, course.attended_lectures, threshold);
        Self { course, stats }
    }
}

/// A recurring slot as the API reports it.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleSummary {
    #[serde(flatten)]
    pub slot: RecurringSlot,
    pub duration_minutes: i64,
}

impl From<RecurringSlot> for ScheduleSummary {
    fn from(slot: RecurringSlot) -> Self {
        let duration_minutes = slot.duration_minutes();
        Self { slot, duration_minutes }
    }
}

#[derive(Debug, Serialize)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub summary: CourseSummary,
    pub schedules: Vec<ScheduleSummary>,
    pub recent_records: Vec<AttendanceRecord>,
    pub upcoming_lectures: Vec<Occurrence>,
}

#[derive(Debug, Serialize)]
pub struct CourseUpdate {
    #[serde(flatten)]
    pub summary: CourseSummary,
    /// The course just became regular and has no schedule yet.
    pub needs_schedule: bool,
}

#[derive(Debug, Serialize)]
pub struct AddSchedulesOutcome {
    pub created: Vec<ScheduleSummary>,
    pub duplicates: usize,
}

pub struct CourseService {
    store: Arc<dyn Store>,
    threshold: Threshold,
}

impl CourseService {
    pub fn new(store: Arc<dyn Store>, threshold: Threshold) -> Self {
        Self { store, threshold }
    }

    async fn require(&self, ctx: &RequestContext, id: &str) -> Result<Course, AppError> {
        self.store
            .load_course(&ctx.user_id, id)
            .await?
            .ok_or(AppError::NotFound)
    }

    fn respond(&self, course: &Course) -> AttendanceUpdateResponse {
        let stats = AttendanceStats::compute(course.total_lectures, course.attended_lectures, self.threshold);
        AttendanceUpdateResponse {
            success: true,
            attendance_percentage: stats.attendance_percentage,
            attended_lectures: course.attended_lectures,
            total_lectures: course.total_lectures,
            is_below_threshold: Some(stats.is_below_threshold),
        }
    }

    pub async fn list(&self, ctx: &RequestContext) -> Result<Vec<CourseSummary>, AppError> {
        let courses = self.store.list_courses(&ctx.user_id).await?;
        Ok(courses
            .into_iter()
            .map(|c| CourseSummary::new(c, self.threshold))
            .collect())
    }

    pub async fn create(&self, ctx: &RequestContext, req: NewCourseRequest) -> Result<CourseSummary, AppError> {
        let name = input::non_empty(&req.name, "Course name")?;
        input::validate_counts(req.total_lectures, req.attended_lectures)?;

        let course = Course {
            id: Uuid::new_v4().to_string(),
            owner_id: ctx.user_id.clone(),
            name,
            total_lectures: req.total_lectures,
            attended_lectures: req.attended_lectures,
            is_regular: req.is_regular,
            version: 0,
            created_at: ctx.now,
            updated_at: ctx.now,
        };

        if !self.store.insert_course(&course).await? {
            return Err(AppError::Conflict(format!("Course \"{}\" already exists", course.name)));
        }
        info!("created course {} ({}) for {}", course.id, course.name, ctx.user_id);
        Ok(CourseSummary::new(course, self.threshold))
    }

    pub async fn detail(&self, ctx: &RequestContext, id: &str) -> Result<CourseDetail, AppError> {
        let course = self.require(ctx, id).await?;
        let schedules = self.store.list_schedules_for_course(&course.id).await?;
        let recent_records = self
            .store
            .list_attendance_records(&course.id, RECENT_RECORDS)
            .await?;

        let upcoming_lectures = if course.is_regular {
            ScheduleIndex::new(schedules.clone()).upcoming(&course.id, ctx.now.date(), DETAIL_HORIZON_DAYS)
        } else {
            Vec::new()
        };

        Ok(CourseDetail {
            summary: CourseSummary::new(course, self.threshold),
            schedules: schedules.into_iter().map(ScheduleSummary::from).collect(),
            recent_records,
            upcoming_lectures,
        })
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: &str,
        req: UpdateCourseRequest,
    ) -> Result<CourseUpdate, AppError> {
        let name = req
            .name
            .as_deref()
            .map(|n| input::non_empty(n, "Course name"))
            .transpose()?;

        for attempt in 1..=MAX_ATTEMPTS {
            let mut course = self.require(ctx, id).await?;
            let was_regular = course.is_regular;

            if let Some(name) = &name {
                course.name = name.clone();
            }
            if let Some(total) = req.total_lectures {
                course.total_lectures = total;
            }
            if let Some(attended) = req.attended_lectures {
                course.attended_lectures = attended;
            }
            if let Some(is_regular) = req.is_regular {
                course.is_regular = is_regular;
            }
            input::validate_counts(course.total_lectures, course.attended_lectures)?;
            course.updated_at = ctx.now;

            if self.store.save_course(&course).await? {
                course.version += 1;
                let needs_schedule = course.is_regular && !was_regular;
                return Ok(CourseUpdate {
                    summary: CourseSummary::new(course, self.threshold),
                    needs_schedule,
                });
            }
            warn!("course {} changed underneath update (attempt {})", id, attempt);
        }
        Err(concurrent_update("Course"))
    }

    pub async fn delete(&self, ctx: &RequestContext, id: &str) -> Result<(), AppError> {
        if !self.store.delete_course(&ctx.user_id, id).await? {
            return Err(AppError::NotFound);
        }
        info!("deleted course {} for {}", id, ctx.user_id);
        Ok(())
    }

    pub async fn update_attendance(
        &self,
        ctx: &RequestContext,
        req: UpdateAttendanceRequest,
    ) -> Result<AttendanceUpdateResponse, AppError> {
        for attempt in 1..=MAX_ATTEMPTS {
            let mut course = self.require(ctx, &req.course_id).await?;
            let next = Counters::new(course.total_lectures, course.attended_lectures).apply(req.action);
            course.total_lectures = next.total;
            course.attended_lectures = next.attended;
            course.updated_at = ctx.now;

            if self.store.save_course(&course).await? {
                return Ok(self.respond(&course));
            }
            warn!("course {} changed underneath {:?} (attempt {})", course.id, req.action, attempt);
        }
        Err(concurrent_update("Course"))
    }

    pub async fn mark_attendance(
        &self,
        ctx: &RequestContext,
        req: MarkAttendanceRequest,
    ) -> Result<AttendanceUpdateResponse, AppError> {
        let date = input::parse_date(&req.date)?;
        let notes = input::optional_text(req.notes.clone());

        if let Some(schedule_id) = &req.schedule_id {
            let course = self.require(ctx, &req.course_id).await?;
            let schedules = self.store.list_schedules_for_course(&course.id).await?;
            if !schedules.iter().any(|s| &s.id == schedule_id) {
                return Err(AppError::NotFound);
            }
        }

        for attempt in 1..=MAX_ATTEMPTS {
            let mut course = self.require(ctx, &req.course_id).await?;
            let existing = self.store.find_attendance_record(&course.id, date).await?;

            let next = Counters::new(course.total_lectures, course.attended_lectures)
                .mark(existing.as_ref().map(|r| r.attended), req.attended);
            course.total_lectures = next.total;
            course.attended_lectures = next.attended;
            course.updated_at = ctx.now;

            let record = match existing {
                Some(previous) => AttendanceRecord {
                    attended: req.attended,
                    notes: notes.clone().or(previous.notes),
                    schedule_id: req.schedule_id.clone().or(previous.schedule_id),
                    ..previous
                },
                None => AttendanceRecord {
                    id: Uuid::new_v4().to_string(),
                    course_id: course.id.clone(),
                    date,
                    attended: req.attended,
                    notes: notes.clone(),
                    schedule_id: req.schedule_id.clone(),
                },
            };

            if self.store.upsert_attendance_record(&course, &record).await? {
                return Ok(self.respond(&course));
            }
            warn!("course {} changed underneath mark for {} (attempt {})", course.id, date, attempt);
        }
        Err(concurrent_update("Course"))
    }

    pub async fn add_schedules(
        &self,
        ctx: &RequestContext,
        course_id: &str,
        reqs: Vec<NewScheduleRequest>,
    ) -> Result<AddSchedulesOutcome, AppError> {
        let course = self.require(ctx, course_id).await?;
        if reqs.is_empty() {
            return Err(AppError::BadRequest("No schedules given".to_string()));
        }

        let mut slots = Vec::with_capacity(reqs.len());
        for req in reqs {
            let start_time = input::parse_time(&req.start_time)?;
            let end_time = input::parse_time(&req.end_time)?;
            input::validate_time_range(start_time, end_time)?;
            slots.push(RecurringSlot {
                id: Uuid::new_v4().to_string(),
                course_id: course.id.clone(),
                weekday: req.weekday.parse()?,
                start_time,
                end_time,
                room: input::optional_text(req.room),
                professor: input::optional_text(req.professor),
            });
        }

        let mut outcome = AddSchedulesOutcome {
            created: Vec::new(),
            duplicates: 0,
        };
        for slot in slots {
            if self.store.insert_schedule(&slot).await? {
                outcome.created.push(ScheduleSummary::from(slot));
            } else {
                outcome.duplicates += 1;
            }
        }
        info!(
            "added {} schedule(s) to {} ({} duplicate)",
            outcome.created.len(),
            course.name,
            outcome.duplicates
        );
        Ok(outcome)
    }

    pub async fn delete_schedule(&self, ctx: &RequestContext, id: &str) -> Result<(), AppError> {
        if !self.store.delete_schedule(&ctx.user_id, id).await? {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}
