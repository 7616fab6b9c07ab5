pub mod course_service;
pub mod planner_service;
pub mod timetable_service;

pub use course_service::{
    AddSchedulesOutcome, CourseDetail, CourseService, CourseSummary, CourseUpdate, ScheduleSummary,
};
pub use planner_service::{Dashboard, PlannerService};
pub use timetable_service::{DayView, TimetableService, WeekView};

use crate::db::Store;
use crate::domain::ScheduleIndex;
use crate::error::AppError;
use crate::models::Course;

/// Attempts at a version-guarded write before the request is reported as conflicting.
const MAX_ATTEMPTS: usize = 3;

/// Courses of one owner together with all their recurring slots.
async fn load_schedule(store: &dyn Store, owner_id: &str) -> Result<(Vec<Course>, ScheduleIndex), AppError> {
    let courses = store.list_courses(owner_id).await?;
    let slots = store.list_schedules_for_owner(owner_id).await?;
    Ok((courses, ScheduleIndex::new(slots)))
}

fn concurrent_update(what: &str) -> AppError {
    AppError::Conflict(format!("{what} was modified concurrently, please retry"))
}
