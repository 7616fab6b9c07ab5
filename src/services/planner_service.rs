use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::context::RequestContext;
use crate::db::Store;
use crate::domain::suggestions::{self, CourseSuggestion, LectureSuggestion};
use crate::domain::timetable::{self, TimetableEntry};
use crate::domain::{Threshold, calculator};
use crate::error::AppError;
use crate::services::course_service::CourseSummary;
use crate::services::{TimetableService, load_schedule};

const DASHBOARD_HORIZON_DAYS: u32 = 3;
const DASHBOARD_UPCOMING_LIMIT: usize = 5;
const MAX_HORIZON_DAYS: u32 = 90;

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub refreshed: bool,
    pub total_courses: usize,
    pub courses_below_threshold: usize,
    pub courses: Vec<CourseSummary>,
    pub suggestions: Vec<CourseSuggestion>,
    pub upcoming_lectures: Vec<LectureSuggestion>,
    pub today_schedule: Vec<TimetableEntry>,
}

pub struct PlannerService {
    store: Arc<dyn Store>,
    threshold: Threshold,
    default_horizon_days: u32,
}

impl PlannerService {
    pub fn new(store: Arc<dyn Store>, threshold: Threshold, default_horizon_days: u32) -> Self {
        Self {
            store,
            threshold,
            default_horizon_days,
        }
    }

    /// Time-aware suggestions for every upcoming lecture of a regular course.
    pub async fn suggestions(
        &self,
        ctx: &RequestContext,
        days: Option<u32>,
    ) -> Result<Vec<LectureSuggestion>, AppError> {
        let horizon = days.unwrap_or(self.default_horizon_days).min(MAX_HORIZON_DAYS);
        let (courses, index) = load_schedule(self.store.as_ref(), &ctx.user_id).await?;
        let out = suggestions::upcoming_suggestions(&courses, &index, ctx.now.date(), horizon, self.threshold);
        debug!("{} lecture suggestion(s) over {} day(s) for {}", out.len(), horizon, ctx.user_id);
        Ok(out)
    }

    pub async fn dashboard(&self, ctx: &RequestContext) -> Result<Dashboard, AppError> {
        let (timetable, refreshed) = TimetableService::new(self.store.clone())
            .ensure_fresh(ctx)
            .await?;
        let (courses, index) = load_schedule(self.store.as_ref(), &ctx.user_id).await?;
        let today = ctx.now.date();
        let manual_today = self
            .store
            .list_manual_slots(&timetable.id, today, today)
            .await?;

        let courses_below_threshold = courses
            .iter()
            .filter(|c| c.is_regular)
            .filter(|c| calculator::is_below_threshold(c.total_lectures, c.attended_lectures, self.threshold))
            .count();

        let mut upcoming_lectures = suggestions::upcoming_suggestions(
            &courses,
            &index,
            today,
            DASHBOARD_HORIZON_DAYS,
            self.threshold,
        );
        upcoming_lectures.truncate(DASHBOARD_UPCOMING_LIMIT);

        Ok(Dashboard {
            refreshed,
            total_courses: courses.len(),
            courses_below_threshold,
            suggestions: suggestions::course_suggestions(&courses, &index, ctx.now, self.threshold),
            upcoming_lectures,
            today_schedule: timetable::day_view(&courses, &index, &manual_today, today),
            courses: courses
                .into_iter()
                .map(|c| CourseSummary::new(c, self.threshold))
                .collect(),
        })
    }
}
