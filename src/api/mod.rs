use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Path, Query};
use axum::routing::{delete, patch, post};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use serde::{Deserialize, Serialize};

use crate::context::RequestContext;
use crate::domain::{ConflictOutcome, LectureSuggestion, input};
use crate::error::AppError;
use crate::models::*;
use crate::services::*;
use crate::state::AppState;

/// JSON body whose rejections use the API error shape.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(AppError))]
struct JsonBody<T>(T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

#[derive(Deserialize)]
struct WeekQueryParams {
    week_start: Option<String>,
}

#[derive(Deserialize)]
struct DayQueryParams {
    date: Option<String>,
}

#[derive(Deserialize)]
struct SuggestionQueryParams {
    days: Option<u32>,
}

#[derive(Serialize)]
struct SuggestionsResponse {
    suggestions: Vec<LectureSuggestion>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/dashboard", get(dashboard))
        .route("/courses", get(list_courses).post(create_course))
        .route("/courses/{id}", get(course_detail).patch(update_course).delete(delete_course))
        .route("/courses/{id}/schedules", post(add_schedules))
        .route("/schedules/{id}", delete(delete_schedule))
        .route("/attendance/update", post(update_attendance))
        .route("/attendance/mark", post(mark_attendance))
        .route("/timetable", get(week_view))
        .route("/timetable/day", get(day_view))
        .route("/timetable/slots", post(book_slot))
        .route("/timetable/slots/check", post(check_slot))
        .route("/timetable/slots/{id}", patch(update_slot).delete(delete_slot))
        .route("/suggestions", get(suggestions))
        .with_state(state)
}

fn courses(state: &AppState) -> CourseService {
    CourseService::new(state.store.clone(), state.config.threshold)
}

fn timetable(state: &AppState) -> TimetableService {
    TimetableService::new(state.store.clone())
}

fn planner(state: &AppState) -> PlannerService {
    PlannerService::new(
        state.store.clone(),
        state.config.threshold,
        state.config.suggestion_horizon_days,
    )
}

fn optional_date(raw: Option<String>) -> Result<Option<chrono::NaiveDate>, AppError> {
    Ok(raw
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(input::parse_date)
        .transpose()?)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.store.ping().await?;
    Ok(StatusCode::OK)
}

async fn dashboard(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<Dashboard>, AppError> {
    Ok(Json(planner(&state).dashboard(&ctx).await?))
}

async fn list_courses(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<Vec<CourseSummary>>, AppError> {
    Ok(Json(courses(&state).list(&ctx).await?))
}

async fn create_course(
    State(state): State<AppState>,
    ctx: RequestContext,
    JsonBody(req): JsonBody<NewCourseRequest>,
) -> Result<(StatusCode, Json<CourseSummary>), AppError> {
    let course = courses(&state).create(&ctx, req).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

async fn course_detail(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Json<CourseDetail>, AppError> {
    Ok(Json(courses(&state).detail(&ctx, &id).await?))
}

async fn update_course(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateCourseRequest>,
) -> Result<Json<CourseUpdate>, AppError> {
    Ok(Json(courses(&state).update(&ctx, &id, req).await?))
}

async fn delete_course(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    courses(&state).delete(&ctx, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_schedules(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<NewSchedulesRequest>,
) -> Result<(StatusCode, Json<AddSchedulesOutcome>), AppError> {
    let outcome = courses(&state).add_schedules(&ctx, &id, req.into_vec()).await?;
    if outcome.created.is_empty() {
        return Err(AppError::Conflict(
            "Schedule already exists for this time slot".to_string(),
        ));
    }
    Ok((StatusCode::CREATED, Json(outcome)))
}

async fn delete_schedule(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    courses(&state).delete_schedule(&ctx, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update_attendance(
    State(state): State<AppState>,
    ctx: RequestContext,
    JsonBody(req): JsonBody<UpdateAttendanceRequest>,
) -> Result<Json<AttendanceUpdateResponse>, AppError> {
    Ok(Json(courses(&state).update_attendance(&ctx, req).await?))
}

async fn mark_attendance(
    State(state): State<AppState>,
    ctx: RequestContext,
    JsonBody(req): JsonBody<MarkAttendanceRequest>,
) -> Result<Json<AttendanceUpdateResponse>, AppError> {
    Ok(Json(courses(&state).mark_attendance(&ctx, req).await?))
}

async fn week_view(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(params): Query<WeekQueryParams>,
) -> Result<Json<WeekView>, AppError> {
    let requested = optional_date(params.week_start)?;
    Ok(Json(timetable(&state).week(&ctx, requested).await?))
}

async fn day_view(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(params): Query<DayQueryParams>,
) -> Result<Json<DayView>, AppError> {
    let requested = optional_date(params.date)?;
    Ok(Json(timetable(&state).day(&ctx, requested).await?))
}

async fn book_slot(
    State(state): State<AppState>,
    ctx: RequestContext,
    JsonBody(req): JsonBody<NewSlotRequest>,
) -> Result<(StatusCode, Json<ManualSlot>), AppError> {
    let slot = timetable(&state).book(&ctx, req).await?;
    Ok((StatusCode::CREATED, Json(slot)))
}

async fn check_slot(
    State(state): State<AppState>,
    ctx: RequestContext,
    JsonBody(req): JsonBody<NewSlotRequest>,
) -> Result<Json<ConflictOutcome>, AppError> {
    Ok(Json(timetable(&state).check(&ctx, req).await?))
}

async fn update_slot(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateSlotRequest>,
) -> Result<Json<ManualSlot>, AppError> {
    Ok(Json(timetable(&state).update_slot(&ctx, &id, req).await?))
}

async fn delete_slot(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    timetable(&state).delete_slot(&ctx, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn suggestions(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(params): Query<SuggestionQueryParams>,
) -> Result<Json<SuggestionsResponse>, AppError> {
    let suggestions = planner(&state).suggestions(&ctx, params.days).await?;
    Ok(Json(SuggestionsResponse { suggestions }))
}
