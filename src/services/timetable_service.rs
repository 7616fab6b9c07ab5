use std::sync::Arc;

use chrono::{Days, NaiveDate, NaiveTime};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::context::RequestContext;
use crate::db::Store;
use crate::domain::timetable::{self, ConflictOutcome, SlotCandidate, TimetableEntry, WeeklyView};
use crate::domain::{ValidationError, input, refresh};
use crate::error::AppError;
use crate::models::*;
use crate::services::{MAX_ATTEMPTS, concurrent_update, load_schedule};

#[derive(Debug, Serialize)]
pub struct WeekView {
    pub refreshed: bool,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub days: WeeklyView,
}

#[derive(Debug, Serialize)]
pub struct DayView {
    pub refreshed: bool,
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub entries: Vec<TimetableEntry>,
}

/// Parsed booking fields.
struct SlotDraft {
    title: String,
    category: SlotCategory,
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    notes: Option<String>,
}

impl SlotDraft {
    fn parse(req: NewSlotRequest) -> Result<Self, ValidationError> {
        let draft = Self {
            title: input::non_empty(&req.title, "Title")?,
            category: req.category.parse()?,
            date: input::parse_date(&req.date)?,
            start_time: input::parse_time(&req.start_time)?,
            end_time: input::parse_time(&req.end_time)?,
            notes: input::optional_text(req.notes),
        };
        input::validate_time_range(draft.start_time, draft.end_time)?;
        Ok(draft)
    }

    /// Applies a partial edit on top of a stored slot.
    fn merge(slot: &ManualSlot, req: UpdateSlotRequest) -> Result<Self, ValidationError> {
        let draft = Self {
            title: match req.title {
                Some(title) => input::non_empty(&title, "Title")?,
                None => slot.title.clone(),
            },
            category: match req.category {
                Some(category) => category.parse()?,
                None => slot.category,
            },
            date: match req.date {
                Some(date) => input::parse_date(&date)?,
                None => slot.date,
            },
            start_time: match req.start_time {
                Some(start) => input::parse_time(&start)?,
                None => slot.start_time,
            },
            end_time: match req.end_time {
                Some(end) => input::parse_time(&end)?,
                None => slot.end_time,
            },
            notes: match req.notes {
                Some(notes) => input::optional_text(Some(notes)),
                None => slot.notes.clone(),
            },
        };
        input::validate_time_range(draft.start_time, draft.end_time)?;
        Ok(draft)
    }
}

pub struct TimetableService {
    store: Arc<dyn Store>,
}

impl TimetableService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Loads the caller's timetable, pruning last week's manual slots first
    /// when a new week has started. The flag is true only for the request
    /// that performed the refresh.
    pub async fn ensure_fresh(&self, ctx: &RequestContext) -> Result<(Timetable, bool), AppError> {
        for attempt in 1..=MAX_ATTEMPTS {
            let mut timetable = self
                .store
                .load_or_create_timetable(&ctx.user_id, ctx.now)
                .await?;
            let Some(plan) = refresh::plan_refresh(&timetable, ctx.now) else {
                return Ok((timetable, false));
            };

            match self
                .store
                .purge_manual_slots(&timetable, plan.purge_before, plan.refreshed_at)
                .await?
            {
                Some(purged) => {
                    info!(
                        "refreshed timetable for {}: removed {} slot(s) before {}",
                        ctx.user_id, purged, plan.purge_before
                    );
                    timetable.last_refreshed = plan.refreshed_at;
                    timetable.version += 1;
                    return Ok((timetable, true));
                }
                None => warn!("timetable {} changed during refresh (attempt {})", timetable.id, attempt),
            }
        }
        Err(concurrent_update("Timetable"))
    }

    pub async fn week(&self, ctx: &RequestContext, requested: Option<NaiveDate>) -> Result<WeekView, AppError> {
        let (timetable, refreshed) = self.ensure_fresh(ctx).await?;
        let week_start = refresh::week_start(requested.unwrap_or(ctx.now.date()));
        let week_end = week_start + Days::new(6);

        let (courses, index) = load_schedule(self.store.as_ref(), &ctx.user_id).await?;
        let manual = self
            .store
            .list_manual_slots(&timetable.id, week_start, week_end)
            .await?;

        Ok(WeekView {
            refreshed,
            week_start,
            week_end,
            days: timetable::weekly_view(&courses, &index, &manual, week_start),
        })
    }

    pub async fn day(&self, ctx: &RequestContext, requested: Option<NaiveDate>) -> Result<DayView, AppError> {
        let (timetable, refreshed) = self.ensure_fresh(ctx).await?;
        let date = requested.unwrap_or(ctx.now.date());

        let (courses, index) = load_schedule(self.store.as_ref(), &ctx.user_id).await?;
        let manual = self.store.list_manual_slots(&timetable.id, date, date).await?;

        Ok(DayView {
            refreshed,
            date,
            weekday: Weekday::of(date),
            entries: timetable::day_view(&courses, &index, &manual, date),
        })
    }

    async fn conflicts(
        &self,
        ctx: &RequestContext,
        timetable: &Timetable,
        candidate: &SlotCandidate<'_>,
    ) -> Result<ConflictOutcome, AppError> {
        let (courses, index) = load_schedule(self.store.as_ref(), &ctx.user_id).await?;
        let same_day = self
            .store
            .list_manual_slots(&timetable.id, candidate.date, candidate.date)
            .await?;
        Ok(timetable::detect_conflict(candidate, &same_day, &courses, &index)?)
    }

    /// Dry run of a booking.
    pub async fn check(&self, ctx: &RequestContext, req: NewSlotRequest) -> Result<ConflictOutcome, AppError> {
        let draft = SlotDraft::parse(req)?;
        let timetable = self
            .store
            .load_or_create_timetable(&ctx.user_id, ctx.now)
            .await?;
        let candidate = SlotCandidate {
            id: None,
            date: draft.date,
            start_time: draft.start_time,
            end_time: draft.end_time,
        };
        self.conflicts(ctx, &timetable, &candidate).await
    }

    /// Conflict-checks and writes a slot under the timetable version guard.
    async fn place(
        &self,
        ctx: &RequestContext,
        draft: SlotDraft,
        id: String,
        created_at: chrono::NaiveDateTime,
        editing: bool,
    ) -> Result<ManualSlot, AppError> {
        for attempt in 1..=MAX_ATTEMPTS {
            let timetable = self
                .store
                .load_or_create_timetable(&ctx.user_id, ctx.now)
                .await?;
            let candidate = SlotCandidate {
                id: editing.then_some(id.as_str()),
                date: draft.date,
                start_time: draft.start_time,
                end_time: draft.end_time,
            };

            let outcome = self.conflicts(ctx, &timetable, &candidate).await?;
            if outcome.has_conflict {
                let reason = outcome.reason.unwrap_or_default();
                debug!("rejected slot for {}: {}", ctx.user_id, reason);
                return Err(AppError::Conflict(format!("Time slot conflict: {reason}")));
            }

            let slot = ManualSlot {
                id: id.clone(),
                timetable_id: timetable.id.clone(),
                date: draft.date,
                start_time: draft.start_time,
                end_time: draft.end_time,
                title: draft.title.clone(),
                category: draft.category,
                notes: draft.notes.clone(),
                created_at,
            };
            if self.store.save_manual_slot(&timetable, &slot).await? {
                info!("saved slot \"{}\" on {} for {}", slot.title, slot.date, ctx.user_id);
                return Ok(slot);
            }
            warn!("timetable {} changed during booking (attempt {})", timetable.id, attempt);
        }
        Err(concurrent_update("Timetable"))
    }

    pub async fn book(&self, ctx: &RequestContext, req: NewSlotRequest) -> Result<ManualSlot, AppError> {
        let draft = SlotDraft::parse(req)?;
        self.place(ctx, draft, Uuid::new_v4().to_string(), ctx.now, false)
            .await
    }

    pub async fn update_slot(
        &self,
        ctx: &RequestContext,
        id: &str,
        req: UpdateSlotRequest,
    ) -> Result<ManualSlot, AppError> {
        let existing = self
            .store
            .load_manual_slot(&ctx.user_id, id)
            .await?
            .ok_or(AppError::NotFound)?;
        let draft = SlotDraft::merge(&existing, req)?;
        self.place(ctx, draft, existing.id, existing.created_at, true)
            .await
    }

    pub async fn delete_slot(&self, ctx: &RequestContext, id: &str) -> Result<(), AppError> {
        if !self.store.delete_manual_slot(&ctx.user_id, id).await? {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}
