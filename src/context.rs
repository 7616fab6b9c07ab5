use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{Local, NaiveDateTime};

use crate::error::AppError;

/// Header carrying the id of the already-authenticated caller.
pub const USER_HEADER: &str = "x-user-id";

/// Who is asking and the single "now" every computation in the request uses.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user_id: String,
    pub now: NaiveDateTime,
}

impl RequestContext {
    pub fn new(user_id: impl Into<String>, now: NaiveDateTime) -> Self {
        Self {
            user_id: user_id.into(),
            now,
        }
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(AppError::Unauthorized)?;

        Ok(Self::new(user_id, Local::now().naive_local()))
    }
}
