use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::meetings::{
    ConflictQuery, ConflictReport, Meeting, MeetingStatus, NewMeeting, SuggestionQuery,
    Suggestions, MAX_DURATION_MINUTES,
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: MeetingStatus,
}

fn check_range(start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<()> {
    if end <= start {
        return Err(AppError::bad_request("endTime must be after startTime"));
    }
    Ok(())
}

pub async fn create_meeting(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<NewMeeting>,
) -> AppResult<(StatusCode, Json<Meeting>)> {
    if request.title.trim().is_empty() {
        return Err(AppError::bad_request("title must not be empty"));
    }
    check_range(request.start_time, request.end_time)?;
    let meeting = state.meetings.create(&user.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(meeting)))
}

pub async fn list_meetings(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> AppResult<Json<Vec<Meeting>>> {
    Ok(Json(state.meetings.list().await?))
}

pub async fn check_conflicts(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(query): Json<ConflictQuery>,
) -> AppResult<Json<ConflictReport>> {
    check_range(query.start_time, query.end_time)?;
    Ok(Json(state.meetings.check_conflicts(&query).await?))
}

pub async fn suggest_slots(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(query): Json<SuggestionQuery>,
) -> AppResult<Json<Suggestions>> {
    if query
        .duration_minutes
        .is_some_and(|minutes| minutes > MAX_DURATION_MINUTES)
    {
        return Err(AppError::bad_request(format!(
            "durationMinutes must not exceed {MAX_DURATION_MINUTES}"
        )));
    }
    Ok(Json(state.meetings.suggest(&query).await))
}

pub async fn update_status(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<String>,
    Json(request): Json<StatusRequest>,
) -> AppResult<Json<Meeting>> {
    let meeting = state
        .meetings
        .update_status(&id, request.status)
        .await?
        .ok_or_else(AppError::not_found)?;
    Ok(Json(meeting))
}
