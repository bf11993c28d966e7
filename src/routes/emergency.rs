use std::time::Duration;

use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::notifications::{
    DispatchPolicy, EmergencySubmission, NotificationLogEntry, ScheduleRecord, Urgency,
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyRequest {
    pub document_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub urgency: Urgency,
    pub recipients: Vec<String>,
    #[serde(default)]
    pub policy: DispatchPolicy,
    /// Overrides the urgency's default interval.
    #[serde(default)]
    pub interval_seconds: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyResponse {
    pub submission: EmergencySubmission,
    pub schedules: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogQuery {
    pub document_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub cancelled: usize,
}

pub async fn submit_emergency(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<EmergencyRequest>,
) -> AppResult<(StatusCode, Json<EmergencyResponse>)> {
    if request.title.trim().is_empty() {
        return Err(AppError::bad_request("title must not be empty"));
    }
    if request.recipients.is_empty() {
        return Err(AppError::bad_request("at least one recipient is required"));
    }
    if request.interval_seconds == Some(0) {
        return Err(AppError::bad_request("intervalSeconds must be positive"));
    }

    let interval = request
        .interval_seconds
        .map(Duration::from_secs)
        .unwrap_or_else(|| request.urgency.default_interval());

    let submission = EmergencySubmission {
        id: format!("EMG-{}", Uuid::new_v4()),
        document_id: request.document_id,
        title: request.title.trim().to_string(),
        description: request.description,
        urgency: request.urgency,
        recipients: request.recipients,
        policy: request.policy,
        interval_seconds: interval.as_secs(),
        submitted_by: user.name,
        submitted_at: state.clock.now().to_rfc3339(),
    };
    let schedules = state.scheduler.dispatch(&submission).await?;

    Ok((
        StatusCode::CREATED,
        Json(EmergencyResponse {
            submission,
            schedules: schedules.len(),
        }),
    ))
}

pub async fn list_submissions(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> AppResult<Json<Vec<EmergencySubmission>>> {
    Ok(Json(state.scheduler.submissions().await?))
}

pub async fn list_logs(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<LogQuery>,
) -> AppResult<Json<Vec<NotificationLogEntry>>> {
    Ok(Json(
        state.scheduler.logs(query.document_id.as_deref()).await?,
    ))
}

pub async fn list_schedules(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(document_id): Path<String>,
) -> AppResult<Json<Vec<ScheduleRecord>>> {
    Ok(Json(state.scheduler.schedule_records(&document_id).await?))
}

pub async fn cancel_notifications(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(document_id): Path<String>,
) -> AppResult<Json<CancelResponse>> {
    let cancelled = state.scheduler.cancel_document(&document_id).await?;
    Ok(Json(CancelResponse { cancelled }))
}
