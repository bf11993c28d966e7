use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use serde::Deserialize;

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::records::{ApprovalDecision, ApprovalRecord, Decision};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub decision: Decision,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub signed: bool,
}

pub async fn list_approvals(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> AppResult<Json<Vec<ApprovalRecord>>> {
    Ok(Json(state.tracking.approvals().await?))
}

pub async fn decide(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    Json(request): Json<DecisionRequest>,
) -> AppResult<(StatusCode, Json<ApprovalDecision>)> {
    let comment = request
        .comment
        .map(|comment| comment.trim().to_string())
        .filter(|comment| !comment.is_empty());

    let decision = ApprovalDecision {
        id: format!("approval-{id}"),
        document_id: id,
        decision: request.decision,
        approver: user.name,
        approver_role: user.role,
        comment,
        signed: request.signed,
        decided_at: state.clock.now().to_rfc3339(),
    };
    if !state.tracking.finalize_approval(&decision).await? {
        return Err(AppError::not_found());
    }

    Ok((StatusCode::CREATED, Json(decision)))
}

pub async fn get_decision(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApprovalDecision>> {
    let decision = state
        .tracking
        .decision(&id)
        .await?
        .ok_or_else(AppError::not_found)?;
    Ok(Json(decision))
}
