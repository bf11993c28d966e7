use axum::extract::{Json, Query, State};
use serde::Deserialize;

use crate::auth::AuthenticatedUser;
use crate::error::AppResult;
use crate::records::ChannelRecord;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChannelQuery {
    pub member: Option<String>,
}

pub async fn list_channels(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<ChannelQuery>,
) -> AppResult<Json<Vec<ChannelRecord>>> {
    let member = query
        .member
        .as_deref()
        .map(str::trim)
        .filter(|member| !member.is_empty());
    Ok(Json(state.tracking.channels(member).await?))
}
