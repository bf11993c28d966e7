use axum::extract::{Json, State};
use serde::Deserialize;
use tracing::info;

use crate::auth::AuthenticatedUser;
use crate::error::AppResult;
use crate::routing::{load_routing, save_routing, RoutingMode, RoutingSetting};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateRoutingRequest {
    pub mode: RoutingMode,
}

pub async fn get_mode(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<RoutingSetting>> {
    Ok(Json(load_routing(state.store.as_ref(), &user.user_id).await?))
}

pub async fn set_mode(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<UpdateRoutingRequest>,
) -> AppResult<Json<RoutingSetting>> {
    let setting = RoutingSetting::new(
        &user.user_id,
        request.mode,
        Some(state.clock.now().to_rfc3339()),
    );
    save_routing(state.store.as_ref(), &setting).await?;
    info!(user_id = %user.user_id, mode = ?request.mode, "routing mode changed");
    Ok(Json(setting))
}
