use axum::extract::{Json, Path, State};
use serde::Deserialize;
use tracing::info;

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::notifications::{ChannelToggles, NotificationChannel, RecipientOverride, UserPreferences};
use crate::state::AppState;
use crate::store::{get_as, Collection};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePreferencesRequest {
    #[serde(default)]
    pub channels: Option<ChannelToggles>,
    #[serde(default)]
    pub push_permission: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOverrideRequest {
    pub channels: Vec<NotificationChannel>,
}

pub async fn get_preferences(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(recipient_id): Path<String>,
) -> AppResult<Json<UserPreferences>> {
    let stored: Option<UserPreferences> =
        get_as(state.store.as_ref(), Collection::UserPreferences, &recipient_id).await?;
    Ok(Json(
        stored.unwrap_or_else(|| UserPreferences::defaults_for(&recipient_id)),
    ))
}

pub async fn update_preferences(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(recipient_id): Path<String>,
    Json(request): Json<UpdatePreferencesRequest>,
) -> AppResult<Json<UserPreferences>> {
    let stored: Option<UserPreferences> =
        get_as(state.store.as_ref(), Collection::UserPreferences, &recipient_id).await?;
    let mut preferences = stored.unwrap_or_else(|| UserPreferences::defaults_for(&recipient_id));
    if let Some(channels) = request.channels {
        preferences.channels = channels;
    }
    if let Some(push_permission) = request.push_permission {
        preferences.push_permission = push_permission;
    }

    state
        .store
        .put(
            Collection::UserPreferences,
            &recipient_id,
            serde_json::to_value(&preferences).map_err(AppError::internal)?,
        )
        .await?;
    info!(recipient_id = %recipient_id, push_permission = preferences.push_permission, "preferences updated");
    Ok(Json(preferences))
}

pub async fn get_emergency_settings(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(recipient_id): Path<String>,
) -> AppResult<Json<RecipientOverride>> {
    let stored: Option<RecipientOverride> = get_as(
        state.store.as_ref(),
        Collection::EmergencyRecipientSettings,
        &recipient_id,
    )
    .await?;
    Ok(Json(stored.unwrap_or(RecipientOverride {
        recipient_id,
        channels: Vec::new(),
    })))
}

pub async fn update_emergency_settings(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(recipient_id): Path<String>,
    Json(request): Json<UpdateOverrideRequest>,
) -> AppResult<Json<RecipientOverride>> {
    let mut channels = request.channels;
    channels.sort();
    channels.dedup();
    let settings = RecipientOverride {
        recipient_id,
        channels,
    };

    state
        .store
        .put(
            Collection::EmergencyRecipientSettings,
            &settings.recipient_id,
            serde_json::to_value(&settings).map_err(AppError::internal)?,
        )
        .await?;
    Ok(Json(settings))
}
