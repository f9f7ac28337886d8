/**
 * Settings Routes
 * Site-wide settings singleton
 */
use axum::{extract::State, Json};
use serde::Serialize;

use crate::{
    db::models::Settings,
    error::{AppError, AppJson},
    services::settings::{self, SettingsInput},
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct SettingsUpdateResponse {
    pub message: String,
    pub settings: Settings,
}

/// GET /api/settings
pub async fn get_settings(State(state): State<AppState>) -> Result<Json<Settings>, AppError> {
    Ok(Json(settings::get_or_create(&state.store).await?))
}

/// PUT /api/settings (admin only)
pub async fn update_settings(
    State(state): State<AppState>,
    AppJson(input): AppJson<SettingsInput>,
) -> Result<Json<SettingsUpdateResponse>, AppError> {
    let settings = settings::update(&state.store, input).await?;
    Ok(Json(SettingsUpdateResponse {
        message: "Settings updated successfully".to_string(),
        settings,
    }))
}
