use axum::{
    extract::State,
    response::{IntoResponse, Json},
    Extension,
};
use validator::Validate;

use crate::{
    dto::settings_dto::UpdateSettingsRequest, error::Result, middleware::auth::CurrentUser,
    models::settings::QuizSettings, AppState,
};

#[axum::debug_handler]
pub async fn get_settings(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.settings_service.get(&user.id).await?))
}

#[axum::debug_handler]
pub async fn update_settings(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<UpdateSettingsRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let current = state.settings_service.get(&user.id).await?;
    let saved = state
        .settings_service
        .save(&user.id, &payload.apply(current))
        .await?;
    Ok(Json(saved))
}

/// Forgets the stored settings and answers with the defaults.
#[axum::debug_handler]
pub async fn reset_settings(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse> {
    state.settings_service.reset(&user.id).await?;
    Ok(Json(QuizSettings::default()))
}
