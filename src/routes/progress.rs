use axum::{
    extract::State,
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::json;

use crate::{
    error::Result,
    middleware::auth::CurrentUser,
    services::progress_service::compute_stats,
    AppState,
};

#[axum::debug_handler]
pub async fn list_progress(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse> {
    let records = state.progress_service.list(&user.id).await?;
    Ok(Json(records))
}

#[axum::debug_handler]
pub async fn progress_stats(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse> {
    let problems = state.problem_service.list_all().await?;
    let records = state.progress_service.list(&user.id).await?;
    Ok(Json(compute_stats(&problems, &records)))
}

#[axum::debug_handler]
pub async fn clear_progress(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse> {
    let deleted = state.progress_service.clear(&user.id).await?;
    tracing::info!(user_id = %user.id, deleted, "Progress cleared");
    Ok(Json(json!({ "deleted": deleted })))
}
