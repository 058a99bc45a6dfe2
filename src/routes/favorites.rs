use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::json;

use crate::{
    dto::library_dto::{FavoriteToggleResponse, FavoritesResponse},
    error::Result,
    middleware::auth::CurrentUser,
    AppState,
};

#[axum::debug_handler]
pub async fn list_favorites(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse> {
    let ids = state.favorite_service.list_ids(&user.id).await?;
    let problems = state.problem_service.get_many_ordered(&ids).await?;
    Ok(Json(FavoritesResponse::new(problems)))
}

/// Reports the favorite state the database settled on.
#[axum::debug_handler]
pub async fn toggle_favorite(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(problem_id): Path<String>,
) -> Result<impl IntoResponse> {
    state.problem_service.get(&problem_id).await?;
    let is_favorite = state.favorite_service.toggle(&user.id, &problem_id).await?;
    Ok(Json(FavoriteToggleResponse {
        problem_id,
        is_favorite,
    }))
}

#[axum::debug_handler]
pub async fn remove_favorite(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(problem_id): Path<String>,
) -> Result<impl IntoResponse> {
    state.favorite_service.remove(&user.id, &problem_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn clear_favorites(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse> {
    let removed = state.favorite_service.clear(&user.id).await?;
    Ok(Json(json!({ "removed": removed })))
}
