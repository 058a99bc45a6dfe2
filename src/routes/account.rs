use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json},
    Extension,
};

use crate::{
    dto::library_dto::{ClearDataQuery, ClearDataResponse, ClearScope, DashboardResponse},
    error::Result,
    middleware::auth::CurrentUser,
    models::progress::ProgressStatus,
    services::grading_service::GradingService,
    AppState,
};

#[axum::debug_handler]
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse> {
    let total_problems = state.problem_service.count().await?;
    let favorites = state.favorite_service.count(&user.id).await?;
    let quiz_sets = state.quiz_set_service.count(&user.id).await?;
    let completed = state
        .progress_service
        .list(&user.id)
        .await?
        .iter()
        .filter(|r| r.status == ProgressStatus::Completed)
        .count();

    Ok(Json(DashboardResponse {
        total_problems,
        favorites,
        quiz_sets,
        completed,
        completion_percentage: GradingService::accuracy(completed, total_problems.max(0) as usize),
    }))
}

/// Deletes the caller's persisted data for the requested scope.
#[axum::debug_handler]
pub async fn clear_data(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ClearDataQuery>,
) -> Result<impl IntoResponse> {
    let mut cleared = ClearDataResponse::default();
    if query.scope.includes(ClearScope::Progress) {
        cleared.progress = state.progress_service.clear(&user.id).await?;
    }
    if query.scope.includes(ClearScope::Favorites) {
        cleared.favorites = state.favorite_service.clear(&user.id).await?;
    }
    if query.scope.includes(ClearScope::QuizSets) {
        cleared.quiz_sets = state.quiz_set_service.clear(&user.id).await?;
    }
    if query.scope.includes(ClearScope::Settings) {
        cleared.settings = state.settings_service.reset(&user.id).await?;
    }

    tracing::info!(
        user_id = %user.id,
        progress = cleared.progress,
        favorites = cleared.favorites,
        quiz_sets = cleared.quiz_sets,
        settings = cleared.settings,
        "User data cleared"
    );
    Ok(Json(cleared))
}
