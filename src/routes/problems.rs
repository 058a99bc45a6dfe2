use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
    Extension,
};

use crate::{
    config::get_config,
    dto::catalog_dto::{ProblemListQuery, UserMarks},
    error::Result,
    middleware::auth::CurrentUser,
    services::catalog_service::{paginate, visible},
    AppState,
};

/// Favorite flags and progress statuses for one user.
pub(crate) async fn load_marks(state: &AppState, user_id: &str) -> Result<UserMarks> {
    let statuses = state.progress_service.status_map(user_id).await?;
    let favorites = state
        .favorite_service
        .list_ids(user_id)
        .await?
        .into_iter()
        .collect();
    Ok(UserMarks { statuses, favorites })
}

#[axum::debug_handler]
pub async fn list_problems(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ProblemListQuery>,
) -> Result<impl IntoResponse> {
    let filter = query.filter()?;
    let sort = query.sort()?;

    let problems = state.problem_service.list_all().await?;
    let marks = load_marks(&state, &user.id).await?;

    let rows = visible(&problems, &filter, sort);
    let page = paginate(&rows, query.page.unwrap_or(1), get_config().catalog_page_size)
        .map(|p| marks.entry(p, None));
    Ok(Json(page))
}

#[axum::debug_handler]
pub async fn get_problem(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let problem = state.problem_service.get(&id).await?;
    Ok(Json(problem))
}
