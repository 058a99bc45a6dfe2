use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;

use crate::{
    dto::library_dto::{QuizSetDetailResponse, QuizSetResponse},
    error::Result,
    middleware::auth::CurrentUser,
    AppState,
};

#[axum::debug_handler]
pub async fn list_quiz_sets(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse> {
    let sets = state.quiz_set_service.list(&user.id).await?;
    let items: Vec<QuizSetResponse> = sets.into_iter().map(QuizSetResponse::from).collect();
    Ok(Json(items))
}

#[axum::debug_handler]
pub async fn get_quiz_set(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let set = state.quiz_set_service.get(&user.id, id).await?;
    let problems = state
        .problem_service
        .get_many_ordered(&set.problem_ids)
        .await?;
    Ok(Json(QuizSetDetailResponse {
        set: QuizSetResponse::from(set),
        problems,
    }))
}

#[axum::debug_handler]
pub async fn delete_quiz_set(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.quiz_set_service.delete(&user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
