use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    Extension,
};
use std::sync::Arc;
use validator::Validate;

use crate::{
    config::get_config,
    dto::catalog_dto::{
        require_selection, BulkFavoriteResponse, CatalogViewResponse, ExportFormat, ExportQuery,
        GoToPageRequest, SelectionQuizSetRequest, SelectionToggleResponse, UpdateFilterRequest,
        UpdateSortRequest,
    },
    dto::library_dto::QuizSetResponse,
    error::{Error, Result},
    middleware::auth::CurrentUser,
    routes::problems::load_marks,
    services::catalog_service::CatalogView,
    services::export_service::{ExportService, JSON_EXPORT_FILENAME, XLSX_EXPORT_FILENAME},
    utils::time::now,
    AppState,
};

/// Loads the collection once per user. A failed load stores nothing, so the
/// next request retries.
async fn ensure_loaded(state: &AppState, user_id: &str) -> Result<()> {
    if state.catalogs.contains(user_id) {
        return Ok(());
    }
    let problems = state.problem_service.list_all().await.map_err(|e| {
        tracing::error!(error = ?e, user_id, "Failed to load problem catalog");
        e
    })?;
    tracing::debug!(user_id, problems = problems.len(), "Catalog view created");
    state.catalogs.insert_if_absent(
        user_id,
        CatalogView::new(Arc::new(problems), get_config().catalog_page_size, now()),
    );
    Ok(())
}

async fn render(state: &AppState, user_id: &str) -> Result<Json<CatalogViewResponse>> {
    let marks = load_marks(state, user_id).await?;
    let body = state
        .catalogs
        .with_view(user_id, now(), |view| CatalogViewResponse::render(view, &marks))?;
    Ok(Json(body))
}

#[axum::debug_handler]
pub async fn get_catalog(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse> {
    ensure_loaded(&state, &user.id).await?;
    render(&state, &user.id).await
}

#[axum::debug_handler]
pub async fn reload_catalog(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse> {
    let problems = Arc::new(state.problem_service.list_all().await?);
    let replaced = state.catalogs.with_view(&user.id, now(), |view| {
        view.replace_collection(Arc::clone(&problems))
    });
    match replaced {
        Ok(()) => {}
        Err(Error::NotFound(_)) => state.catalogs.insert_if_absent(
            &user.id,
            CatalogView::new(problems, get_config().catalog_page_size, now()),
        ),
        Err(e) => return Err(e),
    }
    render(&state, &user.id).await
}

#[axum::debug_handler]
pub async fn update_filter(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<UpdateFilterRequest>,
) -> Result<impl IntoResponse> {
    let filter = payload.filter()?;
    ensure_loaded(&state, &user.id).await?;
    state
        .catalogs
        .with_view(&user.id, now(), |view| view.set_filter(filter))?;
    render(&state, &user.id).await
}

#[axum::debug_handler]
pub async fn update_sort(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<UpdateSortRequest>,
) -> Result<impl IntoResponse> {
    ensure_loaded(&state, &user.id).await?;
    state
        .catalogs
        .with_view(&user.id, now(), |view| view.set_sort(payload.sort))?;
    render(&state, &user.id).await
}

#[axum::debug_handler]
pub async fn go_to_page(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<GoToPageRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    ensure_loaded(&state, &user.id).await?;
    state
        .catalogs
        .with_view(&user.id, now(), |view| view.go_to_page(payload.page))?;
    render(&state, &user.id).await
}

#[axum::debug_handler]
pub async fn toggle_selection(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(problem_id): Path<String>,
) -> Result<impl IntoResponse> {
    ensure_loaded(&state, &user.id).await?;
    let (selected, selection) = state.catalogs.with_view(&user.id, now(), |view| {
        view.toggle_selection(&problem_id)
            .map(|selected| (selected, view.selection().to_vec()))
    })??;
    Ok(Json(SelectionToggleResponse {
        problem_id,
        selected,
        selection,
    }))
}

#[axum::debug_handler]
pub async fn clear_selection(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse> {
    ensure_loaded(&state, &user.id).await?;
    state
        .catalogs
        .with_view(&user.id, now(), |view| view.clear_selection())?;
    Ok(StatusCode::NO_CONTENT)
}

/// Marks every selected problem as favorite. The selection survives a
/// failed write.
#[axum::debug_handler]
pub async fn favorite_selection(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse> {
    ensure_loaded(&state, &user.id).await?;
    let ids = state
        .catalogs
        .with_view(&user.id, now(), |view| view.selection().to_vec())?;
    require_selection(&ids)?;

    let added = state.favorite_service.mark_many(&user.id, &ids).await?;
    state
        .catalogs
        .with_view(&user.id, now(), |view| view.clear_selection())?;

    tracing::info!(user_id = %user.id, selected = ids.len(), added, "Selection marked as favorite");
    Ok(Json(BulkFavoriteResponse {
        added,
        already_favorite: (ids.len() as u64).saturating_sub(added),
    }))
}

#[axum::debug_handler]
pub async fn quiz_set_from_selection(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<SelectionQuizSetRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    ensure_loaded(&state, &user.id).await?;
    let ids = state
        .catalogs
        .with_view(&user.id, now(), |view| view.selection().to_vec())?;

    let set = state
        .quiz_set_service
        .create(&user.id, &payload.name, &ids)
        .await?;
    state
        .catalogs
        .with_view(&user.id, now(), |view| view.clear_selection())?;

    Ok((StatusCode::CREATED, Json(QuizSetResponse::from(set))))
}

#[axum::debug_handler]
pub async fn export_selection(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse> {
    ensure_loaded(&state, &user.id).await?;
    let problems = state
        .catalogs
        .with_view(&user.id, now(), |view| view.selected_problems())?;
    let ids: Vec<String> = problems.iter().map(|p| p.id.clone()).collect();
    require_selection(&ids)?;

    let (buffer, content_type, filename) = match query.format {
        ExportFormat::Json => (
            ExportService::problems_json(&problems)?,
            "application/json",
            JSON_EXPORT_FILENAME,
        ),
        ExportFormat::Xlsx => (
            ExportService::problems_xlsx(&problems)?,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            XLSX_EXPORT_FILENAME,
        ),
    };
    state
        .catalogs
        .with_view(&user.id, now(), |view| view.clear_selection())?;

    let disposition = format!("attachment; filename=\"{}\"", filename);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        buffer,
    ))
}
