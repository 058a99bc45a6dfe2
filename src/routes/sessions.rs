use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::session_dto::{
        CheckResponse, SelectOptionRequest, SessionView, SourceListResponse, StartSessionRequest,
    },
    error::Result,
    middleware::auth::CurrentUser,
    services::session_config::{
        build_session_config, SessionSource, SourceSummary, ALL_PROBLEMS_NAME, FAVORITES_NAME,
    },
    services::session_service::QuizSession,
    utils::time::now,
    AppState,
};

#[axum::debug_handler]
pub async fn list_sources(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse> {
    let total = state.problem_service.count().await?;
    let favorites = state.favorite_service.count(&user.id).await?;
    let sets = state.quiz_set_service.list(&user.id).await?;
    let settings = state.settings_service.get(&user.id).await?;

    let mut sources = vec![
        SourceSummary {
            source: SessionSource::All,
            name: ALL_PROBLEMS_NAME.to_string(),
            size: total as usize,
        },
        SourceSummary {
            source: SessionSource::Favorites,
            name: FAVORITES_NAME.to_string(),
            size: favorites as usize,
        },
    ];
    sources.extend(sets.into_iter().map(|set| SourceSummary {
        source: SessionSource::QuizSet { id: set.id },
        size: set.problem_ids.len(),
        name: set.name,
    }));

    Ok(Json(SourceListResponse { sources, settings }))
}

/// Resolves the source, shuffles it into a session config and starts the
/// session with it. Omitted options come from the user's quiz settings.
#[axum::debug_handler]
pub async fn start_session(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<StartSessionRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let settings = state.settings_service.get(&user.id).await?;
    let options = payload.options(&settings);

    let (pool, source_name) = match &payload.source {
        SessionSource::All => (
            state.problem_service.list_ids().await?,
            ALL_PROBLEMS_NAME.to_string(),
        ),
        SessionSource::Favorites => (
            state.favorite_service.list_ids(&user.id).await?,
            FAVORITES_NAME.to_string(),
        ),
        SessionSource::QuizSet { id } => {
            let set = state.quiz_set_service.get(&user.id, *id).await?;
            (set.problem_ids, set.name)
        }
    };

    let mut config = {
        let mut rng = rand::thread_rng();
        build_session_config(
            pool,
            Some(options.question_count),
            options.timer_seconds,
            source_name,
            &mut rng,
        )?
    };
    config.show_hints = options.show_hints;
    let problems = state
        .problem_service
        .get_many_ordered(&config.problem_ids)
        .await?;

    let now = now();
    let session = QuizSession::start(&user.id, config, problems, now)?;
    let view = SessionView::render(&session, now);
    state.sessions.insert(session);

    Ok((StatusCode::CREATED, Json(view)))
}

#[axum::debug_handler]
pub async fn get_session(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let now = now();
    let view = state.sessions.with_session(
        &user.id,
        id,
        now,
        state.progress_recorder.as_ref(),
        |session| Ok(SessionView::render(session, now)),
    )?;
    Ok(Json(view))
}

#[axum::debug_handler]
pub async fn select_option(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SelectOptionRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let now = now();
    let view = state.sessions.with_session(
        &user.id,
        id,
        now,
        state.progress_recorder.as_ref(),
        |session| {
            session.select_option(&payload.option_id, now)?;
            Ok(SessionView::render(session, now))
        },
    )?;
    Ok(Json(view))
}

#[axum::debug_handler]
pub async fn check_answer(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let now = now();
    let recorder = state.progress_recorder.as_ref();
    let outcome = state.sessions.check(&user.id, id, now, recorder)?;
    let session = state.sessions.with_session(&user.id, id, now, recorder, |session| {
        Ok(SessionView::render(session, now))
    })?;
    Ok(Json(CheckResponse { outcome, session }))
}

/// Opens the current question's key insight without touching the answer.
#[axum::debug_handler]
pub async fn show_hint(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let now = now();
    let view = state.sessions.with_session(
        &user.id,
        id,
        now,
        state.progress_recorder.as_ref(),
        |session| {
            session.request_hint(now)?;
            Ok(SessionView::render(session, now))
        },
    )?;
    Ok(Json(view))
}

#[axum::debug_handler]
pub async fn skip_question(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let now = now();
    let view = state.sessions.with_session(
        &user.id,
        id,
        now,
        state.progress_recorder.as_ref(),
        |session| {
            session.skip(now)?;
            Ok(SessionView::render(session, now))
        },
    )?;
    Ok(Json(view))
}

#[axum::debug_handler]
pub async fn next_question(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let now = now();
    let view = state.sessions.with_session(
        &user.id,
        id,
        now,
        state.progress_recorder.as_ref(),
        |session| {
            session.next(now)?;
            Ok(SessionView::render(session, now))
        },
    )?;
    Ok(Json(view))
}

#[axum::debug_handler]
pub async fn session_summary(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let summary = state.sessions.with_session(
        &user.id,
        id,
        now(),
        state.progress_recorder.as_ref(),
        |session| Ok(session.summary()?),
    )?;
    Ok(Json(summary))
}

#[axum::debug_handler]
pub async fn retry_session(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let now = now();
    let view = state.sessions.with_session(
        &user.id,
        id,
        now,
        state.progress_recorder.as_ref(),
        |session| {
            session.retry(now)?;
            tracing::info!(session_id = %session.id(), "Quiz session restarted");
            Ok(SessionView::render(session, now))
        },
    )?;
    Ok(Json(view))
}

/// Exits the session. In-memory results are discarded.
#[axum::debug_handler]
pub async fn end_session(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.sessions.remove(&user.id, id)?;
    Ok(StatusCode::NO_CONTENT)
}
