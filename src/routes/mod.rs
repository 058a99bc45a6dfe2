pub mod account;
pub mod catalog;
pub mod favorites;
pub mod health;
pub mod problems;
pub mod progress;
pub mod quiz_sets;
pub mod sessions;
pub mod settings;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::AppState;

/// Every `/api` route, behind bearer authentication.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/api/problems", get(problems::list_problems))
        .route("/api/problems/:id", get(problems::get_problem))
        .route("/api/catalog", get(catalog::get_catalog))
        .route("/api/catalog/reload", post(catalog::reload_catalog))
        .route("/api/catalog/filter", put(catalog::update_filter))
        .route("/api/catalog/sort", put(catalog::update_sort))
        .route("/api/catalog/page", put(catalog::go_to_page))
        .route("/api/catalog/selection", delete(catalog::clear_selection))
        .route(
            "/api/catalog/selection/favorite",
            post(catalog::favorite_selection),
        )
        .route(
            "/api/catalog/selection/quiz-set",
            post(catalog::quiz_set_from_selection),
        )
        .route(
            "/api/catalog/selection/export",
            post(catalog::export_selection),
        )
        .route(
            "/api/catalog/selection/items/:problem_id",
            post(catalog::toggle_selection),
        )
        .route(
            "/api/favorites",
            get(favorites::list_favorites).delete(favorites::clear_favorites),
        )
        .route(
            "/api/favorites/:problem_id",
            delete(favorites::remove_favorite),
        )
        .route(
            "/api/favorites/:problem_id/toggle",
            post(favorites::toggle_favorite),
        )
        .route("/api/quiz-sets", get(quiz_sets::list_quiz_sets))
        .route(
            "/api/quiz-sets/:id",
            get(quiz_sets::get_quiz_set).delete(quiz_sets::delete_quiz_set),
        )
        .route("/api/quiz/sources", get(sessions::list_sources))
        .route("/api/sessions", post(sessions::start_session))
        .route(
            "/api/sessions/:id",
            get(sessions::get_session).delete(sessions::end_session),
        )
        .route("/api/sessions/:id/select", post(sessions::select_option))
        .route("/api/sessions/:id/hint", post(sessions::show_hint))
        .route("/api/sessions/:id/check", post(sessions::check_answer))
        .route("/api/sessions/:id/skip", post(sessions::skip_question))
        .route("/api/sessions/:id/next", post(sessions::next_question))
        .route("/api/sessions/:id/summary", get(sessions::session_summary))
        .route("/api/sessions/:id/retry", post(sessions::retry_session))
        .route(
            "/api/progress",
            get(progress::list_progress).delete(progress::clear_progress),
        )
        .route("/api/progress/stats", get(progress::progress_stats))
        .route(
            "/api/settings",
            get(settings::get_settings)
                .put(settings::update_settings)
                .delete(settings::reset_settings),
        )
        .route("/api/dashboard", get(account::dashboard))
        .route("/api/account/data", delete(account::clear_data))
        .layer(axum::middleware::from_fn(
            crate::middleware::auth::require_bearer_auth,
        ))
}
