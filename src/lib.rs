pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::services::{
    catalog_service::CatalogWorkspaces, favorite_service::FavoriteService,
    problem_service::ProblemService, progress_service::ProgressRecorder,
    progress_service::ProgressService, quiz_set_service::QuizSetService,
    session_service::SessionRegistry, settings_service::SettingsService,
};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub problem_service: ProblemService,
    pub favorite_service: FavoriteService,
    pub quiz_set_service: QuizSetService,
    pub progress_service: ProgressService,
    pub settings_service: SettingsService,
    pub progress_recorder: Arc<dyn ProgressRecorder>,
    pub sessions: SessionRegistry,
    pub catalogs: CatalogWorkspaces,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let progress_service = ProgressService::new(pool.clone());

        Self {
            problem_service: ProblemService::new(pool.clone()),
            favorite_service: FavoriteService::new(pool.clone()),
            quiz_set_service: QuizSetService::new(pool.clone()),
            settings_service: SettingsService::new(pool.clone()),
            progress_recorder: Arc::new(progress_service.clone()),
            progress_service,
            sessions: SessionRegistry::new(),
            catalogs: CatalogWorkspaces::new(),
            pool,
        }
    }

    /// Replaces where graded answers are written.
    pub fn with_progress_recorder(mut self, recorder: Arc<dyn ProgressRecorder>) -> Self {
        self.progress_recorder = recorder;
        self
    }
}
