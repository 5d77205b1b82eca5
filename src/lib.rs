pub mod config;
pub mod db;
pub mod logging;
pub mod models;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;

use std::sync::Arc;

use thiserror::Error;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::{Database, DbInitError};
use crate::services::question_source::{BundledQuestionSource, QuestionSourceError};
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("database initialization failed: {0}")]
    Database(#[from] DbInitError),
    #[error("grammar question bank failed to load: {0}")]
    Questions(#[from] QuestionSourceError),
}

/// Opens the database and loads the bundled question bank.
pub async fn build_state(database_url: &str) -> Result<AppState, StartupError> {
    let db = Database::connect(database_url).await?;
    let questions = BundledQuestionSource::load()?;
    Ok(AppState::new(db, Arc::new(questions)))
}

pub fn create_app(state: AppState) -> axum::Router {
    routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
