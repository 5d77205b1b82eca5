use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch, post, put};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::{NewWord, SessionStatus, WordUpdate};
use crate::response::{ok, AppError};
use crate::services::{evaluation, sessions, words};
use crate::state::AppState;

use super::answer_pairs;

#[derive(Debug, Default, Deserialize)]
struct CreateSessionRequest {
    topic: Option<String>,
}

/// Either `"LEARNING"` or `{ "status": "LEARNING" }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StatusRequest {
    Bare(String),
    Wrapped { status: String },
}

impl StatusRequest {
    fn into_status(self) -> Result<SessionStatus, AppError> {
        let raw = match self {
            StatusRequest::Bare(status) | StatusRequest::Wrapped { status } => status,
        };
        SessionStatus::parse(raw.trim())
            .ok_or_else(|| AppError::validation(format!("unknown session status {raw}")))
    }
}

#[derive(Debug, Deserialize)]
struct TopicRequest {
    topic: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeletedResponse {
    success: bool,
    deleted: String,
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", get(list_sessions).post(create_session))
        .route("/:id", get(get_session).delete(delete_session))
        .route("/:id/status", patch(update_status))
        .route("/:id/topic", patch(update_topic))
        .route("/:id/words", get(list_words).post(save_words))
        .route("/:id/words/:word_id", put(update_word))
        .route("/:id/submit", post(submit_learning))
        .route("/:id/submit/results", get(get_results))
}

async fn list_sessions(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let sessions = sessions::list_sessions(state.db()).await?;
    Ok(ok(sessions))
}

async fn create_session(
    State(state): State<AppState>,
    body: Option<Json<CreateSessionRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = body.unwrap_or_default();
    let session = sessions::create_session(state.db(), request.topic.as_deref()).await?;
    Ok((StatusCode::CREATED, ok(session)))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let session = sessions::get_session(state.db(), &id).await?;
    Ok(ok(session))
}

async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<StatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let target = request.into_status()?;
    let session = sessions::update_status(state.db(), &id, target).await?;
    Ok(ok(session))
}

async fn update_topic(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<TopicRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = sessions::update_topic(state.db(), &id, &request.topic).await?;
    Ok(ok(session))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    sessions::delete_session(state.db(), &id).await?;
    Ok(Json(DeletedResponse {
        success: true,
        deleted: id,
    }))
}

async fn list_words(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let words = words::list_words(state.db(), &id).await?;
    Ok(ok(words))
}

async fn save_words(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(rows): Json<Vec<NewWord>>,
) -> Result<impl IntoResponse, AppError> {
    let saved = words::save_words(state.db(), &id, rows).await?;
    Ok(ok(saved))
}

async fn update_word(
    State(state): State<AppState>,
    Path((id, word_id)): Path<(String, String)>,
    Json(fields): Json<WordUpdate>,
) -> Result<impl IntoResponse, AppError> {
    let word = words::update_word(state.db(), &id, &word_id, fields).await?;
    Ok(ok(word))
}

async fn submit_learning(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Map<String, Value>>,
) -> Result<impl IntoResponse, AppError> {
    let answers: HashMap<String, String> = answer_pairs(body)?.into_iter().collect();
    let results = evaluation::submit_learning(state.db(), &id, &answers).await?;
    Ok(ok(results))
}

async fn get_results(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let results = evaluation::get_results(state.db(), &id).await?;
    Ok(ok(results))
}
