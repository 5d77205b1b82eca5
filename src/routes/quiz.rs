use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Json;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::models::QuizType;
use crate::response::{ok, AppError};
use crate::services::history::HistoryStore;
use crate::services::{grammar, random_quiz};
use crate::state::AppState;

use super::answer_pairs;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GrammarResultRequest {
    #[serde(alias = "type")]
    quiz_type: QuizType,
    topic: String,
    /// Number of correct answers.
    score: u32,
    total: u32,
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/random", get(compose_quiz))
        .route("/submit", post(submit_random_quiz))
        .route("/grammar-submit", post(submit_grammar_result))
        .route("/history", get(list_history))
}

async fn compose_quiz(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let words = random_quiz::compose_random_quiz(state.db(), state.history()).await?;
    Ok(ok(words))
}

async fn submit_random_quiz(
    State(state): State<AppState>,
    Json(body): Json<Map<String, Value>>,
) -> Result<impl IntoResponse, AppError> {
    let answers = answer_pairs(body)?;
    let results = random_quiz::submit_random_quiz(state.db(), state.history(), &answers).await?;
    Ok(ok(results))
}

async fn submit_grammar_result(
    State(state): State<AppState>,
    Json(request): Json<GrammarResultRequest>,
) -> Result<impl IntoResponse, AppError> {
    let entry = grammar::record_client_result(
        state.history(),
        request.quiz_type,
        &request.topic,
        request.score,
        request.total,
    )
    .await?;
    Ok((StatusCode::CREATED, ok(entry)))
}

async fn list_history(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let entries = state.history().list().await?;
    Ok(ok(entries))
}
