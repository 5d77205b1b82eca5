use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Json;
use serde::Deserialize;

use crate::response::{ok, AppError};
use crate::services::grammar::{self, GrammarAnswer};
use crate::services::question_source::QuizMode;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct QuestionsQuery {
    mode: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartAttemptRequest {
    tense_id: String,
    mode: String,
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/tenses", get(list_tenses))
        .route("/tenses/:tense_id/questions", get(get_questions))
        .route("/attempts", post(start_attempt))
        .route("/attempts/:id", get(get_attempt))
        .route("/attempts/:id/answer", post(answer_attempt))
        .route("/attempts/:id/next", post(advance_attempt))
}

fn parse_mode(raw: Option<&str>) -> Result<QuizMode, AppError> {
    let raw = raw.unwrap_or("mcq");
    QuizMode::parse(raw).ok_or_else(|| AppError::validation(format!("unknown quiz mode {raw}")))
}

async fn list_tenses(State(state): State<AppState>) -> impl IntoResponse {
    ok(grammar::catalog(state.questions()))
}

async fn get_questions(
    State(state): State<AppState>,
    Path(tense_id): Path<String>,
    Query(query): Query<QuestionsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mode = parse_mode(query.mode.as_deref())?;
    let questions = grammar::get_questions(state.questions(), &tense_id, mode)?;
    Ok(ok(questions))
}

async fn start_attempt(
    State(state): State<AppState>,
    Json(request): Json<StartAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mode = parse_mode(Some(&request.mode))?;
    let view = state
        .attempts()
        .start(state.questions(), &request.tense_id, mode)?;
    Ok((StatusCode::CREATED, ok(view)))
}

async fn get_attempt(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(state.attempts().view(&id)?))
}

async fn answer_attempt(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(answer): Json<GrammarAnswer>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(state.attempts().answer(&id, &answer)?))
}

async fn advance_attempt(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let view = state.attempts().advance(&id, state.history()).await?;
    Ok(ok(view))
}
