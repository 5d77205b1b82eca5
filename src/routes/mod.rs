mod grammar;
mod health;
mod quiz;
mod sessions;

use axum::response::{IntoResponse, Response};
use axum::Router;
use serde_json::{Map, Value};

use crate::response::AppError;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/health", health::router())
        .nest("/api/sessions", sessions::router())
        .nest("/api/quiz", quiz::router())
        .nest("/api/grammar", grammar::router())
        .fallback(fallback_handler)
        .with_state(state)
}

async fn fallback_handler() -> Response {
    AppError::not_found("route not found").into_response()
}

/// Answers arrive as `{ wordId: answer }`; key order is the quiz order.
pub(crate) fn answer_pairs(body: Map<String, Value>) -> Result<Vec<(String, String)>, AppError> {
    body.into_iter()
        .map(|(word_id, value)| match value {
            Value::String(answer) => Ok((word_id, answer)),
            Value::Null => Ok((word_id, String::new())),
            other => Err(AppError::validation(format!(
                "answer for {word_id} must be a string, got {other}"
            ))),
        })
        .collect()
}
