#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;

use vocab_backend::db::Database;
use vocab_backend::services::question_source::BundledQuestionSource;
use vocab_backend::state::AppState;

pub async fn create_test_db() -> Database {
    Database::in_memory().await.expect("in-memory database")
}

pub async fn create_test_state() -> AppState {
    let db = create_test_db().await;
    let questions = BundledQuestionSource::load().expect("bundled grammar data");
    AppState::new(db, Arc::new(questions))
}

pub async fn create_test_app() -> Router {
    vocab_backend::create_app(create_test_state().await)
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
