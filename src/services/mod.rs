pub mod evaluation;
pub mod grammar;
pub mod history;
pub mod normalize;
pub mod question_source;
pub mod random_quiz;
pub mod sessions;
pub mod words;

use thiserror::Error;

use crate::models::TransitionError;
use crate::services::grammar::AttemptError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),
    #[error("{0}")]
    InsufficientData(String),
    #[error(transparent)]
    Attempt(#[from] AttemptError),
    #[error(transparent)]
    Store(#[from] sqlx::Error),
}

impl ServiceError {
    pub fn session_not_found(id: &str) -> Self {
        ServiceError::NotFound(format!("session {id}"))
    }

    pub fn word_not_found(id: &str) -> Self {
        ServiceError::NotFound(format!("word {id}"))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
