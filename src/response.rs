use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::services::ServiceError;

#[derive(Debug, Serialize)]
pub struct SuccessResponse<T> {
    pub success: bool,
    pub data: T,
}

pub fn ok<T: Serialize>(data: T) -> Json<SuccessResponse<T>> {
    Json(SuccessResponse {
        success: true,
        data,
    })
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
}

#[derive(Debug, Clone)]
pub struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
    is_operational: bool,
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "INTERNAL_ERROR",
            message: message.into(),
            is_operational: false,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    fn operational(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            is_operational: true,
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(_) => Self::not_found(err.to_string()),
            ServiceError::Validation(message) => Self::validation(message),
            ServiceError::InvalidTransition(_) => {
                Self::operational(StatusCode::CONFLICT, "INVALID_TRANSITION", err.to_string())
            }
            ServiceError::InsufficientData(message) => {
                Self::operational(StatusCode::UNPROCESSABLE_ENTITY, "INSUFFICIENT_DATA", message)
            }
            ServiceError::Attempt(_) => {
                Self::operational(StatusCode::CONFLICT, "ATTEMPT_STATE", err.to_string())
            }
            ServiceError::Store(source) => {
                tracing::error!(error = %source, "record store failure");
                Self::internal(source.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = if self.is_operational {
            self.message
        } else {
            "internal server error".to_string()
        };

        let body = ErrorResponse {
            success: false,
            error: message,
            code: self.code.to_string(),
        };

        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SessionStatus, TransitionError};

    #[test]
    fn service_errors_map_to_status_codes() {
        let cases = [
            (ServiceError::session_not_found("x"), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (
                ServiceError::Validation("empty".into()),
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
            ),
            (
                ServiceError::InvalidTransition(TransitionError::InvalidTransition {
                    from: SessionStatus::New,
                    to: SessionStatus::Done,
                }),
                StatusCode::CONFLICT,
                "INVALID_TRANSITION",
            ),
            (
                ServiceError::InsufficientData("no words".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
                "INSUFFICIENT_DATA",
            ),
            (
                ServiceError::Store(sqlx::Error::RowNotFound),
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
            ),
        ];

        for (err, status, code) in cases {
            let app_err = AppError::from(err);
            assert_eq!(app_err.status(), status);
            assert_eq!(app_err.code(), code);
        }
    }

    #[test]
    fn internal_details_are_hidden() {
        let response = AppError::internal("disk on fire").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
