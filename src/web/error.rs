use crate::services::ServiceError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// A failure that already knows its HTTP status, e.g. an auth rejection.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct HttpError {
    pub status: StatusCode,
    pub message: String,
}

impl HttpError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthenticated.")
    }

    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "This action is unauthorized.")
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

pub struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self.0.downcast::<ServiceError>() {
            Ok(ServiceError::Validation(errors)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "message": "The given data was invalid.",
                    "errors": errors,
                })),
            )
                .into_response(),
            Ok(err @ ServiceError::NotFound(_)) => {
                HttpError::new(StatusCode::NOT_FOUND, capitalize(&err.to_string())).into_response()
            }
            Ok(err @ ServiceError::NothingSelected(_)) => {
                HttpError::new(StatusCode::UNPROCESSABLE_ENTITY, err.to_string()).into_response()
            }
            Err(err) => match err.downcast::<HttpError>() {
                Ok(http) => http.into_response(),
                Err(err) => {
                    tracing::error!("Application error: {:?}", err);
                    HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                        .into_response()
                }
            },
        }
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub type AppResult<T> = Result<T, AppError>;
